//! Fixed-topology families.
//!
//! Each family is a function producing a [`StageLayout`]; the caller's layer
//! list only feeds a handful of derived counts (recurrent steps, encoder
//! blocks, experts). Everything else is literal geometry.

use super::stages::{instantiate, StageLayout, StageLink, StageShape, StageSpec};
use super::{BuildContext, Realized};
use crate::colors;
use crate::family::ModelFamily;
use crate::layers::{max_neuron_count, LayerSpec};
use crate::rng::SeededRandom;

/// Distance between unrolled recurrent time steps.
const STEP_SPACING: f32 = 3.0;

pub fn build_cnn(ctx: &BuildContext<'_>, rng: &mut SeededRandom) -> Realized {
    instantiate(&cnn_layout(), ctx.budget, rng)
}

pub fn build_transformer(ctx: &BuildContext<'_>, rng: &mut SeededRandom) -> Realized {
    instantiate(&transformer_layout(encoder_blocks(ctx.layers)), ctx.budget, rng)
}

pub fn build_recurrent(ctx: &BuildContext<'_>, rng: &mut SeededRandom) -> Realized {
    let steps = recurrent_steps(ctx.layers);
    instantiate(&recurrent_layout(ctx.family, steps), ctx.budget, rng)
}

pub fn build_gan(ctx: &BuildContext<'_>, rng: &mut SeededRandom) -> Realized {
    instantiate(&gan_layout(), ctx.budget, rng)
}

pub fn build_mixture(ctx: &BuildContext<'_>, rng: &mut SeededRandom) -> Realized {
    instantiate(&mixture_layout(expert_count(ctx.layers)), ctx.budget, rng)
}

/// `clamp(round(max neurons / 2), 4, 8)`.
pub fn recurrent_steps(layers: &[LayerSpec]) -> usize {
    let half = (max_neuron_count(layers) as f64 / 2.0).round() as usize;
    half.clamp(4, 8)
}

/// Layers named like "self-attention", clamped to `[2, 4]`.
pub fn encoder_blocks(layers: &[LayerSpec]) -> usize {
    layers
        .iter()
        .filter(|l| l.name.to_lowercase().contains("self-attention"))
        .count()
        .clamp(2, 4)
}

/// Neuron count of the first "expert" layer, clamped to `[2, 8]`; 4 without one.
pub fn expert_count(layers: &[LayerSpec]) -> usize {
    layers
        .iter()
        .find(|l| l.name.to_lowercase().contains("expert"))
        .map(|l| l.effective_neurons().clamp(2, 8))
        .unwrap_or(4)
}

fn column(count: usize) -> StageShape {
    StageShape::Column { count, spacing: 0.6 }
}

fn cnn_layout() -> StageLayout {
    let grid = |n: usize, spacing: f32| StageShape::Grid {
        cols: n,
        rows: n,
        spacing,
    };
    let mut layout = StageLayout::default();
    layout
        .stage(StageSpec::new("input", "input", grid(4, 0.6), colors::INPUT, [-12.0, 0.5, 0.0]))
        .stage(StageSpec::new("conv1", "conv", grid(3, 0.7), colors::CONV, [-8.0, 0.5, 0.0]))
        .stage(StageSpec::new("pool1", "pool", grid(2, 0.7), colors::POOL, [-4.5, 0.5, 0.0]))
        .stage(StageSpec::new("conv2", "conv", grid(3, 0.6), colors::CONV, [-1.0, 0.5, 0.0]))
        .stage(StageSpec::new("pool2", "pool", grid(2, 0.6), colors::POOL, [2.5, 0.5, 0.0]))
        .stage(StageSpec::new("flatten", "dense", column(6), colors::DENSE, [5.5, 0.5, 0.0]))
        .stage(StageSpec::new("dense", "dense", column(4), colors::DENSE, [8.5, 0.5, 0.0]))
        .stage(StageSpec::new("output", "output", column(3), colors::OUTPUT, [11.5, 0.5, 0.0]))
        .link(StageLink::paired("input", "conv1"))
        .link(StageLink::paired("conv1", "pool1"))
        .link(StageLink::full("pool1", "conv2"))
        .link(StageLink::paired("conv2", "pool2"))
        .link(StageLink::full("pool2", "flatten"))
        .link(StageLink::full("flatten", "dense"))
        .link(StageLink::full("dense", "output"));
    layout
}

fn transformer_layout(blocks: usize) -> StageLayout {
    let mut layout = StageLayout::default();
    layout
        .stage(StageSpec::new("tokens", "input", column(4), colors::INPUT, [-14.0, 0.5, 0.0]))
        .stage(StageSpec::new("embedding", "embedding", column(4), colors::EMBEDDING, [-11.0, 0.5, 0.0]))
        .link(StageLink::paired("tokens", "embedding"));

    let stride = 20.0 / blocks as f32;
    let mut previous = "embedding".to_string();
    for b in 0..blocks {
        let x = -8.0 + b as f32 * stride;
        let (attn, norm1, ffn, norm2) = (
            format!("attention{}", b),
            format!("norm{}a", b),
            format!("ffn{}", b),
            format!("norm{}b", b),
        );
        layout
            .stage(StageSpec::new(
                attn.clone(),
                "attention",
                StageShape::Ring { count: 4, radius: 1.2 },
                colors::ATTENTION,
                [x, 0.5, 0.0],
            ))
            .stage(StageSpec::new(norm1.clone(), "norm", StageShape::Single, colors::NORM, [x + stride * 0.25, 0.5, 0.0]))
            .stage(StageSpec::new(ffn.clone(), "feed-forward", column(4), colors::FEED_FORWARD, [x + stride * 0.5, 0.5, 0.0]))
            .stage(StageSpec::new(norm2.clone(), "norm", StageShape::Single, colors::NORM, [x + stride * 0.75, 0.5, 0.0]))
            .link(StageLink::full(previous.clone(), attn.clone()))
            .link(StageLink::full(attn, norm1.clone()))
            .link(StageLink::full(previous, norm1.clone()).with_opacity(0.2))
            .link(StageLink::full(norm1.clone(), ffn.clone()))
            .link(StageLink::full(ffn, norm2.clone()))
            .link(StageLink::full(norm1, norm2.clone()).with_opacity(0.2));
        previous = norm2;
    }

    layout
        .stage(StageSpec::new("output", "output", column(3), colors::OUTPUT, [13.0, 0.5, 0.0]))
        .link(StageLink::full(previous, "output"));
    layout
}

fn recurrent_layout(family: ModelFamily, steps: usize) -> StageLayout {
    let gates = match family {
        ModelFamily::Lstm => 3,
        ModelFamily::Gru => 2,
        _ => 0,
    };
    let x0 = -((steps - 1) as f32 * STEP_SPACING) / 2.0;

    let mut layout = StageLayout::default();
    for t in 0..steps {
        let x = x0 + t as f32 * STEP_SPACING;
        let (input, hidden, output) = (format!("x{}", t), format!("h{}", t), format!("y{}", t));
        layout
            .stage(StageSpec::new(input.clone(), "input", column(2), colors::INPUT, [x, -1.6, 0.0]))
            .stage(StageSpec::new(hidden.clone(), "hidden", StageShape::Single, colors::HIDDEN, [x, 0.6, 0.0]))
            .stage(StageSpec::new(output.clone(), "output", StageShape::Single, colors::OUTPUT, [x, 2.8, 0.0]))
            .link(StageLink::full(input.clone(), hidden.clone()))
            .link(StageLink::full(hidden.clone(), output));

        if gates > 0 {
            let gate = format!("g{}", t);
            layout
                .stage(StageSpec::new(
                    gate.clone(),
                    "gate",
                    StageShape::Ring { count: gates, radius: 0.7 },
                    colors::GATE,
                    [x, 0.6, 1.5],
                ))
                .link(StageLink::full(input, gate.clone()).with_opacity(0.3))
                .link(StageLink::full(gate, hidden.clone()).with_opacity(0.3));
        }
        if family == ModelFamily::Lstm {
            let cell = format!("c{}", t);
            layout
                .stage(StageSpec::new(cell.clone(), "cell", StageShape::Single, colors::GATE, [x, 0.6, -1.5]))
                .link(StageLink::full(cell.clone(), hidden.clone()).with_opacity(0.3));
            if t > 0 {
                layout.link(StageLink::full(format!("c{}", t - 1), cell).with_opacity(0.6));
            }
        }
        if t > 0 {
            layout.link(StageLink::full(format!("h{}", t - 1), hidden.clone()).with_opacity(0.6));
            if family == ModelFamily::Gru {
                layout.link(StageLink::full(format!("h{}", t - 1), format!("g{}", t)).with_opacity(0.3));
            }
        }
    }
    layout
}

fn gan_layout() -> StageLayout {
    let mut layout = StageLayout::default();
    layout
        .stage(StageSpec::new("noise", "noise", column(4), colors::NOISE, [-12.0, 0.5, 0.0]))
        .stage(StageSpec::new("generator", "generator", StageShape::Single, colors::GENERATOR, [-6.0, 0.5, 0.0]))
        .stage(StageSpec::new("fake", "sample", column(3), colors::GENERATOR, [-1.0, 2.2, 0.0]))
        .stage(StageSpec::new("real", "data", column(3), colors::INPUT, [-1.0, -1.4, 0.0]))
        .stage(StageSpec::new(
            "discriminator",
            "discriminator",
            StageShape::Single,
            colors::DISCRIMINATOR,
            [5.0, 0.5, 0.0],
        ))
        .stage(StageSpec::new("verdict", "output", StageShape::Single, colors::OUTPUT, [10.0, 0.5, 0.0]))
        .link(StageLink::full("noise", "generator"))
        .link(StageLink::full("generator", "fake"))
        .link(StageLink::full("fake", "discriminator"))
        .link(StageLink::full("real", "discriminator"))
        .link(StageLink::full("discriminator", "verdict"))
        .link(StageLink::full("discriminator", "generator").with_opacity(0.2));
    layout
}

fn mixture_layout(experts: usize) -> StageLayout {
    let mut layout = StageLayout::default();
    layout
        .stage(StageSpec::new("input", "input", column(4), colors::INPUT, [-10.0, 0.5, 0.0]))
        .stage(StageSpec::new("gate", "gate", StageShape::Single, colors::GATE, [-5.0, 3.5, 0.0]))
        .link(StageLink::full("input", "gate"));

    for k in 0..experts {
        let angle = k as f32 / experts as f32 * std::f32::consts::TAU;
        let name = format!("expert{}", k);
        layout
            .stage(StageSpec::new(
                name.clone(),
                "expert",
                StageShape::Single,
                colors::EXPERT,
                [0.0, 0.5 + 3.0 * angle.sin(), 3.0 * angle.cos()],
            ))
            .link(StageLink::full("input", name.clone()))
            .link(StageLink::full("gate", name.clone()).with_opacity(0.25))
            .link(StageLink::full(name, "combiner"));
    }

    layout
        .stage(StageSpec::new("combiner", "combiner", StageShape::Single, colors::DENSE, [5.0, 0.5, 0.0]))
        .stage(StageSpec::new("output", "output", column(3), colors::OUTPUT, [10.0, 0.5, 0.0]))
        .link(StageLink::full("combiner", "output"));
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(names: &[(&str, usize)]) -> Vec<LayerSpec> {
        names.iter().map(|&(n, c)| LayerSpec::dense(n, c)).collect()
    }

    fn run(family: ModelFamily, layers: &[LayerSpec], budget: usize) -> Realized {
        let ctx = BuildContext {
            family,
            layers,
            budget,
        };
        let strategy = crate::builder::strategy_for(family);
        strategy(&ctx, &mut SeededRandom::new(7))
    }

    fn tag_count(out: &Realized, tag: &str) -> usize {
        out.nodes.iter().filter(|n| n.tag == tag).count()
    }

    #[test]
    fn test_recurrent_steps() {
        assert_eq!(recurrent_steps(&named(&[("a", 2)])), 4);
        assert_eq!(recurrent_steps(&named(&[("a", 11)])), 6);
        assert_eq!(recurrent_steps(&named(&[("a", 64)])), 8);
    }

    #[test]
    fn test_encoder_blocks() {
        assert_eq!(encoder_blocks(&named(&[("Input", 4)])), 2);
        let three = named(&[
            ("Self-Attention 1", 8),
            ("self-attention 2", 8),
            ("Self-attention 3", 8),
        ]);
        assert_eq!(encoder_blocks(&three), 3);
    }

    #[test]
    fn test_expert_count() {
        assert_eq!(expert_count(&named(&[("Input", 4)])), 4);
        assert_eq!(expert_count(&named(&[("Experts", 1)])), 2);
        assert_eq!(expert_count(&named(&[("Expert layer", 6)])), 6);
        assert_eq!(expert_count(&named(&[("Expert layer", 40)])), 8);
    }

    #[test]
    fn test_gan_single_generator_discriminator() {
        let out = run(ModelFamily::Gan, &named(&[("a", 64), ("b", 64)]), 1500);
        assert_eq!(tag_count(&out, "generator"), 1);
        assert_eq!(tag_count(&out, "discriminator"), 1);
    }

    #[test]
    fn test_gate_counts() {
        let layers = named(&[("a", 8)]);
        assert_eq!(tag_count(&run(ModelFamily::Rnn, &layers, 1000), "gate"), 0);
        assert_eq!(tag_count(&run(ModelFamily::Lstm, &layers, 1000), "gate"), 12);
        assert_eq!(tag_count(&run(ModelFamily::Gru, &layers, 1000), "gate"), 8);
        assert_eq!(tag_count(&run(ModelFamily::Rnn, &layers, 1000), "hidden"), 4);
    }

    #[test]
    fn test_topology_ignores_neuron_counts() {
        let small = run(ModelFamily::Cnn, &named(&[("a", 2)]), 600);
        let large = run(ModelFamily::Cnn, &named(&[("a", 500)]), 600);
        assert_eq!(small.nodes.len(), large.nodes.len());
        assert_eq!(small.edges.len(), large.edges.len());
    }

    #[test]
    fn test_transformer_blocks_scale_attention() {
        let two = run(ModelFamily::Transformer, &named(&[("Input", 4)]), 800);
        let four = run(
            ModelFamily::Transformer,
            &named(&[
                ("Self-Attention", 8),
                ("Self-Attention", 8),
                ("Self-Attention", 8),
                ("Self-Attention", 8),
                ("Self-Attention", 8),
            ]),
            800,
        );
        assert_eq!(tag_count(&two, "attention"), 8);
        assert_eq!(tag_count(&four, "attention"), 16);
    }

    #[test]
    fn test_mixture_experts() {
        let out = run(ModelFamily::LegacyMixture, &named(&[("Experts", 6)]), 500);
        assert_eq!(tag_count(&out, "expert"), 6);
        assert_eq!(tag_count(&out, "combiner"), 1);
    }
}
