//! Generic grid-and-density construction.
//!
//! Layers are laid out along x, centered on the origin, one slab per layer.
//! Inside a layer each neuron takes a grid cell; the operator family swaps
//! the grid for a golden-angle spiral and the autoencoder family scales each
//! layer by its distance from the bottleneck so encoder and decoder mirror
//! each other.

use tracing::debug;

use super::{BuildContext, Realized};
use crate::budget::{ConnectionBudgetPolicy, EdgeBudget};
use crate::family::ModelFamily;
use crate::graph::{lift_above_ground, GraphEdge, GraphNode, CELL_SPACING, NODE_RADIUS, SLAB_SPACING};
use crate::layers::{derive_layer_configs, GridShape, LayerConfig};
use crate::rng::SeededRandom;

/// Golden angle in radians.
const GOLDEN_ANGLE: f32 = 2.399_963;

/// Radial growth of the operator spiral per neuron.
const SPIRAL_STEP: f32 = 0.5;

/// Per-layer twist of the operator spiral.
const SPIRAL_LAYER_TWIST: f32 = 0.35;

/// Smallest autoencoder layer scale, reached at the bottleneck.
const BOTTLENECK_SCALE: f32 = 0.45;

/// Alternating z offset between mixture layers.
const MIXTURE_STAGGER: f32 = 0.6;

/// Probability factor for autoencoder skip connections.
const SKIP_FACTOR: f64 = 0.25;

/// Build a generic-family graph.
pub fn build(ctx: &BuildContext<'_>, rng: &mut SeededRandom) -> Realized {
    let configs = derive_layer_configs(ctx.layers);
    let layer_count = configs.len();
    let spacing = ctx.family.profile().layer_spacing;
    let half_width = (layer_count.saturating_sub(1)) as f32 * spacing / 2.0;

    let mut nodes = Vec::new();
    let mut offsets = Vec::with_capacity(layer_count);
    for (layer_index, config) in configs.iter().enumerate() {
        offsets.push(nodes.len());
        let layer_x = layer_index as f32 * spacing - half_width;
        for neuron_index in 0..config.spec.neuron_count {
            let [x, y, z] = place(ctx.family, config, layer_index, layer_count, neuron_index);
            nodes.push(GraphNode {
                position: [layer_x + x, lift_above_ground(y), z],
                layer_index,
                neuron_index,
                tag: "neuron".to_string(),
                color: config.color,
                radius: NODE_RADIUS,
            });
        }
    }

    let counts: Vec<usize> = configs.iter().map(|c| c.spec.neuron_count).collect();
    let total_pairs: usize = counts.windows(2).map(|w| w[0] * w[1]).sum();
    let policy = ConnectionBudgetPolicy::new(ctx.family, ctx.budget, total_pairs);
    let mut budget = EdgeBudget::new(ctx.budget);
    let mut edges = Vec::new();

    for from_layer in 0..layer_count.saturating_sub(1) {
        connect_layers(
            &mut edges,
            &mut budget,
            rng,
            &policy,
            &counts,
            &offsets,
            (from_layer, from_layer + 1),
            1.0,
        );
        if budget.is_exhausted() {
            break;
        }
    }

    if ctx.family == ModelFamily::Autoencoder {
        for from_layer in 0..(layer_count / 2).saturating_sub(1) {
            let to_layer = layer_count - 1 - from_layer;
            if to_layer <= from_layer + 1 {
                continue;
            }
            connect_layers(
                &mut edges,
                &mut budget,
                rng,
                &policy,
                &counts,
                &offsets,
                (from_layer, to_layer),
                SKIP_FACTOR,
            );
        }
    }

    if budget.is_exhausted() {
        debug!(limit = budget.limit(), "connection budget exhausted");
    }

    Realized { nodes, edges }
}

/// Offset of one neuron relative to its layer's x position.
fn place(
    family: ModelFamily,
    config: &LayerConfig,
    layer_index: usize,
    layer_count: usize,
    neuron_index: usize,
) -> [f32; 3] {
    match family {
        ModelFamily::Operator => spiral_offset(layer_index, neuron_index),
        ModelFamily::Autoencoder => {
            let [x, y, z] = grid_offset(&config.grid, neuron_index);
            let scale = mirror_scale(layer_index, layer_count);
            [x, y * scale, z * scale]
        }
        ModelFamily::Mixture => {
            let [x, y, z] = grid_offset(&config.grid, neuron_index);
            let stagger = if layer_index % 2 == 0 { -MIXTURE_STAGGER } else { MIXTURE_STAGGER };
            [x, y, z + stagger]
        }
        _ => grid_offset(&config.grid, neuron_index),
    }
}

/// Grid cell offset, centered on the layer axis. Deep grids stack their
/// z-slabs along x.
fn grid_offset(grid: &GridShape, neuron_index: usize) -> [f32; 3] {
    let (cx, cy, cz) = grid.cell(neuron_index);
    let center = |cell: usize, extent: usize| cell as f32 - (extent as f32 - 1.0) / 2.0;
    [
        center(cz, grid.z) * CELL_SPACING * SLAB_SPACING,
        center(cy, grid.y) * CELL_SPACING,
        center(cx, grid.x) * CELL_SPACING,
    ]
}

fn spiral_offset(layer_index: usize, neuron_index: usize) -> [f32; 3] {
    let i = neuron_index as f32;
    let radius = SPIRAL_STEP * (i + 1.0).sqrt();
    let angle = i * GOLDEN_ANGLE + layer_index as f32 * SPIRAL_LAYER_TWIST;
    let wobble = 0.25 * (i * 0.5 + layer_index as f32).sin();
    [wobble, radius * angle.sin(), radius * angle.cos()]
}

/// 1.0 at either end of the stack, [`BOTTLENECK_SCALE`] at the middle.
fn mirror_scale(layer_index: usize, layer_count: usize) -> f32 {
    let mid = (layer_count.saturating_sub(1)) as f32 / 2.0;
    if mid <= 0.0 {
        return 1.0;
    }
    let t = (layer_index as f32 - mid).abs() / mid;
    BOTTLENECK_SCALE + (1.0 - BOTTLENECK_SCALE) * t
}

#[allow(clippy::too_many_arguments)]
fn connect_layers(
    edges: &mut Vec<GraphEdge>,
    budget: &mut EdgeBudget,
    rng: &mut SeededRandom,
    policy: &ConnectionBudgetPolicy,
    counts: &[usize],
    offsets: &[usize],
    (from_layer, to_layer): (usize, usize),
    factor: f64,
) {
    let (from_count, to_count) = (counts[from_layer], counts[to_layer]);
    for a in 0..from_count {
        for b in 0..to_count {
            if budget.is_exhausted() {
                return;
            }
            let p = policy.acceptance(from_count, to_count, a, b) * factor;
            if rng.next_f64() < p && budget.try_claim() {
                edges.push(GraphEdge {
                    from: offsets[from_layer] + a,
                    to: offsets[to_layer] + b,
                    from_layer,
                    to_layer,
                    opacity: edge_opacity(p),
                });
            }
        }
    }
}

fn edge_opacity(p: f64) -> f32 {
    (0.12 + 0.5 * p).min(0.65) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GROUND_FLOOR_Y;
    use crate::layers::LayerSpec;

    fn ctx(family: ModelFamily, layers: &[LayerSpec], budget: usize) -> BuildContext<'_> {
        BuildContext {
            family,
            layers,
            budget,
        }
    }

    fn stack(counts: &[usize]) -> Vec<LayerSpec> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &n)| LayerSpec::dense(format!("L{}", i), n))
            .collect()
    }

    #[test]
    fn test_one_node_per_neuron() {
        let layers = stack(&[3, 7, 2]);
        let out = build(&ctx(ModelFamily::FeedForward, &layers, 100), &mut SeededRandom::new(1));
        assert_eq!(out.nodes.len(), 12);
        assert_eq!(out.nodes[3].layer_index, 1);
        assert_eq!(out.nodes[3].neuron_index, 0);
    }

    #[test]
    fn test_only_adjacent_edges_without_autoencoder() {
        let layers = stack(&[8, 8, 8, 8]);
        let out = build(&ctx(ModelFamily::FeedForward, &layers, 5000), &mut SeededRandom::new(5));
        assert!(!out.edges.is_empty());
        assert!(out.edges.iter().all(|e| e.to_layer == e.from_layer + 1));
    }

    #[test]
    fn test_autoencoder_skip_edges() {
        let layers = stack(&[16, 8, 4, 8, 16, 16]);
        let out = build(&ctx(ModelFamily::Autoencoder, &layers, 5000), &mut SeededRandom::new(2));
        let skips: Vec<_> = out
            .edges
            .iter()
            .filter(|e| e.to_layer != e.from_layer + 1)
            .collect();
        assert!(!skips.is_empty());
        assert!(skips.iter().all(|e| e.from_layer + e.to_layer == layers.len() - 1));
    }

    #[test]
    fn test_budget_stops_early() {
        let layers = stack(&[8, 8, 8]);
        for seed in 1..20 {
            let out = build(&ctx(ModelFamily::FeedForward, &layers, 10), &mut SeededRandom::new(seed));
            assert!(out.edges.len() <= 10);
        }
    }

    #[test]
    fn test_nodes_above_ground() {
        let layers = stack(&[512, 64]);
        for family in [ModelFamily::FeedForward, ModelFamily::Operator, ModelFamily::Mixture] {
            let out = build(&ctx(family, &layers, 10), &mut SeededRandom::new(1));
            assert!(out.nodes.iter().all(|n| n.position[1] >= GROUND_FLOOR_Y));
        }
    }

    #[test]
    fn test_mirror_scale_symmetric() {
        assert_eq!(mirror_scale(0, 5), 1.0);
        assert_eq!(mirror_scale(4, 5), 1.0);
        assert!((mirror_scale(2, 5) - BOTTLENECK_SCALE).abs() < 1e-6);
        assert_eq!(mirror_scale(1, 5), mirror_scale(3, 5));
        assert_eq!(mirror_scale(0, 1), 1.0);
    }

    #[test]
    fn test_grid_offset_centered() {
        let grid = GridShape::new(3, 3, 1);
        assert_eq!(grid_offset(&grid, 4), [0.0, 0.0, 0.0]);
    }
}
