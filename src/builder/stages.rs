//! Declarative stage tables for the fixed-topology families.
//!
//! A [`StageLayout`] is plain data: named node groups with a shape, color and
//! origin, plus directed links between named groups. [`instantiate`] is the
//! single routine that turns any layout into nodes and budget-bounded edges.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::Realized;
use crate::budget::EdgeBudget;
use crate::colors::Color;
use crate::graph::{lift_above_ground, GraphEdge, GraphNode, NODE_RADIUS};
use crate::rng::SeededRandom;

/// Radius of single-node stages.
pub const HUB_RADIUS: f32 = 0.5;

/// Geometry of a stage relative to its origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageShape {
    /// One large node.
    Single,
    /// `count` nodes stacked along y.
    Column { count: usize, spacing: f32 },
    /// `cols x rows` nodes in the y-z plane.
    Grid { cols: usize, rows: usize, spacing: f32 },
    /// `count` nodes on a circle in the y-z plane.
    Ring { count: usize, radius: f32 },
}

impl StageShape {
    pub fn node_count(&self) -> usize {
        match *self {
            StageShape::Single => 1,
            StageShape::Column { count, .. } | StageShape::Ring { count, .. } => count,
            StageShape::Grid { cols, rows, .. } => cols * rows,
        }
    }

    /// Offsets from the stage origin, one per node.
    pub fn offsets(&self) -> Vec<[f32; 3]> {
        let centered = |i: usize, n: usize, step: f32| (i as f32 - (n as f32 - 1.0) / 2.0) * step;
        match *self {
            StageShape::Single => vec![[0.0; 3]],
            StageShape::Column { count, spacing } => (0..count)
                .map(|i| [0.0, centered(i, count, spacing), 0.0])
                .collect(),
            StageShape::Grid { cols, rows, spacing } => (0..rows)
                .flat_map(|r| {
                    (0..cols).map(move |c| {
                        [0.0, centered(r, rows, spacing), centered(c, cols, spacing)]
                    })
                })
                .collect(),
            StageShape::Ring { count, radius } => (0..count)
                .map(|i| {
                    let angle = i as f32 / count.max(1) as f32 * std::f32::consts::TAU;
                    [0.0, radius * angle.sin(), radius * angle.cos()]
                })
                .collect(),
        }
    }

    fn node_radius(&self) -> f32 {
        match self {
            StageShape::Single => HUB_RADIUS,
            _ => NODE_RADIUS,
        }
    }
}

/// A named node group.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub name: String,
    /// Semantic tag copied onto every node.
    pub tag: &'static str,
    pub shape: StageShape,
    pub color: Color,
    pub origin: [f32; 3],
}

impl StageSpec {
    pub fn new(
        name: impl Into<String>,
        tag: &'static str,
        shape: StageShape,
        color: Color,
        origin: [f32; 3],
    ) -> Self {
        Self {
            name: name.into(),
            tag,
            shape,
            color,
            origin,
        }
    }
}

/// How nodes of two linked stages pair up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPattern {
    /// Every source node to every target node.
    Full,
    /// Node k to node k, wrapping the shorter stage.
    Paired,
}

/// A directed connection between two named stages.
#[derive(Debug, Clone, PartialEq)]
pub struct StageLink {
    pub from: String,
    pub to: String,
    pub pattern: LinkPattern,
    /// Base opacity before jitter.
    pub opacity: f32,
}

impl StageLink {
    pub fn full(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            pattern: LinkPattern::Full,
            opacity: 0.45,
        }
    }

    pub fn paired(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            pattern: LinkPattern::Paired,
            ..Self::full(from, to)
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

/// A complete fixed topology.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageLayout {
    pub stages: Vec<StageSpec>,
    pub links: Vec<StageLink>,
}

impl StageLayout {
    pub fn stage(&mut self, stage: StageSpec) -> &mut Self {
        self.stages.push(stage);
        self
    }

    pub fn link(&mut self, link: StageLink) -> &mut Self {
        self.links.push(link);
        self
    }
}

/// Realize `layout` under an edge ceiling of `budget`.
///
/// Nodes take the stage index as their layer index. Links naming an unknown
/// stage are skipped. Edge creation stops as soon as the budget is reached.
pub fn instantiate(layout: &StageLayout, budget: usize, rng: &mut SeededRandom) -> Realized {
    let mut nodes = Vec::new();
    let mut ranges: HashMap<&str, (usize, usize, usize)> = HashMap::new();

    for (stage_index, stage) in layout.stages.iter().enumerate() {
        let start = nodes.len();
        let radius = stage.shape.node_radius();
        for (neuron_index, offset) in stage.shape.offsets().into_iter().enumerate() {
            let [ox, oy, oz] = stage.origin;
            nodes.push(GraphNode {
                position: [ox + offset[0], lift_above_ground(oy + offset[1]), oz + offset[2]],
                layer_index: stage_index,
                neuron_index,
                tag: stage.tag.to_string(),
                color: stage.color,
                radius,
            });
        }
        ranges.insert(stage.name.as_str(), (stage_index, start, nodes.len() - start));
    }

    let mut budget = EdgeBudget::new(budget);
    let mut edges = Vec::new();

    'links: for link in &layout.links {
        let (Some(&(from_layer, from_start, from_len)), Some(&(to_layer, to_start, to_len))) =
            (ranges.get(link.from.as_str()), ranges.get(link.to.as_str()))
        else {
            warn!(from = %link.from, to = %link.to, "link names an unknown stage");
            continue;
        };

        for (a, b) in pairs(link.pattern, from_len, to_len) {
            if !budget.try_claim() {
                debug!(limit = budget.limit(), "connection budget exhausted");
                break 'links;
            }
            let jitter = 0.85 + 0.3 * rng.next_f64() as f32;
            edges.push(GraphEdge {
                from: from_start + a,
                to: to_start + b,
                from_layer,
                to_layer,
                opacity: (link.opacity * jitter).clamp(0.0, 1.0),
            });
        }
    }

    Realized { nodes, edges }
}

fn pairs(pattern: LinkPattern, from_len: usize, to_len: usize) -> Vec<(usize, usize)> {
    if from_len == 0 || to_len == 0 {
        return Vec::new();
    }
    match pattern {
        LinkPattern::Full => (0..from_len)
            .flat_map(|a| (0..to_len).map(move |b| (a, b)))
            .collect(),
        LinkPattern::Paired => (0..from_len.max(to_len))
            .map(|k| (k % from_len, k % to_len))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors;

    fn layout() -> StageLayout {
        let mut layout = StageLayout::default();
        layout
            .stage(StageSpec::new(
                "in",
                "input",
                StageShape::Column { count: 3, spacing: 0.5 },
                colors::INPUT,
                [-2.0, 0.0, 0.0],
            ))
            .stage(StageSpec::new("hub", "hidden", StageShape::Single, colors::HIDDEN, [0.0, 0.0, 0.0]))
            .stage(StageSpec::new(
                "out",
                "output",
                StageShape::Grid { cols: 2, rows: 2, spacing: 0.5 },
                colors::OUTPUT,
                [2.0, 0.0, 0.0],
            ))
            .link(StageLink::full("in", "hub"))
            .link(StageLink::full("hub", "out"))
            .link(StageLink::paired("in", "out"));
        layout
    }

    #[test]
    fn test_shape_counts() {
        assert_eq!(StageShape::Single.offsets().len(), 1);
        assert_eq!(StageShape::Grid { cols: 3, rows: 2, spacing: 1.0 }.offsets().len(), 6);
        let ring = StageShape::Ring { count: 5, radius: 1.0 };
        assert_eq!(ring.offsets().len(), ring.node_count());
    }

    #[test]
    fn test_instantiate_counts() {
        let out = instantiate(&layout(), 100, &mut SeededRandom::new(1));
        assert_eq!(out.nodes.len(), 8);
        // 3 + 4 + max(3, 4)
        assert_eq!(out.edges.len(), 11);
        assert_eq!(out.nodes[3].tag, "hidden");
        assert_eq!(out.nodes[3].radius, HUB_RADIUS);
    }

    #[test]
    fn test_instantiate_budget() {
        let out = instantiate(&layout(), 5, &mut SeededRandom::new(1));
        assert_eq!(out.edges.len(), 5);
    }

    #[test]
    fn test_unknown_stage_skipped() {
        let mut layout = layout();
        layout.link(StageLink::full("missing", "hub"));
        let out = instantiate(&layout, 100, &mut SeededRandom::new(1));
        assert_eq!(out.edges.len(), 11);
    }

    #[test]
    fn test_paired_wraps() {
        assert_eq!(pairs(LinkPattern::Paired, 2, 3), vec![(0, 0), (1, 1), (0, 2)]);
        assert!(pairs(LinkPattern::Full, 0, 3).is_empty());
    }
}
