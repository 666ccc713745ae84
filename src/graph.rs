//! Realized graph: positioned nodes, budget-accepted edges, summary stats.

use serde::Serialize;

use crate::colors::Color;
use crate::family::ModelFamily;

/// Lowest y a node center may take: the ground plane plus a node radius.
pub const GROUND_FLOOR_Y: f32 = -3.0 + NODE_RADIUS;

/// Default rendered radius of a neuron node.
pub const NODE_RADIUS: f32 = 0.22;

/// Distance between neighbouring grid cells inside a layer.
pub const CELL_SPACING: f32 = 0.9;

/// Offset along x between stacked z-slabs of a deep grid, as a fraction of
/// [`CELL_SPACING`].
pub const SLAB_SPACING: f32 = 0.6;

/// A positioned node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    /// Center position [x, y, z].
    pub position: [f32; 3],
    /// Layer (generic mode) or stage (legacy mode) this node belongs to.
    pub layer_index: usize,
    /// Index within that layer or stage.
    pub neuron_index: usize,
    /// Semantic role, e.g. "neuron", "generator", "gate".
    pub tag: String,
    /// Base color.
    pub color: Color,
    /// Rendered radius.
    pub radius: f32,
}

/// A directed edge between two nodes of the same graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    /// Index of the source node in [`SceneGraph::nodes`].
    pub from: usize,
    /// Index of the target node in [`SceneGraph::nodes`].
    pub to: usize,
    pub from_layer: usize,
    pub to_layer: usize,
    /// Line opacity in [0, 1].
    pub opacity: f32,
}

/// Summary statistics for a status readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GraphStats {
    pub neuron_count: usize,
    pub connection_count: usize,
    pub connection_budget: usize,
}

/// Output of one build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneGraph {
    pub family: ModelFamily,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Edge ceiling this graph was built under.
    pub connection_budget: usize,
    /// Recommended camera distance for this geometry.
    pub camera_distance: f32,
}

impl SceneGraph {
    /// An empty graph (no nodes, no edges) at the family's camera distance.
    pub fn empty(family: ModelFamily, connection_budget: usize) -> Self {
        Self {
            family,
            nodes: Vec::new(),
            edges: Vec::new(),
            connection_budget,
            camera_distance: crate::camera::recommended_distance(&[], family),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            neuron_count: self.nodes.len(),
            connection_count: self.edges.len(),
            connection_budget: self.connection_budget,
        }
    }

    /// Nodes carrying `tag`.
    pub fn nodes_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a GraphNode> + 'a {
        self.nodes.iter().filter(move |n| n.tag == tag)
    }

    /// Axis-aligned bounds `(min, max)` of node centers, `None` when empty.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.nodes.first()?.position;
        Some(self.nodes.iter().fold((first, first), |(mut lo, mut hi), n| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(n.position[axis]);
                hi[axis] = hi[axis].max(n.position[axis]);
            }
            (lo, hi)
        }))
    }
}

/// Clamp a y coordinate onto or above the ground floor.
pub fn lift_above_ground(y: f32) -> f32 {
    y.max(GROUND_FLOOR_Y)
}
