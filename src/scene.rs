//! Live scene ownership: install, release, rebuild-and-swap.
//!
//! A rendering backend exposes add/remove of node-like and edge-like
//! primitives through [`SceneSink`]. Primitives it hands out are not
//! reclaimed on their own, so the graph currently on screen is held as an
//! [`InstalledGraph`] that must be [released](InstalledGraph::release)
//! before the next one goes in. [`SceneController`] does exactly that on
//! every rebuild.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::builder::{build_graph, BuildRequest};
use crate::colors::EDGE_COLOR;
use crate::graph::{GraphEdge, GraphNode, GraphStats, SceneGraph};

/// Handle to a primitive owned by a [`SceneSink`].
pub type PrimitiveId = u64;

/// Rendering backend seen by the builder.
pub trait SceneSink {
    /// Add a node primitive.
    fn add_node(&mut self, node: &GraphNode) -> PrimitiveId;

    /// Add an edge primitive between two node centers.
    fn add_edge(&mut self, edge: &GraphEdge, from: [f32; 3], to: [f32; 3]) -> PrimitiveId;

    /// Remove and dispose of a primitive.
    fn remove(&mut self, id: PrimitiveId);
}

/// A graph whose primitives live in a sink.
#[derive(Debug)]
pub struct InstalledGraph {
    graph: SceneGraph,
    node_ids: Vec<PrimitiveId>,
    edge_ids: Vec<PrimitiveId>,
}

impl InstalledGraph {
    /// Add every node and edge of `graph` to `sink`.
    pub fn install(sink: &mut dyn SceneSink, graph: SceneGraph) -> Self {
        let node_ids: Vec<_> = graph.nodes.iter().map(|n| sink.add_node(n)).collect();
        let edge_ids = graph
            .edges
            .iter()
            .map(|e| {
                let from = graph.nodes[e.from].position;
                let to = graph.nodes[e.to].position;
                sink.add_edge(e, from, to)
            })
            .collect();
        Self {
            graph,
            node_ids,
            edge_ids,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }

    /// Primitives still held in the sink.
    pub fn primitive_count(&self) -> usize {
        self.node_ids.len() + self.edge_ids.len()
    }

    /// Remove every primitive from `sink`, edges first.
    pub fn release(mut self, sink: &mut dyn SceneSink) -> SceneGraph {
        for id in self.edge_ids.drain(..).chain(self.node_ids.drain(..)) {
            sink.remove(id);
        }
        debug!(nodes = self.graph.nodes.len(), "released installed graph");
        std::mem::replace(
            &mut self.graph,
            SceneGraph::empty(Default::default(), 0),
        )
    }
}

impl Drop for InstalledGraph {
    fn drop(&mut self) {
        if self.primitive_count() > 0 {
            warn!(
                primitives = self.primitive_count(),
                "installed graph dropped without release"
            );
        }
    }
}

/// Token identifying one requested rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildTicket(u64);

/// Generation counter: each request supersedes every earlier one.
///
/// Share it behind an `Arc` between whoever schedules rebuilds and whoever
/// runs them.
#[derive(Debug, Default)]
pub struct RebuildGate {
    generation: AtomicU64,
}

impl RebuildGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a rebuild, cancelling any still pending.
    pub fn request(&self) -> RebuildTicket {
        RebuildTicket(self.generation.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// True while no newer request has been made.
    pub fn is_current(&self, ticket: RebuildTicket) -> bool {
        self.generation.load(Ordering::Acquire) == ticket.0
    }

    /// Cancel whatever is pending.
    pub fn cancel_pending(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// Owns the graph currently installed in the scene.
#[derive(Debug, Default)]
pub struct SceneController {
    current: Option<InstalledGraph>,
}

impl SceneController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The graph on screen, if any.
    pub fn current(&self) -> Option<&SceneGraph> {
        self.current.as_ref().map(InstalledGraph::graph)
    }

    /// Release the current graph, build a new one and install it.
    ///
    /// Without a sink nothing is built and zero statistics are returned.
    pub fn rebuild(&mut self, sink: Option<&mut dyn SceneSink>, request: &BuildRequest) -> GraphStats {
        let Some(sink) = sink else {
            debug!("no scene target, skipping rebuild");
            return GraphStats::default();
        };

        self.clear(sink);
        let installed = InstalledGraph::install(sink, build_graph(request));
        let stats = installed.stats();
        info!(
            family = %request.family,
            neurons = stats.neuron_count,
            connections = stats.connection_count,
            budget = stats.connection_budget,
            "scene rebuilt"
        );
        self.current = Some(installed);
        stats
    }

    /// Like [`rebuild`](Self::rebuild) but only if `ticket` is still the
    /// latest request on `gate`. Stale tickets return `None` and leave the
    /// scene untouched.
    pub fn rebuild_if_current(
        &mut self,
        gate: &RebuildGate,
        ticket: RebuildTicket,
        sink: Option<&mut dyn SceneSink>,
        request: &BuildRequest,
    ) -> Option<GraphStats> {
        if !gate.is_current(ticket) {
            debug!("stale rebuild request dropped");
            return None;
        }
        Some(self.rebuild(sink, request))
    }

    /// Release the current graph, if any.
    pub fn clear(&mut self, sink: &mut dyn SceneSink) {
        if let Some(previous) = self.current.take() {
            previous.release(sink);
        }
    }
}

/// A primitive held by [`HeadlessScene`].
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Node {
        position: [f32; 3],
        tag: String,
        color: [f32; 4],
    },
    /// Edges are drawn in [`EDGE_COLOR`] with the edge opacity as alpha.
    Edge {
        from: [f32; 3],
        to: [f32; 3],
        color: [f32; 4],
    },
}

/// In-memory [`SceneSink`] for headless runs and tests.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    primitives: HashMap<PrimitiveId, Primitive>,
    next_id: PrimitiveId,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live primitives of either kind.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.primitives
            .values()
            .filter(|p| matches!(p, Primitive::Node { .. }))
            .count()
    }

    pub fn edge_count(&self) -> usize {
        self.len() - self.node_count()
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(&id)
    }

    pub fn primitives(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives.values()
    }

    fn insert(&mut self, primitive: Primitive) -> PrimitiveId {
        self.next_id += 1;
        self.primitives.insert(self.next_id, primitive);
        self.next_id
    }
}

impl SceneSink for HeadlessScene {
    fn add_node(&mut self, node: &GraphNode) -> PrimitiveId {
        self.insert(Primitive::Node {
            position: node.position,
            tag: node.tag.clone(),
            color: node.color.to_array(),
        })
    }

    fn add_edge(&mut self, edge: &GraphEdge, from: [f32; 3], to: [f32; 3]) -> PrimitiveId {
        self.insert(Primitive::Edge {
            from,
            to,
            color: EDGE_COLOR.with_alpha(edge.opacity).to_array(),
        })
    }

    fn remove(&mut self, id: PrimitiveId) {
        if self.primitives.remove(&id).is_none() {
            warn!(id, "removing unknown primitive");
        }
    }
}
