//! Procedural architecture-graph builder.
//!
//! Turns a layer list and a [`ModelFamily`] into a deterministic,
//! budget-bounded [`SceneGraph`]. Dispatch is a lookup table from family to
//! a strategy function; all strategies share one contract:
//! `fn(&BuildContext, &mut SeededRandom) -> Realized`.
//!
//! - Generic families ([`generic`]) place every layer's neurons and sample
//!   edges between adjacent layers under the [`ConnectionBudgetPolicy`].
//! - Legacy families ([`legacy`]) instantiate a fixed stage table through
//!   the shared routine in [`stages`].
//!
//! A new [`SeededRandom`] is created for every call, so equal requests give
//! bit-identical graphs.
//!
//! # Example
//!
//! ```
//! use neural_scene::builder::{build_graph, BuildRequest};
//! use neural_scene::family::ModelFamily;
//! use neural_scene::layers::LayerSpec;
//!
//! let layers = vec![
//!     LayerSpec::dense("Input", 8),
//!     LayerSpec::dense("Hidden", 8),
//!     LayerSpec::dense("Output", 8),
//! ];
//! let request = BuildRequest::new(ModelFamily::FeedForward, layers)
//!     .with_seed(42)
//!     .with_budget(10.0);
//! let graph = build_graph(&request);
//! assert!(graph.stats().connection_count <= 10);
//! ```
//!
//! [`ConnectionBudgetPolicy`]: crate::budget::ConnectionBudgetPolicy

pub mod generic;
pub mod legacy;
pub mod stages;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::budget::resolve_budget;
use crate::camera::recommended_distance;
use crate::family::ModelFamily;
use crate::graph::{GraphEdge, GraphNode, SceneGraph};
use crate::layers::LayerSpec;
use crate::rng::SeededRandom;

/// Everything a build needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub family: ModelFamily,
    pub layers: Vec<LayerSpec>,
    /// Raw seed; sanitized before use.
    #[serde(default)]
    pub seed: Option<f64>,
    /// Explicit edge ceiling; ignored unless finite and positive.
    #[serde(default)]
    pub budget_override: Option<f64>,
}

impl BuildRequest {
    pub fn new(family: ModelFamily, layers: Vec<LayerSpec>) -> Self {
        Self {
            family,
            layers,
            seed: None,
            budget_override: None,
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(f64::from(seed));
        self
    }

    pub fn with_raw_seed(mut self, seed: Option<f64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget_override = Some(budget);
        self
    }
}

/// Read-only inputs shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub family: ModelFamily,
    pub layers: &'a [LayerSpec],
    pub budget: usize,
}

/// Nodes and edges produced by a strategy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Realized {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Strategy signature shared by all families.
pub type Strategy = fn(&BuildContext<'_>, &mut SeededRandom) -> Realized;

/// Family → strategy table.
static STRATEGIES: [(ModelFamily, Strategy); 11] = [
    (ModelFamily::FeedForward, generic::build),
    (ModelFamily::Operator, generic::build),
    (ModelFamily::Autoencoder, generic::build),
    (ModelFamily::Mixture, generic::build),
    (ModelFamily::Cnn, legacy::build_cnn),
    (ModelFamily::Transformer, legacy::build_transformer),
    (ModelFamily::Rnn, legacy::build_recurrent),
    (ModelFamily::Lstm, legacy::build_recurrent),
    (ModelFamily::Gru, legacy::build_recurrent),
    (ModelFamily::Gan, legacy::build_gan),
    (ModelFamily::LegacyMixture, legacy::build_mixture),
];

/// Look up the strategy for `family`; unknown entries use the feed-forward path.
pub fn strategy_for(family: ModelFamily) -> Strategy {
    STRATEGIES
        .iter()
        .find(|(f, _)| *f == family)
        .map(|(_, s)| *s)
        .unwrap_or(generic::build)
}

/// Build the graph for `request`.
///
/// Zero layers produce an empty graph. The realized edge count never
/// exceeds the resolved budget.
pub fn build_graph(request: &BuildRequest) -> SceneGraph {
    let family = request.family;
    let budget = resolve_budget(family, request.budget_override);

    if request.layers.is_empty() {
        debug!(%family, "no layers, returning empty graph");
        return SceneGraph::empty(family, budget);
    }

    let ctx = BuildContext {
        family,
        layers: &request.layers,
        budget,
    };
    let mut rng = SeededRandom::from_raw(request.seed);
    let realized = strategy_for(family)(&ctx, &mut rng);

    debug!(
        %family,
        nodes = realized.nodes.len(),
        edges = realized.edges.len(),
        budget,
        "graph built"
    );

    SceneGraph {
        family,
        nodes: realized.nodes,
        edges: realized.edges,
        connection_budget: budget,
        camera_distance: recommended_distance(&request.layers, family),
    }
}
