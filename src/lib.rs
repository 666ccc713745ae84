//! Procedural 3D architecture graphs for neural network visualization.
//!
//! This crate provides:
//! - A deterministic, budget-bounded graph builder turning a layer list and a
//!   model family into positioned nodes and edges
//! - A recommended camera distance for the realized geometry
//! - Rebuild-and-swap ownership of the graph installed in a live scene
//! - A training-animation phase classifier and a synthetic loss/accuracy
//!   random walk on a cancellable periodic ticker
//!
//! No machine learning happens here; the geometry is decorative and the
//! metrics are synthetic.
//!
//! # Binaries
//!
//! - `neural-scene` - build graphs, run the training animation, print presets

pub mod budget;
pub mod builder;
pub mod camera;
pub mod colors;
pub mod config;
pub mod error;
pub mod family;
pub mod graph;
pub mod layers;
pub mod rng;
pub mod scene;
pub mod training;

pub use builder::{build_graph, BuildRequest};
pub use config::SceneConfig;
pub use error::{SceneError, SceneResult};
pub use family::ModelFamily;
pub use graph::{GraphEdge, GraphNode, GraphStats, SceneGraph};
pub use layers::{ActivationKind, LayerSpec, LayerStack};
pub use rng::{create_generator, sanitize_seed, SeededRandom};
pub use scene::{HeadlessScene, SceneController, SceneSink};
pub use training::{classify_phase, tick, TrainingPhase, TrainingSimulator};
