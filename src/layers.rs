//! Layer specifications and derived placement grids.
//!
//! Each layer's neuron count maps to a 3D grid `(gx, gy, gz)` whose capacity
//! always covers the count, plus a palette color chosen by layer index.

use serde::{Deserialize, Serialize};

use crate::colors::{layer_color, Color};

/// Upper bound on neurons per layer (an 8x8x8 grid).
pub const MAX_NEURONS_PER_LAYER: usize = 512;

/// Upper bound on the number of layers in a stack.
pub const MAX_LAYERS: usize = 32;

/// Activation function attached to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationKind {
    #[default]
    Relu,
    Sigmoid,
    Tanh,
    Softmax,
    Gelu,
    Linear,
}

/// One layer of the abstract model description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Display name; also scanned by legacy builders ("expert", "self-attention").
    pub name: String,
    /// Number of neurons, in `1..=MAX_NEURONS_PER_LAYER`.
    #[serde(alias = "neurons")]
    pub neuron_count: usize,
    /// Activation function.
    #[serde(default)]
    pub activation: ActivationKind,
}

impl LayerSpec {
    /// Create a layer; the neuron count is clamped into range.
    pub fn new(name: impl Into<String>, neuron_count: usize, activation: ActivationKind) -> Self {
        Self {
            name: name.into(),
            neuron_count: clamp_neurons(neuron_count),
            activation,
        }
    }

    /// Create a ReLU layer.
    pub fn dense(name: impl Into<String>, neuron_count: usize) -> Self {
        Self::new(name, neuron_count, ActivationKind::Relu)
    }

    /// Neuron count clamped into range, for specs built by struct literal
    /// or deserialized from untrusted input.
    pub fn effective_neurons(&self) -> usize {
        clamp_neurons(self.neuron_count)
    }

    /// Placement grid for this layer.
    pub fn grid(&self) -> GridShape {
        GridShape::for_neurons(self.effective_neurons())
    }
}

fn clamp_neurons(n: usize) -> usize {
    let clamped = n.clamp(1, MAX_NEURONS_PER_LAYER);
    if clamped != n {
        tracing::warn!(requested = n, clamped, "neuron count out of range");
    }
    clamped
}

/// Placement grid dimensions: `x * y * z >= neuron count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl GridShape {
    /// Choose the grid for `n` neurons.
    ///
    /// | neurons | grid |
    /// |---------|------|
    /// | ≤ 4 | 2x2x1 |
    /// | ≤ 9 | 3x3x1 |
    /// | ≤ 16 | 4x4x1 |
    /// | ≤ 36 | 6x6x1 |
    /// | more | 8x8x⌈n/64⌉ |
    pub fn for_neurons(n: usize) -> Self {
        match n {
            0..=4 => Self::new(2, 2, 1),
            5..=9 => Self::new(3, 3, 1),
            10..=16 => Self::new(4, 4, 1),
            17..=36 => Self::new(6, 6, 1),
            _ => Self::new(8, 8, n.div_ceil(64)),
        }
    }

    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Number of cells.
    pub fn capacity(&self) -> usize {
        self.x * self.y * self.z
    }

    /// Cell coordinates of the `index`-th neuron (x fastest, then y, then z).
    pub fn cell(&self, index: usize) -> (usize, usize, usize) {
        let plane = self.x * self.y;
        (index % self.x, (index / self.x) % self.y, index / plane)
    }
}

/// A layer together with its derived grid and color.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerConfig {
    pub spec: LayerSpec,
    pub grid: GridShape,
    pub color: Color,
}

/// Derive grids and colors for an ordered layer list.
pub fn derive_layer_configs(layers: &[LayerSpec]) -> Vec<LayerConfig> {
    layers
        .iter()
        .enumerate()
        .map(|(index, spec)| LayerConfig {
            spec: LayerSpec {
                neuron_count: spec.effective_neurons(),
                ..spec.clone()
            },
            grid: spec.grid(),
            color: layer_color(index),
        })
        .collect()
}

/// Ordered layer list with fixed input and output ends.
///
/// Hidden layers can be inserted and removed freely; the first and last
/// layers can only be resized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStack")]
pub struct LayerStack {
    layers: Vec<LayerSpec>,
}

/// Deserialized form, normalized through [`LayerStack::from_layers`].
#[derive(Deserialize)]
struct RawStack {
    #[serde(default)]
    layers: Vec<LayerSpec>,
}

impl From<RawStack> for LayerStack {
    fn from(raw: RawStack) -> Self {
        LayerStack::from_layers(raw.layers)
    }
}

impl LayerStack {
    /// Create a stack with just an input and an output layer.
    pub fn new(input_neurons: usize, output_neurons: usize) -> Self {
        Self {
            layers: vec![
                LayerSpec::dense("Input", input_neurons),
                LayerSpec::new("Output", output_neurons, ActivationKind::Softmax),
            ],
        }
    }

    /// Wrap an existing list. Lists shorter than two layers are padded with
    /// default input/output layers; lists longer than [`MAX_LAYERS`] lose
    /// hidden layers from the end of the middle, keeping both ends.
    pub fn from_layers(mut layers: Vec<LayerSpec>) -> Self {
        if layers.is_empty() {
            layers.push(LayerSpec::dense("Input", 4));
        }
        if layers.len() == 1 {
            layers.push(LayerSpec::new("Output", 2, ActivationKind::Softmax));
        }
        let len = layers.len();
        if len > MAX_LAYERS {
            tracing::warn!(len, max = MAX_LAYERS, "dropping hidden layers over the limit");
            layers.drain(MAX_LAYERS - 1..len - 1);
        }
        for layer in &mut layers {
            layer.neuron_count = layer.effective_neurons();
        }
        Self { layers }
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Insert a hidden layer before `position`, clamped to lie strictly
    /// between input and output. Returns false when the stack is full.
    pub fn insert_hidden(&mut self, position: usize, spec: LayerSpec) -> bool {
        if self.layers.len() >= MAX_LAYERS {
            return false;
        }
        let position = position.clamp(1, self.layers.len().saturating_sub(1).max(1));
        self.layers.insert(
            position,
            LayerSpec {
                neuron_count: spec.effective_neurons(),
                ..spec
            },
        );
        true
    }

    /// Remove a hidden layer. Input and output are never removed.
    pub fn remove_hidden(&mut self, index: usize) -> bool {
        if index == 0 || index + 1 >= self.layers.len() {
            return false;
        }
        self.layers.remove(index);
        true
    }

    /// Resize a layer; the count is clamped into range.
    pub fn set_neuron_count(&mut self, index: usize, neuron_count: usize) -> bool {
        match self.layers.get_mut(index) {
            Some(layer) => {
                layer.neuron_count = clamp_neurons(neuron_count);
                true
            }
            None => false,
        }
    }

    /// Largest neuron count in the stack.
    pub fn max_neuron_count(&self) -> usize {
        max_neuron_count(&self.layers)
    }

    pub fn into_layers(self) -> Vec<LayerSpec> {
        self.layers
    }
}

/// Largest effective neuron count in a layer list (0 when empty).
pub fn max_neuron_count(layers: &[LayerSpec]) -> usize {
    layers
        .iter()
        .map(LayerSpec::effective_neurons)
        .max()
        .unwrap_or(0)
}
