//! Colors for layers, stages and edges.
//!
//! Layer colors cycle through a fixed categorical palette by layer index.
//! Legacy stage tables use the named semantic colors below.

use serde::{Deserialize, Serialize};

/// RGBA color with f32 components in [0, 1] range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Create a new color from RGB values (alpha defaults to 1.0)
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Format as `#rrggbb` (alpha dropped)
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }

    /// Convert to [r, g, b, a] array
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Same color with a different alpha
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Palette cycled by layer index.
pub const LAYER_PALETTE: [Color; 8] = [
    Color::rgb(0.310, 0.765, 0.969), // sky
    Color::rgb(0.506, 0.780, 0.518), // green
    Color::rgb(1.000, 0.718, 0.302), // amber
    Color::rgb(0.729, 0.408, 0.784), // violet
    Color::rgb(0.898, 0.451, 0.451), // coral
    Color::rgb(0.302, 0.714, 0.675), // teal
    Color::rgb(1.000, 0.945, 0.463), // lemon
    Color::rgb(0.584, 0.459, 0.804), // indigo
];

/// Palette color for the layer at `index`.
pub fn layer_color(index: usize) -> Color {
    LAYER_PALETTE[index % LAYER_PALETTE.len()]
}

/// Default edge color before opacity is applied.
pub const EDGE_COLOR: Color = Color::rgb(0.565, 0.643, 0.682);

// Semantic stage colors for the fixed topologies.
pub const INPUT: Color = Color::rgb(0.310, 0.765, 0.969);
pub const OUTPUT: Color = Color::rgb(0.898, 0.451, 0.451);
pub const CONV: Color = Color::rgb(0.392, 0.710, 0.965);
pub const POOL: Color = Color::rgb(0.565, 0.792, 0.976);
pub const DENSE: Color = Color::rgb(0.506, 0.780, 0.518);
pub const EMBEDDING: Color = Color::rgb(0.729, 0.408, 0.784);
pub const ATTENTION: Color = Color::rgb(1.000, 0.718, 0.302);
pub const NORM: Color = Color::rgb(0.302, 0.816, 0.882);
pub const FEED_FORWARD: Color = Color::rgb(0.682, 0.835, 0.506);
pub const HIDDEN: Color = Color::rgb(0.584, 0.459, 0.804);
pub const GATE: Color = Color::rgb(1.000, 0.835, 0.310);
pub const GENERATOR: Color = Color::rgb(0.302, 0.714, 0.675);
pub const DISCRIMINATOR: Color = Color::rgb(0.941, 0.384, 0.573);
pub const NOISE: Color = Color::rgb(0.690, 0.745, 0.773);
pub const EXPERT: Color = Color::rgb(1.000, 0.541, 0.396);
