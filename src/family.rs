//! Model families and their per-family presentation profiles.
//!
//! A [`ModelFamily`] selects the topology strategy used by the builder.
//! Generic families place caller-supplied layers; legacy families emit a
//! fixed, hand-authored stage graph and mostly ignore neuron counts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of topology strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelFamily {
    /// Plain stacked dense layers.
    #[default]
    FeedForward,
    /// Neural-operator style: spiral placement, phase-biased edges.
    Operator,
    /// Encoder/decoder with mirrored widths and skip paths.
    Autoencoder,
    /// Generic mixture-of-experts rendered from the layer list.
    Mixture,
    /// Fixed convolutional pipeline.
    Cnn,
    /// Fixed encoder-block transformer.
    Transformer,
    /// Unrolled vanilla recurrent cell.
    Rnn,
    /// Unrolled LSTM cell with three gates per step.
    Lstm,
    /// Unrolled GRU cell with two gates per step.
    Gru,
    /// Generator/discriminator pair.
    Gan,
    /// Fixed gate-and-experts mixture.
    LegacyMixture,
}

impl ModelFamily {
    /// Every family, generic first.
    pub const ALL: [ModelFamily; 11] = [
        ModelFamily::FeedForward,
        ModelFamily::Operator,
        ModelFamily::Autoencoder,
        ModelFamily::Mixture,
        ModelFamily::Cnn,
        ModelFamily::Transformer,
        ModelFamily::Rnn,
        ModelFamily::Lstm,
        ModelFamily::Gru,
        ModelFamily::Gan,
        ModelFamily::LegacyMixture,
    ];

    /// Whether this family bypasses layer-driven placement.
    pub fn is_legacy(&self) -> bool {
        !matches!(
            self,
            ModelFamily::FeedForward
                | ModelFamily::Operator
                | ModelFamily::Autoencoder
                | ModelFamily::Mixture
        )
    }

    /// Canonical kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            ModelFamily::FeedForward => "feed-forward",
            ModelFamily::Operator => "operator",
            ModelFamily::Autoencoder => "autoencoder",
            ModelFamily::Mixture => "mixture",
            ModelFamily::Cnn => "cnn",
            ModelFamily::Transformer => "transformer",
            ModelFamily::Rnn => "rnn",
            ModelFamily::Lstm => "lstm",
            ModelFamily::Gru => "gru",
            ModelFamily::Gan => "gan",
            ModelFamily::LegacyMixture => "legacy-mixture",
        }
    }

    /// Parse a family name, falling back to feed-forward when unrecognized.
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(family = name, "unknown model family, using feed-forward");
            ModelFamily::FeedForward
        })
    }

    /// Presentation profile for this family.
    pub fn profile(&self) -> &'static FamilyProfile {
        &PROFILES[*self as usize]
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned by [`ModelFamily::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown model family: {0}")]
pub struct UnknownFamily(pub String);

impl FromStr for ModelFamily {
    type Err = UnknownFamily;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        let family = match normalized.as_str() {
            "feed-forward" | "feedforward" | "mlp" | "dense" => ModelFamily::FeedForward,
            "operator" | "neural-operator" | "fno" => ModelFamily::Operator,
            "autoencoder" | "ae" => ModelFamily::Autoencoder,
            "mixture" | "moe" => ModelFamily::Mixture,
            "cnn" | "conv" => ModelFamily::Cnn,
            "transformer" => ModelFamily::Transformer,
            "rnn" => ModelFamily::Rnn,
            "lstm" => ModelFamily::Lstm,
            "gru" => ModelFamily::Gru,
            "gan" => ModelFamily::Gan,
            "legacy-mixture" | "legacy-moe" => ModelFamily::LegacyMixture,
            _ => return Err(UnknownFamily(s.to_string())),
        };
        Ok(family)
    }
}

/// Per-family layout and budget constants.
///
/// `layer_spacing` and `scale_factor` grow together across families so that
/// a family with a larger scale factor never produces a smaller scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FamilyProfile {
    /// Distance between consecutive layers along x.
    pub layer_spacing: f32,
    /// Multiplier applied to the scene extent for the camera distance.
    pub scale_factor: f32,
    /// Edge ceiling used when the caller gives no override.
    pub default_budget: Option<usize>,
    /// Fixed camera distance for legacy families.
    pub legacy_distance: Option<f32>,
}

/// Budget used when neither an override nor a family default exists.
pub const GLOBAL_DEFAULT_BUDGET: usize = 1500;

const fn generic(layer_spacing: f32, scale_factor: f32, budget: usize) -> FamilyProfile {
    FamilyProfile {
        layer_spacing,
        scale_factor,
        default_budget: Some(budget),
        legacy_distance: None,
    }
}

const fn legacy(distance: f32, budget: Option<usize>) -> FamilyProfile {
    FamilyProfile {
        layer_spacing: 4.0,
        scale_factor: 1.0,
        default_budget: budget,
        legacy_distance: Some(distance),
    }
}

// Indexed by `ModelFamily as usize`; order must match the enum.
static PROFILES: [FamilyProfile; 11] = [
    generic(4.0, 1.5, 2000), // feed-forward
    generic(4.0, 1.9, 1600), // operator
    generic(4.0, 1.7, 1800), // autoencoder
    generic(4.5, 2.2, 1400), // mixture
    legacy(26.0, Some(600)), // cnn
    legacy(30.0, Some(800)), // transformer
    legacy(24.0, Some(400)), // rnn
    legacy(24.0, Some(500)), // lstm
    legacy(24.0, Some(450)), // gru
    legacy(28.0, None),      // gan
    legacy(30.0, Some(500)), // legacy-mixture
];
