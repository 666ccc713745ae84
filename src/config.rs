//! Scene and training configuration.
//!
//! Loaded from TOML. Every field has a default, so a partial file is valid:
//!
//! ```toml
//! [model]
//! family = "autoencoder"
//! seed = 42
//!
//! [[model.layers]]
//! name = "Input"
//! neurons = 32
//!
//! [[model.layers]]
//! name = "Latent"
//! neurons = 4
//!
//! [training]
//! learning_rate = 0.02
//! speed = 2.0
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::builder::BuildRequest;
use crate::error::{SceneError, SceneResult};
use crate::family::ModelFamily;
use crate::layers::{ActivationKind, LayerSpec, MAX_LAYERS};
use crate::training::{interval_for, validate_learning_rate, TrainingSimulator};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub model: ModelSection,
    pub training: TrainingSection,
}

/// What to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    pub family: ModelFamily,
    /// Build seed; absent means the default seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<f64>,
    /// Edge ceiling; absent means the family default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_budget: Option<f64>,
    pub layers: Vec<LayerSpec>,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            family: ModelFamily::FeedForward,
            seed: None,
            connection_budget: None,
            layers: preset_layers(ModelFamily::FeedForward),
        }
    }
}

/// How the synthetic training loop runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSection {
    pub learning_rate: f64,
    /// Speed multiplier; the tick interval is `base_interval_ms / speed`.
    pub speed: f64,
    pub base_interval_ms: u64,
    /// Stop after this many epochs; 0 means run until convergence.
    pub max_epochs: u64,
    /// Progress added to the phase cursor per tick.
    pub phase_step: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<f64>,
}

impl Default for TrainingSection {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            speed: 1.0,
            base_interval_ms: 500,
            max_epochs: 200,
            phase_step: 0.5,
            seed: None,
        }
    }
}

impl TrainingSection {
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }

    /// A fresh simulator for these settings.
    pub fn simulator(&self) -> SceneResult<TrainingSimulator> {
        let simulator = TrainingSimulator::new(self.learning_rate, self.seed)?;
        Ok(match self.max_epochs {
            0 => simulator,
            max => simulator.with_max_epochs(max),
        })
    }
}

impl SceneConfig {
    /// Defaults with the preset layer stack for `family`.
    pub fn preset(family: ModelFamily) -> Self {
        Self {
            model: ModelSection {
                family,
                layers: preset_layers(family),
                ..ModelSection::default()
            },
            training: TrainingSection::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> SceneResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> SceneResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load and validate a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SceneResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        info!(path = %path.as_ref().display(), family = %config.model.family, "loaded config");
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> SceneResult<()> {
        std::fs::write(path.as_ref(), self.to_toml_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> SceneResult<()> {
        if self.model.layers.is_empty() {
            return Err(SceneError::config("model.layers must not be empty"));
        }
        if self.model.layers.len() > MAX_LAYERS {
            return Err(SceneError::config(format!(
                "model.layers has {} entries, at most {} allowed",
                self.model.layers.len(),
                MAX_LAYERS
            )));
        }
        validate_learning_rate(self.training.learning_rate)?;
        if self.training.base_interval_ms == 0 {
            return Err(SceneError::config("training.base_interval_ms must be > 0"));
        }
        interval_for(self.training.base_interval(), self.training.speed)?;
        if !self.training.phase_step.is_finite() || self.training.phase_step <= 0.0 {
            return Err(SceneError::config("training.phase_step must be > 0"));
        }
        Ok(())
    }

    pub fn build_request(&self) -> BuildRequest {
        BuildRequest {
            family: self.model.family,
            layers: self.model.layers.clone(),
            seed: self.model.seed,
            budget_override: self.model.connection_budget,
        }
    }
}

/// A representative layer stack for `family`.
pub fn preset_layers(family: ModelFamily) -> Vec<LayerSpec> {
    use ActivationKind::*;
    let table: &[(&str, usize, ActivationKind)] = match family {
        ModelFamily::FeedForward => &[
            ("Input", 8, Linear),
            ("Hidden 1", 16, Relu),
            ("Hidden 2", 16, Relu),
            ("Output", 4, Softmax),
        ],
        ModelFamily::Operator => &[
            ("Lift", 16, Linear),
            ("Spectral 1", 32, Gelu),
            ("Spectral 2", 32, Gelu),
            ("Project", 16, Linear),
        ],
        ModelFamily::Autoencoder => &[
            ("Input", 32, Linear),
            ("Encoder", 16, Relu),
            ("Latent", 4, Linear),
            ("Decoder", 16, Relu),
            ("Reconstruction", 32, Sigmoid),
        ],
        ModelFamily::Mixture => &[
            ("Input", 16, Linear),
            ("Router", 4, Softmax),
            ("Experts", 32, Relu),
            ("Output", 8, Softmax),
        ],
        ModelFamily::Cnn => &[
            ("Image", 16, Linear),
            ("Conv", 32, Relu),
            ("Pool", 16, Linear),
            ("Dense", 16, Relu),
            ("Output", 10, Softmax),
        ],
        ModelFamily::Transformer => &[
            ("Embedding", 16, Linear),
            ("Self-Attention 1", 16, Softmax),
            ("Feed-Forward 1", 32, Gelu),
            ("Self-Attention 2", 16, Softmax),
            ("Feed-Forward 2", 32, Gelu),
            ("Self-Attention 3", 16, Softmax),
            ("Output", 8, Softmax),
        ],
        ModelFamily::Rnn | ModelFamily::Lstm | ModelFamily::Gru => &[
            ("Input", 8, Linear),
            ("Hidden", 12, Tanh),
            ("Output", 4, Softmax),
        ],
        ModelFamily::Gan => &[
            ("Noise", 8, Linear),
            ("Generator", 32, Relu),
            ("Discriminator", 32, Relu),
            ("Verdict", 1, Sigmoid),
        ],
        ModelFamily::LegacyMixture => &[
            ("Input", 16, Linear),
            ("Experts", 6, Relu),
            ("Output", 8, Softmax),
        ],
    };
    table
        .iter()
        .map(|&(name, neurons, activation)| LayerSpec::new(name, neurons, activation))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::legacy::{encoder_blocks, expert_count};

    #[test]
    fn test_default_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_presets_valid() {
        for family in ModelFamily::ALL {
            let config = SceneConfig::preset(family);
            assert!(config.validate().is_ok(), "{}", family);
            assert_eq!(config.model.family, family);
        }
    }

    #[test]
    fn test_presets_drive_legacy_counts() {
        assert_eq!(encoder_blocks(&preset_layers(ModelFamily::Transformer)), 3);
        assert_eq!(expert_count(&preset_layers(ModelFamily::LegacyMixture)), 6);
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = SceneConfig::default();
        config.model.layers.clear();
        assert!(config.validate().is_err());

        let mut config = SceneConfig::default();
        config.model.layers = vec![LayerSpec::dense("x", 4); MAX_LAYERS + 1];
        assert!(config.validate().is_err());

        let mut config = SceneConfig::default();
        config.training.learning_rate = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SceneError::InvalidLearningRate(_))
        ));

        let mut config = SceneConfig::default();
        config.training.speed = -2.0;
        assert!(matches!(config.validate(), Err(SceneError::InvalidSpeed(_))));

        let mut config = SceneConfig::default();
        config.training.base_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config = SceneConfig::from_toml_str(
            r#"
            [model]
            family = "gan"
            seed = 42

            [[model.layers]]
            name = "Noise"
            neurons = 8

            [training]
            speed = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(config.model.family, ModelFamily::Gan);
        assert_eq!(config.model.seed, Some(42.0));
        assert_eq!(config.model.layers.len(), 1);
        assert_eq!(config.training.speed, 2.5);
        assert_eq!(config.training.learning_rate, 0.01);
        assert_eq!(config.build_request().seed, Some(42.0));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.toml");
        let mut config = SceneConfig::preset(ModelFamily::Autoencoder);
        config.model.connection_budget = Some(250.0);
        config.save(&path).unwrap();

        let loaded = SceneConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, SceneError::Io(_)));
    }

    #[test]
    fn test_simulator_from_section() {
        let section = TrainingSection {
            max_epochs: 3,
            ..Default::default()
        };
        let mut sim = section.simulator().unwrap();
        while sim.step().is_some() {}
        assert_eq!(sim.epoch(), 3);
    }
}
