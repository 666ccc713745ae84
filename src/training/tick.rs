//! Synthetic loss/accuracy random walk.
//!
//! Nothing is trained. Each tick decays the loss and pulls accuracy toward
//! 0.9 at a rate set by the learning rate, with a little seeded noise.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{SceneError, SceneResult};
use crate::rng::SeededRandom;

/// Loss never drops below this.
pub const LOSS_FLOOR: f64 = 0.001;

/// Accuracy never rises above this.
pub const ACCURACY_CEILING: f64 = 0.92;

/// Accuracy at which a run counts as complete.
pub const COMPLETE_ACCURACY: f64 = 0.9;

pub const INITIAL_LOSS: f64 = 2.3;
pub const INITIAL_ACCURACY: f64 = 0.1;

/// One synthesized sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickSample {
    pub loss: f64,
    pub accuracy: f64,
    pub complete: bool,
}

/// Synthesize the sample following `(prev_loss, prev_accuracy)`.
///
/// Draws exactly two values from `rng`, loss noise first. The loss and
/// accuracy clamps hold for any input, including non-finite ones.
pub fn tick(
    prev_loss: f64,
    prev_accuracy: f64,
    learning_rate: f64,
    rng: &mut impl FnMut() -> f64,
) -> TickSample {
    let decay = 1.0 - learning_rate * 20.0;
    let loss = (prev_loss * decay + (rng() - 0.5) * 0.01).max(LOSS_FLOOR);

    let improvement = (0.9 - prev_accuracy) * learning_rate * 15.0;
    let accuracy = (prev_accuracy + improvement + (rng() - 0.5) * 0.005).min(ACCURACY_CEILING);

    TickSample {
        loss,
        accuracy,
        complete: accuracy >= COMPLETE_ACCURACY,
    }
}

/// Reject learning rates that are not finite and positive.
pub fn validate_learning_rate(learning_rate: f64) -> SceneResult<f64> {
    if learning_rate.is_finite() && learning_rate > 0.0 {
        Ok(learning_rate)
    } else {
        Err(SceneError::InvalidLearningRate(learning_rate))
    }
}

/// Stateful driver around [`tick`].
#[derive(Debug, Clone)]
pub struct TrainingSimulator {
    rng: SeededRandom,
    seed: Option<f64>,
    learning_rate: f64,
    loss: f64,
    accuracy: f64,
    epoch: u64,
    max_epochs: Option<u64>,
    complete: bool,
    history: Vec<TickSample>,
}

impl TrainingSimulator {
    pub fn new(learning_rate: f64, seed: Option<f64>) -> SceneResult<Self> {
        Ok(Self {
            rng: SeededRandom::from_raw(seed),
            seed,
            learning_rate: validate_learning_rate(learning_rate)?,
            loss: INITIAL_LOSS,
            accuracy: INITIAL_ACCURACY,
            epoch: 0,
            max_epochs: None,
            complete: false,
            history: Vec::new(),
        })
    }

    /// Stop after `max_epochs` steps even if accuracy never converges.
    pub fn with_max_epochs(mut self, max_epochs: u64) -> Self {
        self.max_epochs = Some(max_epochs);
        self
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> SceneResult<()> {
        self.learning_rate = validate_learning_rate(learning_rate)?;
        Ok(())
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn loss(&self) -> f64 {
        self.loss
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn history(&self) -> &[TickSample] {
        &self.history
    }

    /// True once accuracy converged or the epoch limit was reached.
    pub fn is_finished(&self) -> bool {
        self.complete || self.max_epochs.is_some_and(|max| self.epoch >= max)
    }

    /// Advance one epoch. Returns `None` once finished.
    pub fn step(&mut self) -> Option<TickSample> {
        if self.is_finished() {
            return None;
        }
        let (loss, accuracy, lr) = (self.loss, self.accuracy, self.learning_rate);
        let sample = tick(loss, accuracy, lr, &mut self.rng.as_source());

        self.loss = sample.loss;
        self.accuracy = sample.accuracy;
        self.complete = sample.complete;
        self.epoch += 1;
        self.history.push(sample);
        debug!(epoch = self.epoch, loss = sample.loss, accuracy = sample.accuracy, "tick");

        if sample.complete {
            info!(epoch = self.epoch, accuracy = sample.accuracy, "training converged");
        }
        Some(sample)
    }

    /// Back to the initial state, replaying the same seed.
    pub fn reset(&mut self) {
        self.rng = SeededRandom::from_raw(self.seed);
        self.loss = INITIAL_LOSS;
        self.accuracy = INITIAL_ACCURACY;
        self.epoch = 0;
        self.complete = false;
        self.history.clear();
    }
}
