//! Training-animation phase classification.
//!
//! A progress scalar sweeps `[0, 2n + 2)` for `n` stages: the first `n`
//! units are the forward pass, the next `n` the backward pass, and the last
//! two the parameter update. The classifier is purely positional.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Phase of the training animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingPhase {
    #[default]
    Idle,
    Forward,
    Backward,
    Update,
}

impl std::fmt::Display for TrainingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// Classify `progress` for a network of `stage_count` stages.
///
/// ```
/// use neural_scene::training::{classify_phase, TrainingPhase};
///
/// assert_eq!(classify_phase(0.2, 4), TrainingPhase::Forward);
/// assert_eq!(classify_phase(4.1, 4), TrainingPhase::Backward);
/// assert_eq!(classify_phase(8.2, 4), TrainingPhase::Update);
/// assert_eq!(classify_phase(f64::NAN, 4), TrainingPhase::Idle);
/// ```
pub fn classify_phase(progress: f64, stage_count: usize) -> TrainingPhase {
    if stage_count == 0 || !progress.is_finite() {
        return TrainingPhase::Idle;
    }
    let n = stage_count as f64;
    if progress < n {
        TrainingPhase::Forward
    } else if progress < 2.0 * n {
        TrainingPhase::Backward
    } else {
        TrainingPhase::Update
    }
}

/// Period of the progress scalar: `2n + 2`.
pub fn cycle_length(stage_count: usize) -> f64 {
    2.0 * stage_count as f64 + 2.0
}

/// Which stages are highlighted at a given progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStage {
    None,
    One(usize),
    All,
}

/// Forward walks stages `0..n`, backward walks `n-1..0`, update lights all.
pub fn active_stage(progress: f64, stage_count: usize) -> ActiveStage {
    let last = stage_count.saturating_sub(1);
    match classify_phase(progress, stage_count) {
        TrainingPhase::Idle => ActiveStage::None,
        TrainingPhase::Forward => ActiveStage::One((progress.max(0.0) as usize).min(last)),
        TrainingPhase::Backward => {
            let offset = (progress - stage_count as f64) as usize;
            ActiveStage::One(last - offset.min(last))
        }
        TrainingPhase::Update => ActiveStage::All,
    }
}

/// Owns the progress scalar and keeps it monotonic within a cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseCursor {
    progress: f64,
    stage_count: usize,
}

impl PhaseCursor {
    pub fn new(stage_count: usize) -> Self {
        Self {
            progress: 0.0,
            stage_count,
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn stage_count(&self) -> usize {
        self.stage_count
    }

    pub fn phase(&self) -> TrainingPhase {
        classify_phase(self.progress, self.stage_count)
    }

    pub fn active_stage(&self) -> ActiveStage {
        active_stage(self.progress, self.stage_count)
    }

    /// Move forward by `delta`, wrapping at the end of the cycle.
    ///
    /// Negative or non-finite steps are ignored; use [`reset`](Self::reset)
    /// to go back.
    pub fn advance(&mut self, delta: f64) -> TrainingPhase {
        if self.stage_count == 0 {
            return TrainingPhase::Idle;
        }
        if !delta.is_finite() || delta < 0.0 {
            warn!(delta, "ignoring non-monotonic progress step");
            return self.phase();
        }
        self.progress = (self.progress + delta) % cycle_length(self.stage_count);
        self.phase()
    }

    pub fn reset(&mut self) {
        self.progress = 0.0;
    }

    /// Change the stage count; progress restarts.
    pub fn set_stage_count(&mut self, stage_count: usize) {
        self.stage_count = stage_count;
        self.reset();
    }
}
