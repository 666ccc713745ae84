//! Training animation: phase classification, synthetic metrics, and the
//! periodic loop that drives both.

pub mod phase;
pub mod tick;
pub mod ticker;

pub use phase::{active_stage, classify_phase, cycle_length, ActiveStage, PhaseCursor, TrainingPhase};
pub use tick::{tick, validate_learning_rate, TickSample, TrainingSimulator};
pub use ticker::{interval_for, PeriodicTicker, TickControl};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::error::SceneResult;

/// Point-in-time view of a running loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingSnapshot {
    pub epoch: u64,
    pub loss: f64,
    pub accuracy: f64,
    pub progress: f64,
    pub phase: TrainingPhase,
    pub active_stage: ActiveStage,
    pub finished: bool,
}

#[derive(Debug)]
struct LoopState {
    simulator: TrainingSimulator,
    cursor: PhaseCursor,
}

impl LoopState {
    fn snapshot(&self) -> TrainingSnapshot {
        TrainingSnapshot {
            epoch: self.simulator.epoch(),
            loss: self.simulator.loss(),
            accuracy: self.simulator.accuracy(),
            progress: self.cursor.progress(),
            phase: self.cursor.phase(),
            active_stage: self.cursor.active_stage(),
            finished: self.simulator.is_finished(),
        }
    }
}

type Observer = Box<dyn FnMut(TrainingSnapshot) + Send>;

/// Periodic ticker driving a shared simulator and phase cursor.
///
/// Every tick advances the simulator by one epoch and the cursor by
/// `phase_step`, then hands a snapshot to the observer. The loop ends by
/// itself once the simulator is finished.
pub struct TrainingLoop {
    state: Arc<Mutex<LoopState>>,
    observer: Arc<Mutex<Observer>>,
    phase_step: f64,
    base_interval: Duration,
    speed: f64,
    ticker: PeriodicTicker,
}

impl TrainingLoop {
    pub fn start<F>(
        simulator: TrainingSimulator,
        stage_count: usize,
        phase_step: f64,
        base_interval: Duration,
        speed: f64,
        observer: F,
    ) -> SceneResult<Self>
    where
        F: FnMut(TrainingSnapshot) + Send + 'static,
    {
        let state = Arc::new(Mutex::new(LoopState {
            simulator,
            cursor: PhaseCursor::new(stage_count),
        }));
        let observer: Arc<Mutex<Observer>> = Arc::new(Mutex::new(Box::new(observer)));
        let ticker = spawn_ticker(&state, &observer, phase_step, base_interval, speed)?;

        Ok(Self {
            state,
            observer,
            phase_step,
            base_interval,
            speed,
            ticker,
        })
    }

    pub fn snapshot(&self) -> TrainingSnapshot {
        self.state.lock().snapshot()
    }

    /// Samples produced so far.
    pub fn history(&self) -> Vec<TickSample> {
        self.state.lock().simulator.history().to_vec()
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Change the learning rate of the running simulator.
    pub fn set_learning_rate(&self, learning_rate: f64) -> SceneResult<()> {
        self.state.lock().simulator.set_learning_rate(learning_rate)
    }

    /// Change the speed multiplier.
    ///
    /// A running ticker is cancelled and replaced by one at the new interval
    /// over the same simulator and cursor. A stopped loop stays stopped.
    /// An invalid speed leaves the loop untouched.
    pub fn set_speed(&mut self, speed: f64) -> SceneResult<()> {
        let interval = interval_for(self.base_interval, speed)?;
        self.speed = speed;
        if !self.ticker.is_running() {
            return Ok(());
        }
        self.ticker.cancel();
        self.ticker = spawn_ticker(
            &self.state,
            &self.observer,
            self.phase_step,
            self.base_interval,
            speed,
        )?;
        debug!(speed, ?interval, "training speed changed");
        Ok(())
    }

    /// Stop ticking; synchronous and idempotent.
    pub fn cancel(&mut self) {
        self.ticker.cancel();
    }

    /// Block until the simulator finishes.
    pub fn wait(&mut self) {
        self.ticker.wait();
    }
}

impl fmt::Debug for TrainingLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingLoop")
            .field("state", &self.state)
            .field("phase_step", &self.phase_step)
            .field("speed", &self.speed)
            .field("ticker", &self.ticker)
            .finish_non_exhaustive()
    }
}

fn spawn_ticker(
    state: &Arc<Mutex<LoopState>>,
    observer: &Arc<Mutex<Observer>>,
    phase_step: f64,
    base_interval: Duration,
    speed: f64,
) -> SceneResult<PeriodicTicker> {
    let state = Arc::clone(state);
    let observer = Arc::clone(observer);
    PeriodicTicker::start(base_interval, speed, move || {
        let snapshot = {
            let mut state = state.lock();
            if state.simulator.step().is_none() {
                return TickControl::Stop;
            }
            state.cursor.advance(phase_step);
            state.snapshot()
        };
        (&mut *observer.lock())(snapshot);
        if snapshot.finished {
            TickControl::Stop
        } else {
            TickControl::Continue
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_runs_to_epoch_limit() {
        let simulator = TrainingSimulator::new(0.001, Some(8.0))
            .unwrap()
            .with_max_epochs(6);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut training = TrainingLoop::start(
            simulator,
            3,
            0.5,
            Duration::from_millis(1),
            1.0,
            move |s| sink.lock().push(s),
        )
        .unwrap();
        training.wait();

        let snapshot = training.snapshot();
        assert_eq!(snapshot.epoch, 6);
        assert!(snapshot.finished);
        assert!((snapshot.progress - 3.0).abs() < 1e-12);
        assert_eq!(snapshot.phase, TrainingPhase::Backward);
        assert_eq!(seen.lock().len(), 6);
        assert_eq!(training.history().len(), 6);
    }

    #[test]
    fn test_loop_cancel() {
        let simulator = TrainingSimulator::new(0.0001, None).unwrap();
        let mut training =
            TrainingLoop::start(simulator, 4, 0.25, Duration::from_millis(1), 2.0, |_| {}).unwrap();
        training.cancel();
        let epoch = training.snapshot().epoch;
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(training.snapshot().epoch, epoch);
        assert!(!training.is_running());
        assert!(training.set_learning_rate(-1.0).is_err());
    }

    fn wait_for_epoch(training: &TrainingLoop, epoch: u64) {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while training.snapshot().epoch < epoch && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_set_speed_keeps_progress() {
        let simulator = TrainingSimulator::new(0.001, Some(3.0))
            .unwrap()
            .with_max_epochs(30);
        let seen = Arc::new(Mutex::new(0u64));
        let sink = Arc::clone(&seen);
        let mut training = TrainingLoop::start(
            simulator,
            4,
            0.5,
            Duration::from_millis(4),
            2.0,
            move |_| *sink.lock() += 1,
        )
        .unwrap();

        wait_for_epoch(&training, 3);
        let before = training.history();
        assert!(before.len() >= 3);

        training.set_speed(4.0).unwrap();
        assert_eq!(training.speed(), 4.0);
        assert!(training.snapshot().epoch >= before.len() as u64);
        training.wait();

        let snapshot = training.snapshot();
        let history = training.history();
        assert_eq!(snapshot.epoch, 30);
        assert!(snapshot.finished);
        assert_eq!(history.len(), 30);
        assert_eq!(&history[..before.len()], &before[..]);
        // 30 steps of 0.5 wrap once around a 10-unit cycle.
        assert!((snapshot.progress - 5.0).abs() < 1e-9);
        assert_eq!(*seen.lock(), 30);
    }

    #[test]
    fn test_set_speed_shortens_interval() {
        let simulator = TrainingSimulator::new(0.001, None).unwrap().with_max_epochs(5);
        let mut training =
            TrainingLoop::start(simulator, 2, 0.5, Duration::from_secs(60), 1.0, |_| {}).unwrap();
        assert_eq!(training.snapshot().epoch, 0);

        training.set_speed(60_000.0).unwrap();
        training.wait();
        assert_eq!(training.snapshot().epoch, 5);
    }

    #[test]
    fn test_set_speed_rejects_invalid() {
        let simulator = TrainingSimulator::new(0.01, None).unwrap();
        let mut training =
            TrainingLoop::start(simulator, 2, 0.5, Duration::from_secs(60), 1.0, |_| {}).unwrap();
        assert!(training.set_speed(0.0).is_err());
        assert!(training.set_speed(f64::NAN).is_err());
        assert_eq!(training.speed(), 1.0);
        assert!(training.is_running());

        training.cancel();
        training.set_speed(2.0).unwrap();
        assert!(!training.is_running());
    }
}
