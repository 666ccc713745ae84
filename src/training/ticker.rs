//! Cancellable periodic timer.
//!
//! A background thread fires a callback every `base_interval / speed`.
//! [`PeriodicTicker::cancel`] signals the thread and joins it, so once it
//! returns no further callback runs. Cancelling twice is a no-op, and
//! dropping the ticker cancels it.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{SceneError, SceneResult};

/// Returned by the tick callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// Tick period for a speed multiplier.
pub fn interval_for(base_interval: Duration, speed: f64) -> SceneResult<Duration> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(SceneError::InvalidSpeed(speed));
    }
    Duration::try_from_secs_f64(base_interval.as_secs_f64() / speed)
        .map_err(|_| SceneError::InvalidSpeed(speed))
}

/// Handle to a running timer thread.
#[derive(Debug)]
pub struct PeriodicTicker {
    interval: Duration,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTicker {
    /// Start firing `on_tick` every `base_interval / speed` until it returns
    /// [`TickControl::Stop`] or the ticker is cancelled.
    pub fn start<F>(base_interval: Duration, speed: f64, mut on_tick: F) -> SceneResult<Self>
    where
        F: FnMut() -> TickControl + Send + 'static,
    {
        let interval = interval_for(base_interval, speed)?;
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("neural-scene-ticker".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if on_tick() == TickControl::Stop {
                            break;
                        }
                    }
                    // Explicit stop or the ticker was dropped.
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        debug!(?interval, "ticker started");
        Ok(Self {
            interval,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True until the thread has exited.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the timer and wait for the thread. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        self.join();
    }

    /// Block until the callback stops the timer on its own.
    pub fn wait(&mut self) {
        self.join();
        self.stop_tx = None;
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("ticker thread panicked");
            } else {
                debug!("ticker stopped");
            }
        }
    }
}

impl Drop for PeriodicTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_interval_for_speed() {
        let base = Duration::from_millis(100);
        assert_eq!(interval_for(base, 2.0).unwrap(), Duration::from_millis(50));
        assert_eq!(interval_for(base, 0.5).unwrap(), Duration::from_millis(200));
        assert!(interval_for(base, 0.0).is_err());
        assert!(interval_for(base, f64::NAN).is_err());
        assert!(interval_for(base, -1.0).is_err());
    }

    #[test]
    fn test_stops_itself() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let mut ticker = PeriodicTicker::start(Duration::from_millis(1), 1.0, move || {
            if seen.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                TickControl::Stop
            } else {
                TickControl::Continue
            }
        })
        .unwrap();
        ticker.wait();
        assert!(!ticker.is_running());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cancel_is_synchronous_and_idempotent() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let mut ticker = PeriodicTicker::start(Duration::from_millis(1), 4.0, move || {
            seen.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        })
        .unwrap();
        thread::sleep(Duration::from_millis(10));
        ticker.cancel();
        let after_cancel = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(10));
        assert_eq!(count.load(Ordering::SeqCst), after_cancel);
        ticker.cancel();
        assert!(!ticker.is_running());
    }

    #[test]
    fn test_drop_cancels() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let ticker = PeriodicTicker::start(Duration::from_secs(60), 1.0, move || {
            seen.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        })
        .unwrap();
        drop(ticker);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
