//! Cooperative cancellation: a shared stop flag and a one-shot timer thread.
//!
//! The timer only ever flips the flag; it never touches search state. The
//! flag moves from false to true at most once per search, so relaxed loads
//! from the search thread are sufficient.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    #[inline]
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Raises a `StopHandle` once its budget elapses. Dropping the timer
/// cancels it without touching the flag.
#[derive(Debug)]
pub struct SearchTimer {
    cancel: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl SearchTimer {
    pub fn start(budget: Duration, stop: StopHandle) -> io::Result<Self> {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let worker = thread::Builder::new()
            .name("search-timer".to_owned())
            .spawn(move || match cancelled.recv_timeout(budget) {
                Err(RecvTimeoutError::Timeout) => {
                    trace!(
                        budget_ms = budget.as_millis() as u64,
                        "search budget elapsed"
                    );
                    stop.stop();
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
            })?;
        Ok(Self {
            cancel: Some(cancel),
            worker: Some(worker),
        })
    }
}

impl Drop for SearchTimer {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
