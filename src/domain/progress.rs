//! Progress observer injected into preparation, candidate generation and
//! simulation. Observers only watch; nothing they do feeds back into results.

use log::{debug, info};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub trait ProgressObserver: Sync {
    fn on_progress(&self, _done: usize, _total: usize) {}
    fn on_log(&self, _message: &str) {}
}

/// Discards everything.
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Routes progress to the `log` facade.
pub struct LogObserver {
    label: String,
    started: Instant,
}

impl LogObserver {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: Instant::now(),
        }
    }
}

impl ProgressObserver for LogObserver {
    fn on_progress(&self, done: usize, total: usize) {
        debug!(
            "{}: {}",
            self.label,
            progress_message(done, total, self.started.elapsed())
        );
    }

    fn on_log(&self, message: &str) {
        info!("{}: {}", self.label, message);
    }
}

/// Keeps every call, for tests and for callers that render progress themselves.
#[derive(Default)]
pub struct RecordingObserver {
    pub progress: Mutex<Vec<(usize, usize)>>,
    pub messages: Mutex<Vec<String>>,
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, done: usize, total: usize) {
        if let Ok(mut p) = self.progress.lock() {
            p.push((done, total));
        }
    }

    fn on_log(&self, message: &str) {
        if let Ok(mut m) = self.messages.lock() {
            m.push(message.to_string());
        }
    }
}

/// "done/total, elapsed Xs, remaining ~Ys" with a linear estimate of the rest.
pub fn progress_message(done: usize, total: usize, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if done == 0 {
        return format!("{done}/{total}, elapsed {secs:.1}s");
    }
    let remaining = secs / done as f64 * total.saturating_sub(done) as f64;
    format!("{done}/{total}, elapsed {secs:.1}s, remaining ~{remaining:.1}s")
}

/// True when `done` completes a batch of `every` items or is the final item.
pub fn at_cadence(done: usize, total: usize, every: usize) -> bool {
    done == total || (every > 0 && done % every == 0)
}
