//! One-shot millisecond timers driven by the external tick

use serde::{Deserialize, Serialize};

/// A one-shot countdown timer. Callers restart it after it fires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    interval_ms: f64,
    remaining_ms: f64,
    running: bool,
}

impl Timer {
    pub fn new() -> Self {
        Timer::default()
    }

    /// Start (or restart) counting down from `interval_ms`
    pub fn start(&mut self, interval_ms: f64) {
        self.interval_ms = interval_ms;
        self.remaining_ms = interval_ms;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.remaining_ms = 0.0;
    }

    /// Advance by `delta_ms`. Returns true exactly once, on the tick where
    /// the countdown elapses; the timer stops itself.
    pub fn tick(&mut self, delta_ms: f64) -> bool {
        if !self.running {
            return false;
        }
        self.remaining_ms -= delta_ms;
        if self.remaining_ms <= 0.0 {
            self.running = false;
            self.remaining_ms = 0.0;
            true
        } else {
            false
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn remaining_ms(&self) -> f64 {
        self.remaining_ms
    }

    /// Restore a persisted timer state
    pub fn restore(interval_ms: f64, remaining_ms: f64, running: bool) -> Self {
        Timer {
            interval_ms,
            remaining_ms,
            running,
        }
    }
}
