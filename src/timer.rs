//! Scoped wall-clock measurement for crypto operations.
//!
//! Failure timing is telemetry too: the engine reads `elapsed_ms` after the
//! wrapped call regardless of its outcome, so every invocation gets exactly
//! one measurement.

#![forbid(unsafe_code)]

use std::time::Instant;

/// Wall-clock timer with sub-millisecond internal resolution, reported
/// rounded to two decimal milliseconds.
#[derive(Clone, Copy, Debug)]
pub struct OperationTimer {
    start: Instant,
}

impl OperationTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    /// Milliseconds since `start`, rounded to two decimals. Never negative.
    pub fn elapsed_ms(&self) -> f64 {
        let ms = self.start.elapsed().as_secs_f64() * 1000.0;
        (ms * 100.0).round() / 100.0
    }
}
