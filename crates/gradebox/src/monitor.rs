//! Resource accounting around a single invocation
//!
//! The driver inside the child samples a monotonic clock and the process's
//! peak resident set size immediately before and after the call. Peak RSS is
//! monotonic non-decreasing for the lifetime of a process, so the delta is an
//! approximation of what the call itself allocated: zero or negative values
//! are valid readings, not errors. Because every invocation gets a fresh
//! process, the baseline never carries over from a previous case.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// One reading taken inside the child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSample {
    /// Monotonic clock reading in nanoseconds
    pub monotonic_ns: u64,

    /// Peak resident set size so far in kilobytes
    pub peak_rss_kb: u64,
}

/// Time and memory attributed to one invocation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceUsage {
    /// Elapsed time in milliseconds
    pub time_ms: f64,

    /// Peak RSS delta in megabytes
    pub memory_mb: f64,
}

impl ResourceUsage {
    /// Usage between two samples taken around the call
    pub fn between(before: &ResourceSample, after: &ResourceSample) -> Self {
        let elapsed_ns = after.monotonic_ns.saturating_sub(before.monotonic_ns);
        let delta_kb = after.peak_rss_kb as f64 - before.peak_rss_kb as f64;
        Self {
            time_ms: elapsed_ns as f64 / 1_000_000.0,
            memory_mb: delta_kb / 1024.0,
        }
    }

    /// Usage known only from the host's wall clock (crash, timeout)
    pub fn wall_clock(elapsed: Duration) -> Self {
        Self {
            time_ms: elapsed.as_secs_f64() * 1000.0,
            memory_mb: 0.0,
        }
    }

    /// Whether the memory delta is above `limit_mb`
    #[must_use]
    pub fn exceeds_memory(&self, limit_mb: f64) -> bool {
        self.memory_mb > limit_mb
    }
}

/// Host-side monotonic stopwatch
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
