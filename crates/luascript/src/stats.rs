//! Per-call stats and process-wide counters.
//!
//! Each transpile call assembles a [`TranspileStats`] record (phase
//! timings, node counts, pipeline tag). Process-wide counters are plain
//! atomics behind a small facade; concurrent calls increment them with
//! relaxed ordering, and tests reset them through [`reset_counters`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Which pipeline produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pipeline {
    CanonicalIr,
    LegacyRewriter,
}

/// Microsecond timings of the phases that actually ran. Phases the
/// selected pipeline skips stay zero.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PhaseTimings {
    pub lex_us: u64,
    pub parse_us: u64,
    pub lower_us: u64,
    pub validate_us: u64,
    pub emit_us: u64,
    pub rewrite_us: u64,
    pub output_check_us: u64,
}

/// The stats record attached to every successful call.
#[derive(Debug, Clone, Serialize)]
pub struct TranspileStats {
    pub filename: Option<String>,
    pub pipeline: Pipeline,
    pub timings: PhaseTimings,
    /// IR node count; zero on the legacy path.
    pub node_count: usize,
    /// Local rewrites applied (numeric range loops recognized, switches
    /// desugared).
    pub optimizations_applied: u64,
    pub cache_hit: bool,
    pub total_us: u64,
}

pub(crate) fn as_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

// ── Process-wide counters ────────────────────────────────────────────

static TRANSPILATIONS: AtomicU64 = AtomicU64::new(0);
static TOTAL_TIME_US: AtomicU64 = AtomicU64::new(0);
static OPTIMIZATIONS: AtomicU64 = AtomicU64::new(0);
static CACHE_HITS: AtomicU64 = AtomicU64::new(0);

/// Snapshot of the process-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    pub transpilations_count: u64,
    pub total_time_us: u64,
    pub optimizations_applied: u64,
    pub cache_hits: u64,
}

pub(crate) fn record_call(duration: Duration, optimizations: u64, cache_hit: bool) {
    TRANSPILATIONS.fetch_add(1, Ordering::Relaxed);
    TOTAL_TIME_US.fetch_add(as_micros(duration), Ordering::Relaxed);
    OPTIMIZATIONS.fetch_add(optimizations, Ordering::Relaxed);
    if cache_hit {
        CACHE_HITS.fetch_add(1, Ordering::Relaxed);
    }
}

/// Read the process-wide counters.
pub fn counters() -> CountersSnapshot {
    CountersSnapshot {
        transpilations_count: TRANSPILATIONS.load(Ordering::Relaxed),
        total_time_us: TOTAL_TIME_US.load(Ordering::Relaxed),
        optimizations_applied: OPTIMIZATIONS.load(Ordering::Relaxed),
        cache_hits: CACHE_HITS.load(Ordering::Relaxed),
    }
}

/// Zero the process-wide counters. Intended for tests and teardown.
pub fn reset_counters() {
    TRANSPILATIONS.store(0, Ordering::Relaxed);
    TOTAL_TIME_US.store(0, Ordering::Relaxed);
    OPTIMIZATIONS.store(0, Ordering::Relaxed);
    CACHE_HITS.store(0, Ordering::Relaxed);
}
