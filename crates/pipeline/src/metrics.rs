//! Pipeline metrics
//!
//! Coarse per-pipeline counters, shared behind an `Arc` with every
//! node that touches events. Observation is a relaxed atomic bump;
//! emission (reporters, exporters) lives outside the core.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one running pipeline
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Events merged from all inputs
    ingested: AtomicU64,

    /// Events fanned out towards outputs
    delivered: AtomicU64,

    /// Events rejected by filter chains and completed early
    rejected: AtomicU64,

    /// Events dropped because a downstream channel closed mid-send
    lost: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_ingested(&self) {
        self.ingested.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_lost(&self) {
        self.lost.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ingested: self.ingested.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of pipeline counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub ingested: u64,
    pub delivered: u64,
    pub rejected: u64,
    pub lost: u64,
}
