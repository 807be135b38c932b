//! Submission outcome counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

#[derive(Clone)]
pub struct SubmissionMetrics {
    pub delivered: Arc<AtomicU64>,
    pub fallback: Arc<AtomicU64>,
    pub invalid: Arc<AtomicU64>,
    pub rate_limited: Arc<AtomicU64>,
    pub failed: Arc<AtomicU64>,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_attempts: u64,
    pub delivered: u64,
    pub fallback: u64,
    pub invalid: u64,
    pub rate_limited: u64,
    pub failed: u64,
    pub fallback_rate: f64,
    pub uptime_seconds: i64,
}

impl SubmissionMetrics {
    pub fn new() -> Self {
        Self {
            delivered: Arc::new(AtomicU64::new(0)),
            fallback: Arc::new(AtomicU64::new(0)),
            invalid: Arc::new(AtomicU64::new(0)),
            rate_limited: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
            start_time: Utc::now(),
        }
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallback.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid(&self) {
        self.invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        let delivered = self.delivered.load(Ordering::Relaxed);
        let fallback = self.fallback.load(Ordering::Relaxed);
        let invalid = self.invalid.load(Ordering::Relaxed);
        let rate_limited = self.rate_limited.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);

        let reached_delivery = delivered + fallback + failed;
        let fallback_rate = if reached_delivery > 0 {
            (fallback + failed) as f64 / reached_delivery as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            total_attempts: reached_delivery + invalid + rate_limited,
            delivered,
            fallback,
            invalid,
            rate_limited,
            failed,
            fallback_rate,
            uptime_seconds: Utc::now().signed_duration_since(self.start_time).num_seconds(),
        }
    }
}

impl Default for SubmissionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
