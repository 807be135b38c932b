//! Fixed-window submission rate limiting
//!
//! One record is kept per store key: an attempt counter and the time of the
//! first attempt in the current window. Once the window has elapsed the next
//! attempt starts a fresh window, so up to `2 * MAX_ATTEMPTS` attempts can
//! land in quick succession around a window boundary.

use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const RATE_LIMIT_STORAGE_KEY: &str = "contact_form_submissions";
pub const MAX_ATTEMPTS: u32 = 3;
pub const WINDOW: Duration = Duration::from_secs(5 * 60);

pub const RATE_LIMIT_MESSAGE: &str =
    "Too many submission attempts. Please wait a few minutes before trying again.";

/// Milliseconds since the Unix epoch.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRecord {
    pub attempts: u32,
    pub first_attempt: i64,
}

const WINDOW_MILLIS: i64 = WINDOW.as_millis() as i64;

impl RateLimitRecord {
    fn started_at(now: i64) -> Self {
        Self {
            attempts: 1,
            first_attempt: now,
        }
    }

    /// A timestamp too far from `now` to subtract counts as expired, so the
    /// record is replaced like a corrupt one.
    fn window_expired(&self, now: i64) -> bool {
        now.checked_sub(self.first_attempt)
            .map_or(true, |elapsed| elapsed > WINDOW_MILLIS)
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    key: String,
    clock: Clock,
}

fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, RATE_LIMIT_STORAGE_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            clock: system_clock(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Counts an attempt at the current time and reports whether it may proceed.
    pub fn check(&self) -> bool {
        self.check_at((self.clock)())
    }

    /// The read-modify-write runs as one store update, so limiters sharing
    /// a store and key never over-admit.
    pub fn check_at(&self, now: i64) -> bool {
        let mut allowed = true;
        let mut opened_window = false;

        let outcome = self.store.update(&self.key, &mut |current| {
            let next = match current.and_then(|raw| self.decode(raw)) {
                None => {
                    opened_window = true;
                    RateLimitRecord::started_at(now)
                }
                Some(record) if record.window_expired(now) => {
                    debug!(key = %self.key, "rate limit window expired, starting a new one");
                    opened_window = true;
                    RateLimitRecord::started_at(now)
                }
                Some(record) if record.attempts >= MAX_ATTEMPTS => {
                    warn!(key = %self.key, attempts = record.attempts, "submission refused by rate limiter");
                    allowed = false;
                    return None;
                }
                Some(record) => RateLimitRecord {
                    attempts: record.attempts + 1,
                    ..record
                },
            };

            match serde_json::to_string(&next) {
                Ok(serialized) => Some(serialized),
                Err(err) => {
                    warn!(key = %self.key, error = %err, "failed to encode rate limit record");
                    None
                }
            }
        });

        if let Err(err) = outcome {
            warn!(key = %self.key, error = %err, "failed to update rate limit record");
            return true;
        }

        if opened_window {
            self.prune_expired_at(now);
        }

        allowed
    }

    /// Removes every rate-limit record whose window closed before `now`.
    /// Entries outside the `contact_form_submissions` key space are kept.
    pub fn prune_expired_at(&self, now: i64) -> usize {
        let pruned = self.store.retain(&mut |key, value| {
            if !key.starts_with(RATE_LIMIT_STORAGE_KEY) {
                return true;
            }
            match serde_json::from_str::<RateLimitRecord>(value) {
                Ok(record) => !record.window_expired(now),
                Err(_) => false,
            }
        });

        match pruned {
            Ok(removed) => {
                if removed > 0 {
                    debug!(removed, "pruned expired rate limit records");
                }
                removed
            }
            Err(err) => {
                warn!(error = %err, "failed to prune rate limit records");
                0
            }
        }
    }

    /// The stored record, if any. An unreadable record counts as absent.
    pub fn record(&self) -> Option<RateLimitRecord> {
        let raw = match self.store.get(&self.key) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read rate limit record");
                return None;
            }
        };

        self.decode(&raw)
    }

    fn decode(&self, raw: &str) -> Option<RateLimitRecord> {
        match serde_json::from_str(raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(key = %self.key, error = %err, "discarding malformed rate limit record");
                None
            }
        }
    }

    /// Time left until the current window closes, if attempts are exhausted.
    pub fn retry_after_at(&self, now: i64) -> Option<Duration> {
        let record = self.record()?;
        if record.window_expired(now) || record.attempts < MAX_ATTEMPTS {
            return None;
        }

        let window_end = record.first_attempt.checked_add(WINDOW_MILLIS)?;
        let remaining = window_end.saturating_sub(now).max(0) as u64;
        Some(Duration::from_millis(remaining))
    }

    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after_at((self.clock)())
    }
}
