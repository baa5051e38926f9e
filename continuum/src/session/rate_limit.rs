//! Client-side sliding-window rate limiter.
//!
//! The limit is advisory: any storage failure degrades to "unlimited" rather
//! than blocking the user. Enforcement, if any, belongs on the server.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{MAX_REQUESTS, RATE_LIMIT_KEY, WINDOW_MS};
use crate::storage::KeyValueStore;

/// Source of the current time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub const fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Window length and quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window_ms: i64,
    pub max_requests: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window_ms: WINDOW_MS,
            max_requests: MAX_REQUESTS,
        }
    }
}

/// Persisted shape of the limiter state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRecord {
    /// Admission instants, oldest first.
    pub timestamps: Vec<i64>,
    pub window_ms: i64,
    pub max_requests: u32,
}

impl RateLimitRecord {
    /// Drop timestamps older than `now - window_ms`.
    fn prune(&mut self, now: i64, window_ms: i64) {
        let cutoff = now - window_ms;
        self.timestamps.retain(|&t| t >= cutoff);
    }
}

/// Counts admissions per trailing window, persisted through a [`KeyValueStore`].
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    /// Limiter with the default policy and the wall clock.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), RateLimitPolicy::default())
    }

    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        policy: RateLimitPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub const fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Admit one request if the window has room, recording it.
    ///
    /// Returns `false` without recording anything when the quota is used up.
    pub fn check_limit(&self) -> bool {
        let now = self.clock.now_ms();
        let mut record = self.load();
        record.prune(now, self.policy.window_ms);

        if record.timestamps.len() >= self.policy.max_requests as usize {
            debug!(count = record.timestamps.len(), "rate limit reached");
            return false;
        }

        record.timestamps.push(now);
        self.save(&record);
        true
    }

    /// Requests still available in the current window. Does not admit anything.
    pub fn remaining_requests(&self) -> u32 {
        let now = self.clock.now_ms();
        let mut record = self.load();
        record.prune(now, self.policy.window_ms);

        let used = u32::try_from(record.timestamps.len()).unwrap_or(u32::MAX);
        self.policy.max_requests.saturating_sub(used)
    }

    fn load(&self) -> RateLimitRecord {
        let raw = match self.store.get(RATE_LIMIT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.empty_record(),
            Err(e) => {
                warn!(error = %e, "could not read rate limit record, allowing request");
                return self.empty_record();
            }
        };

        match serde_json::from_str::<RateLimitRecord>(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "corrupt rate limit record, starting fresh");
                self.empty_record()
            }
        }
    }

    fn save(&self, record: &RateLimitRecord) {
        let record = RateLimitRecord {
            timestamps: record.timestamps.clone(),
            window_ms: self.policy.window_ms,
            max_requests: self.policy.max_requests,
        };
        let result = serde_json::to_string(&record)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.store
                    .set(RATE_LIMIT_KEY, &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            warn!(error = %e, "could not persist rate limit record");
        }
    }

    const fn empty_record(&self) -> RateLimitRecord {
        RateLimitRecord {
            timestamps: Vec::new(),
            window_ms: self.policy.window_ms,
            max_requests: self.policy.max_requests,
        }
    }
}
