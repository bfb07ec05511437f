//! Failure and backoff tracking for the dispatch layer

use chaff_domain::constants::{
    BACKOFF_DECAY_FACTOR, BACKOFF_FAILURE_CAP, BACKOFF_FAILURE_FACTOR, BACKOFF_FLOOR,
    BACKOFF_RATE_LIMIT_CAP, BACKOFF_RATE_LIMIT_FACTOR, FAILURE_ESCALATION_THRESHOLD,
    FAILURE_WINDOW_MS, PAUSE_FAILURE_THRESHOLD,
};
use chaff_domain::DispatchStats;
use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// Rolling failure state for outbound dispatch.
///
/// The backoff multiplier stretches pacing delays after failures and decays
/// back toward 1.0 on success. It never leaves `[1, 8]`.
#[derive(Debug, Clone)]
pub struct FailureTracker {
    failure_count: u32,
    last_failure_time: Option<DateTime<Utc>>,
    backoff_multiplier: f64,
}

impl Default for FailureTracker {
    fn default() -> Self {
        Self { failure_count: 0, last_failure_time: None, backoff_multiplier: BACKOFF_FLOOR }
    }
}

impl FailureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A 429 from the remote: double the backoff, capped hard.
    pub fn record_rate_limit(&mut self, now: DateTime<Utc>) {
        self.backoff_multiplier =
            (self.backoff_multiplier * BACKOFF_RATE_LIMIT_FACTOR).min(BACKOFF_RATE_LIMIT_CAP);
        self.failure_count += 1;
        self.last_failure_time = Some(now);
    }

    /// Any other failed dispatch. Backoff only escalates once failures
    /// accumulate past the threshold, and to a lower cap than rate limits.
    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.failure_count += 1;
        self.last_failure_time = Some(now);

        if self.failure_count > FAILURE_ESCALATION_THRESHOLD {
            self.backoff_multiplier =
                (self.backoff_multiplier * BACKOFF_FAILURE_FACTOR).min(BACKOFF_FAILURE_CAP);
        }
    }

    /// A successful dispatch: decay the backoff toward its floor, and forget
    /// the failure count once the last failure has aged out.
    pub fn record_success(&mut self, now: DateTime<Utc>) {
        if self.backoff_multiplier > BACKOFF_FLOOR {
            self.backoff_multiplier =
                (self.backoff_multiplier * BACKOFF_DECAY_FACTOR).max(BACKOFF_FLOOR);
        }

        if let Some(last) = self.last_failure_time {
            if now - last > ChronoDuration::milliseconds(FAILURE_WINDOW_MS) {
                self.failure_count = 0;
            }
        }
    }

    /// Whether dispatch has failed hard enough to pause the engine:
    /// more than the threshold of failures, the latest within the hour.
    pub fn should_pause(&self, now: DateTime<Utc>) -> bool {
        self.failure_count > PAUSE_FAILURE_THRESHOLD
            && self.last_failure_time.map_or(false, |last| {
                now - last < ChronoDuration::milliseconds(FAILURE_WINDOW_MS)
            })
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            failure_count: self.failure_count,
            backoff_multiplier: self.backoff_multiplier,
            last_failure_time: self.last_failure_time,
        }
    }
}
