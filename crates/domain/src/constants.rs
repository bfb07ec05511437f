//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application. Timing values are in milliseconds unless the name says
//! otherwise.

// Pacing
pub const RATE_WINDOW_MS: i64 = 3_600_000;
pub const MIN_QUERY_GAP_MS: f64 = 60_000.0;
pub const WITHIN_SESSION_MEAN_MS: f64 = 180_000.0;
pub const WITHIN_SESSION_JITTER_SD_MS: f64 = 30_000.0;
pub const SESSION_GAP_SCALE_MS: f64 = 1_800_000.0;
pub const SESSION_LENGTH_MEAN: f64 = 4.0;
pub const SESSION_LENGTH_SD: f64 = 2.0;
pub const SESSION_LENGTH_MIN: u32 = 2;
pub const SESSION_LENGTH_MAX: u32 = 8;
pub const CUSTOM_RATE_MIN: u32 = 1;
pub const CUSTOM_RATE_MAX: u32 = 30;
pub const REFERENCE_RATE_PER_HOUR: f64 = 12.0;

// Behavioral probabilities
pub const TYPO_PROBABILITY: f64 = 0.015;
pub const CLICK_PROBABILITY: f64 = 0.40;
pub const REFINE_PROBABILITY: f64 = 0.10;
pub const MIX_WHEN_ACTIVE_PROBABILITY: f64 = 0.70;
pub const MIX_WHEN_IDLE_PROBABILITY: f64 = 0.30;

// Dispatch failure handling
pub const BACKOFF_RATE_LIMIT_FACTOR: f64 = 2.0;
pub const BACKOFF_RATE_LIMIT_CAP: f64 = 8.0;
pub const BACKOFF_FAILURE_FACTOR: f64 = 1.5;
pub const BACKOFF_FAILURE_CAP: f64 = 4.0;
pub const BACKOFF_DECAY_FACTOR: f64 = 0.9;
pub const BACKOFF_FLOOR: f64 = 1.0;
pub const FAILURE_ESCALATION_THRESHOLD: u32 = 5;
pub const PAUSE_FAILURE_THRESHOLD: u32 = 10;
pub const FAILURE_WINDOW_MS: i64 = 3_600_000;

// Interaction timing
pub const THINK_TIME_MIN_MS: u64 = 2_000;
pub const THINK_TIME_MAX_MS: u64 = 8_000;
pub const REFINE_DELAY_MIN_MS: u64 = 2_000;
pub const REFINE_DELAY_MAX_MS: u64 = 5_000;

// Orchestration
pub const AUTO_RESUME_COOLDOWN_MS: i64 = 3_600_000;
pub const IDLE_THRESHOLD_SECS: u32 = 15;

// Result simulation
pub const RESULT_SLUG_MAX_LEN: usize = 50;
