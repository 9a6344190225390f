// Constants for the retry loops
use std::time::Duration;

/// Generic loop: retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Generic loop: delay before the first retry
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(200);

/// Generic loop: delay cap before jitter
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Generic loop: additive jitter is drawn from `[0, bound)`
pub const DEFAULT_JITTER_BOUND: Duration = Duration::from_millis(500);

/// Delete loop: retries after the first attempt
pub const DELETE_MAX_RETRIES: u32 = 8;

/// Delete loop: delay before the first retry
pub const DELETE_BASE_DELAY: Duration = Duration::from_millis(500);

/// Delete loop: delay cap before jitter
pub const DELETE_MAX_DELAY: Duration = Duration::from_secs(5);

/// Delete loop: delays vary by up to ±20%
pub const DELETE_JITTER_FACTOR: f64 = 0.2;

/// Consistency poll: probes per call unless overridden
pub const CONSISTENCY_MAX_ATTEMPTS: u32 = 3;

/// Consistency poll: delay before the second probe
pub const CONSISTENCY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Consistency poll: growth per probe
pub const CONSISTENCY_GROWTH: f64 = 1.5;

/// Consistency poll: jitter adds up to this share of the delay
pub const CONSISTENCY_JITTER_FACTOR: f64 = 0.5;
