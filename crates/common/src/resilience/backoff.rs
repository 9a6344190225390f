//! Exponential backoff with pluggable jitter
//!
//! A [`Backoff`] computes the sleep before retry `k` (0-indexed) as
//! `min(base * factor^k, max)` and then applies its [`Jitter`]. The three
//! retry loops and the existence waiter each own one with different tuning.

use std::time::Duration;

use rand::Rng;

/// Maximum exponent for backoff calculation to prevent overflow
pub const MAX_BACKOFF_EXPONENT: u32 = 30;

/// How randomness is applied on top of the computed delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Jitter {
    /// Deterministic delays
    None,
    /// Add a uniform sample from `[0, bound)`
    Additive(Duration),
    /// Add a uniform sample from `[0, delay * factor]`
    Proportional(f64),
    /// Scale by a uniform sample from `[1 - factor, 1 + factor]`
    Symmetric(f64),
}

impl Jitter {
    fn apply(self, delay: Duration) -> Duration {
        let mut rng = rand::thread_rng();
        match self {
            Self::None => delay,
            Self::Additive(bound) => {
                let bound_millis = bound.as_millis() as u64;
                if bound_millis == 0 {
                    return delay;
                }
                delay + Duration::from_millis(rng.gen_range(0..bound_millis))
            }
            Self::Proportional(factor) => {
                let factor = factor.clamp(0.0, 1.0);
                if factor == 0.0 {
                    return delay;
                }
                let spread = delay.as_millis() as f64 * factor;
                let extra = rng.gen_range(0.0..=spread);
                delay + Duration::from_millis(extra as u64)
            }
            Self::Symmetric(factor) => {
                let factor = factor.clamp(0.0, 1.0);
                if factor == 0.0 {
                    return delay;
                }
                let delay_millis = delay.as_millis() as f64;
                let scale = rng.gen_range(1.0 - factor..=1.0 + factor);
                Duration::from_millis((delay_millis * scale).max(0.0) as u64)
            }
        }
    }

    /// Largest delay this jitter can produce for `delay`.
    pub fn upper_bound(self, delay: Duration) -> Duration {
        match self {
            Self::None => delay,
            Self::Additive(bound) => delay + bound,
            Self::Proportional(factor) => delay.mul_f64(1.0 + factor.clamp(0.0, 1.0)),
            Self::Symmetric(factor) => delay.mul_f64(1.0 + factor.clamp(0.0, 1.0)),
        }
    }
}

/// Exponential delay schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    base: Duration,
    factor: f64,
    max: Option<Duration>,
    jitter: Jitter,
}

impl Backoff {
    /// Doubling schedule starting at `base`, uncapped, no jitter.
    pub const fn new(base: Duration) -> Self {
        Self { base, factor: 2.0, max: None, jitter: Jitter::None }
    }

    /// Growth factor applied per attempt.
    pub const fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Upper bound on the pre-jitter delay.
    pub const fn with_max(mut self, max: Duration) -> Self {
        self.max = Some(max);
        self
    }

    /// Randomization added to each delay.
    pub const fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before the first retry.
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Cap, if any.
    pub fn max(&self) -> Option<Duration> {
        self.max
    }

    pub fn jitter(&self) -> Jitter {
        self.jitter
    }

    /// Delay before retry `attempt` without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(MAX_BACKOFF_EXPONENT);
        let base_millis = self.base.as_millis() as f64;
        let multiplier = self.factor.max(1.0).powi(exponent as i32);

        // f64 -> u64 casts saturate
        let mut delay = Duration::from_millis((base_millis * multiplier) as u64);
        if let Some(max) = self.max {
            delay = delay.min(max);
        }
        delay
    }

    /// Delay before retry `attempt` with jitter applied.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.jitter.apply(self.base_delay(attempt))
    }

    /// Largest delay [`Backoff::delay`] may return for `attempt`.
    pub fn max_delay(&self, attempt: u32) -> Duration {
        self.jitter.upper_bound(self.base_delay(attempt))
    }
}
