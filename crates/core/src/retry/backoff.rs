//! Backoff delay computation
//!
//! Pure functions of the attempt index, the base interval and a random
//! source. Tests inject a seeded RNG to make range draws reproducible.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Growth factor applied once per retry
pub const BACKOFF_MULTIPLIER: f64 = 1.5;

/// Base interval between retries, in milliseconds
///
/// Serialized as an integer (`5000`) or a two element array (`[500, 2000]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BaseInterval {
    /// Same base for every retry
    Fixed(u64),
    /// Uniform draw from `[low, high)` on every retry
    Range(u64, u64),
}

impl BaseInterval {
    /// Reject ranges that cannot be sampled
    pub fn validate(&self) -> Result<()> {
        if let BaseInterval::Range(low, high) = *self
            && low >= high
        {
            return Err(Error::Config(format!(
                "retry interval range [{low}, {high}] must satisfy low < high"
            )));
        }
        Ok(())
    }

    /// Draw the un-inflated base for one attempt
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<u64> {
        self.validate()?;
        Ok(match *self {
            BaseInterval::Fixed(ms) => ms,
            BaseInterval::Range(low, high) => rng.gen_range(low..high),
        })
    }
}

impl Default for BaseInterval {
    fn default() -> Self {
        BaseInterval::Fixed(5000)
    }
}

impl From<u64> for BaseInterval {
    fn from(ms: u64) -> Self {
        BaseInterval::Fixed(ms)
    }
}

/// Compute the delay before retry number `attempt_index` (0-based)
///
/// `delay = round(base * 1.5^attempt_index)`, so the first retry waits
/// exactly the base interval.
pub fn compute_delay<R: Rng + ?Sized>(
    attempt_index: u32,
    base: BaseInterval,
    rng: &mut R,
) -> Result<Duration> {
    let base_ms = base.sample(rng)?;
    Ok(Duration::from_millis(inflate(base_ms, attempt_index)))
}

fn inflate(base_ms: u64, attempt_index: u32) -> u64 {
    let exponent = i32::try_from(attempt_index).unwrap_or(i32::MAX);
    // f64 -> u64 casts saturate, so huge exponents clamp to u64::MAX
    (base_ms as f64 * BACKOFF_MULTIPLIER.powi(exponent)).round() as u64
}

/// Validated backoff configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: BaseInterval,
}

impl BackoffPolicy {
    pub fn new(base: BaseInterval) -> Result<Self> {
        base.validate()?;
        Ok(Self { base })
    }

    pub fn base(&self) -> BaseInterval {
        self.base
    }

    /// Delay for the given retry using the supplied random source
    pub fn delay_with<R: Rng + ?Sized>(&self, attempt_index: u32, rng: &mut R) -> Duration {
        let base_ms = match self.base {
            BaseInterval::Fixed(ms) => ms,
            BaseInterval::Range(low, high) => rng.gen_range(low..high),
        };
        Duration::from_millis(inflate(base_ms, attempt_index))
    }

    /// Delay for the given retry using the thread-local RNG
    pub fn delay(&self, attempt_index: u32) -> Duration {
        self.delay_with(attempt_index, &mut rand::thread_rng())
    }
}
