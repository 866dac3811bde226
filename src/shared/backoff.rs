//! Reconnect Backoff Policy
//!
//! Bounded exponential backoff shared by the relay's broker subscription loop
//! and the reconnecting client.
//!
//! ```text
//! Attempt    Delay (initial=500ms, x2, cap=30s)
//! ─────────────────────────────────────────────
//!    0          500ms
//!    1            1s
//!    2            2s
//!    3            4s
//!   ...
//!   >=6          30s  (capped)
//! ```
//!
//! A jitter factor spreads reconnects of many relay instances so they do not
//! hit a recovering broker in lockstep.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::shared::config::ConfigError;

const DEFAULT_INITIAL_DELAY_MS: u64 = 500;
const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
const DEFAULT_MULTIPLIER: f64 = 2.0;
const DEFAULT_JITTER_FACTOR: f64 = 0.1;

/// Exponential backoff configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay, in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Growth factor per attempt
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Jitter factor (0.0-1.0); 0.1 means ±10%
    #[serde(default = "default_jitter")]
    pub jitter_factor: f64,
}

fn default_initial_delay() -> u64 {
    DEFAULT_INITIAL_DELAY_MS
}

fn default_max_delay() -> u64 {
    DEFAULT_MAX_DELAY_MS
}

fn default_multiplier() -> f64 {
    DEFAULT_MULTIPLIER
}

fn default_jitter() -> f64 {
    DEFAULT_JITTER_FACTOR
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            multiplier: DEFAULT_MULTIPLIER,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl BackoffConfig {
    /// Short delays without jitter, for tests
    pub fn immediate() -> Self {
        Self {
            initial_delay_ms: 10,
            max_delay_ms: 50,
            multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }

    /// Reject policies that would retry without pausing or cannot be sampled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_delay_ms == 0 {
            return Err(invalid("reconnect.initial_delay_ms", "must be greater than zero"));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(invalid(
                "reconnect.max_delay_ms",
                "must not be below initial_delay_ms",
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(invalid("reconnect.multiplier", "must be a finite number >= 1.0"));
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(invalid("reconnect.jitter_factor", "must be between 0.0 and 1.0"));
        }
        Ok(())
    }

    /// Delay before retry number `attempt` (0-based), without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(32) as i32;
        let raw = self.initial_delay_ms as f64 * self.multiplier.max(1.0).powi(exponent);
        let capped = raw.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay before retry number `attempt`, with jitter applied
    ///
    /// The result never exceeds `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if !self.jitter_factor.is_finite() {
            return base;
        }
        let jitter = self.jitter_factor.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return base;
        }

        let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
        let jittered = (base.as_millis() as f64 * factor).min(self.max_delay_ms as f64);
        Duration::from_millis(jittered as u64)
    }
}

fn invalid(key: &'static str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        message: message.to_string(),
    }
}
