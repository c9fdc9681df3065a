// SPDX-License-Identifier: MIT

//! Bounded retry policy with exponential backoff

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Attempt bounds and backoff shared by the decision loop and the
/// service-failure retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Model calls allowed before giving up on a decision
    pub max_attempts: u32,
    /// Extra tries per attempt when the service call itself fails
    pub service_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            service_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// No delays; handy for tests and local mocks
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based): initial * multiplier^(retry-1), capped
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = (self.multiplier.max(1) as u64).saturating_pow(retry - 1);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Attempt bound, never below one
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}
