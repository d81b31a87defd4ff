use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_tick_ms() -> u64 {
    1000
}

/// Pacing parameters for the batched dispatch loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Total number of calls to issue before stopping.
    pub total_calls: u64,
    /// Maximum calls dispatched within a single tick.
    pub max_per_tick: u32,
    /// Tick length in milliseconds. One second in production; tests shrink it.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl PacingConfig {
    pub fn new(total_calls: u64, max_per_tick: u32) -> Self {
        Self {
            total_calls,
            max_per_tick,
            tick_ms: default_tick_ms(),
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick_ms = tick.as_millis() as u64;
        self
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Reject zero budgets, zero ceilings and zero-length ticks up front.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_calls == 0 {
            return Err(ConfigError::InvalidValue {
                field: "total_calls".to_string(),
                reason: "must be a positive integer".to_string(),
            });
        }
        if self.max_per_tick == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_per_tick".to_string(),
                reason: "must be a positive integer".to_string(),
            });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tick_ms".to_string(),
                reason: "must be a positive number of milliseconds".to_string(),
            });
        }
        Ok(())
    }
}
