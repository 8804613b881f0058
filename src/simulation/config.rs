//! Simulation configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tracker::ConflictPolicy;

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Behaviour when a configuration is inside several states
    pub conflict_policy: ConflictPolicy,
    /// Classification cache entries; 0 disables the cache
    pub cache_capacity: usize,
    /// Log progress every this many steps; 0 disables progress logging
    pub progress_interval: u64,
    /// Stop a single `run` call after this much wall-clock time
    pub max_wall_time_secs: Option<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            conflict_policy: ConflictPolicy::Fail,
            cache_capacity: 0,
            progress_interval: 0,
            max_wall_time_secs: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_progress_interval(mut self, steps: u64) -> Self {
        self.progress_interval = steps;
        self
    }

    pub fn with_max_wall_time(mut self, limit: Duration) -> Self {
        self.max_wall_time_secs = Some(limit.as_secs_f64());
        self
    }

    /// Wall-clock budget per `run` call
    ///
    /// `None` when unset or not representable; `validate` rejects the latter.
    pub fn max_wall_time(&self) -> Option<Duration> {
        self.max_wall_time_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(secs) = self.max_wall_time_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "max_wall_time_secs must be positive and finite, got {}",
                    secs
                )));
            }
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(Error::InvalidConfig(format!(
                    "max_wall_time_secs {} does not fit a duration",
                    secs
                )));
            }
        }
        Ok(())
    }
}
