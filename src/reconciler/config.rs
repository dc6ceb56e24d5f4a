use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What to do with local state when a remote mutation finally fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Leave the optimistic state in place. Local and remote may diverge
    /// until the next bulk fetch.
    #[default]
    KeepOptimistic,
    /// Restore the pre-toggle state, unless a later toggle has superseded it.
    Rollback,
}

impl std::str::FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep_optimistic" | "keep" => Ok(FailurePolicy::KeepOptimistic),
            "rollback" => Ok(FailurePolicy::Rollback),
            _ => Err(ConfigError::Invalid {
                key: "failure_policy",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid reconciler config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Reconciler settings.
///
/// The defaults reproduce plain fire-and-forget behaviour: one attempt, no
/// timeout, no rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub failure_policy: FailurePolicy,
    /// Total attempts per remote mutation, including the first.
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    /// Per-attempt timeout; `None` waits indefinitely.
    pub remote_timeout_ms: Option<u64>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::KeepOptimistic,
            max_attempts: 1,
            retry_delay_ms: 250,
            remote_timeout_ms: None,
        }
    }
}

impl ReconcilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the maximum number of attempts. Zero is treated as one.
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max.max(1);
        self
    }

    /// Set the delay between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn remote_timeout(&self) -> Option<Duration> {
        self.remote_timeout_ms.map(Duration::from_millis)
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Load from `RECONCILER_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = var("RECONCILER_FAILURE_POLICY") {
            config.failure_policy = value.parse()?;
        }
        if let Some(value) = var("RECONCILER_MAX_ATTEMPTS") {
            config.max_attempts = parse(&value, "max_attempts")?;
        }
        if let Some(value) = var("RECONCILER_RETRY_DELAY_MS") {
            config.retry_delay_ms = parse(&value, "retry_delay_ms")?;
        }
        if let Some(value) = var("RECONCILER_REMOTE_TIMEOUT_MS") {
            config.remote_timeout_ms = Some(parse(&value, "remote_timeout_ms")?);
        }

        Ok(config)
    }
}

fn var(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) => {
            info!("{key} set to {value}");
            Some(value)
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("Ignoring {key}: {err}");
            None
        }
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &'static str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| {
        warn!("Invalid {key} value: {value}");
        ConfigError::Invalid {
            key,
            value: value.to_string(),
        }
    })
}
