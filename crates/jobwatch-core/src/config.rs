//! Configuration.
//!
//! Defaults are usable as-is. `JobwatchConfig::from_env` overlays
//! `JOBWATCH_*` environment variables:
//!
//! | variable                        | field                          |
//! |---------------------------------|--------------------------------|
//! | `JOBWATCH_HOST`                 | `host`                         |
//! | `JOBWATCH_DEAD_AFTER_SECS`      | `reaper.dead_after_secs`       |
//! | `JOBWATCH_SWEEP_INTERVAL_SECS`  | `reaper.sweep_interval_secs`   |
//! | `JOBWATCH_SWEEP_BATCH_LIMIT`    | `reaper.batch_limit`           |
//! | `JOBWATCH_STORE_TIMEOUT_MS`     | both `store_timeout_ms` fields |
//! | `JOBWATCH_MAX_WRITE_ATTEMPTS`   | `heartbeat.max_write_attempts` |

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A configuration value that could not be parsed or is out of range.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Top-level configuration. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobwatchConfig {
    /// Recorded on every job launched by this process.
    pub host: String,
    pub reaper: ReaperConfig,
    pub heartbeat: HeartbeatConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaperConfig {
    /// Seconds without a heartbeat after which a running job is dead.
    pub dead_after_secs: u64,

    /// Period of `ReaperLoop`.
    pub sweep_interval_secs: u64,

    /// Max candidates evaluated per sweep (stalest first). `None` = all.
    pub batch_limit: Option<usize>,

    /// Deadline for each store call made by a sweep.
    pub store_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Read-modify-write rounds before giving up with `Contention`.
    pub max_write_attempts: u32,

    /// Deadline for each store call made by a heartbeat or finish.
    pub store_timeout_ms: Option<u64>,
}

impl Default for JobwatchConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            reaper: ReaperConfig::default(),
            heartbeat: HeartbeatConfig::default(),
        }
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            dead_after_secs: 20 * 60,
            sweep_interval_secs: 60,
            batch_limit: None,
            store_timeout_ms: None,
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: 3,
            store_timeout_ms: None,
        }
    }
}

impl ReaperConfig {
    /// `sweep_interval_secs` as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout_ms.map(Duration::from_millis)
    }
}

impl HeartbeatConfig {
    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout_ms.map(Duration::from_millis)
    }
}

impl JobwatchConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().overlay_env()
    }

    /// Defaults overlaid with whatever `lookup` returns per variable name.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().overlay(lookup)
    }

    /// `self` overlaid with the process environment.
    pub fn overlay_env(self) -> Result<Self, ConfigError> {
        self.overlay(|key| std::env::var(key).ok())
    }

    /// `self` with every `JOBWATCH_*` variable that `lookup` knows applied,
    /// then validated.
    ///
    /// # Example
    /// ```ignore
    /// let config = JobwatchConfig::default()
    ///     .overlay(|key| (key == "JOBWATCH_DEAD_AFTER_SECS").then(|| "60".to_string()))?;
    /// assert_eq!(config.reaper.dead_after_secs, 60);
    /// ```
    pub fn overlay<F>(self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self;

        if let Some(host) = lookup("JOBWATCH_HOST") {
            config.host = host;
        }
        if let Some(secs) = parse(&lookup, "JOBWATCH_DEAD_AFTER_SECS")? {
            config.reaper.dead_after_secs = secs;
        }
        if let Some(secs) = parse(&lookup, "JOBWATCH_SWEEP_INTERVAL_SECS")? {
            config.reaper.sweep_interval_secs = secs;
        }
        if let Some(limit) = parse(&lookup, "JOBWATCH_SWEEP_BATCH_LIMIT")? {
            config.reaper.batch_limit = Some(limit);
        }
        if let Some(ms) = parse(&lookup, "JOBWATCH_STORE_TIMEOUT_MS")? {
            config.reaper.store_timeout_ms = Some(ms);
            config.heartbeat.store_timeout_ms = Some(ms);
        }
        if let Some(attempts) = parse(&lookup, "JOBWATCH_MAX_WRITE_ATTEMPTS")? {
            config.heartbeat.max_write_attempts = attempts;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject zero intervals, zero batch limits and zero write attempts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reaper.sweep_interval_secs == 0 {
            return Err(invalid("JOBWATCH_SWEEP_INTERVAL_SECS", "0", "must be positive"));
        }
        if self.reaper.batch_limit == Some(0) {
            return Err(invalid("JOBWATCH_SWEEP_BATCH_LIMIT", "0", "must be positive"));
        }
        if self.heartbeat.max_write_attempts == 0 {
            return Err(invalid("JOBWATCH_MAX_WRITE_ATTEMPTS", "0", "must be positive"));
        }
        Ok(())
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| invalid(key, &raw, &e.to_string()))
        })
        .transpose()
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn default_host() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = JobwatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reaper.dead_after_secs, 1200);
        assert_eq!(config.heartbeat.max_write_attempts, 3);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = JobwatchConfig::from_lookup(lookup(&[
            ("JOBWATCH_HOST", "worker-7"),
            ("JOBWATCH_DEAD_AFTER_SECS", "60"),
            ("JOBWATCH_SWEEP_BATCH_LIMIT", "500"),
            ("JOBWATCH_STORE_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.host, "worker-7");
        assert_eq!(config.reaper.dead_after_secs, 60);
        assert_eq!(config.reaper.batch_limit, Some(500));
        assert_eq!(config.reaper.store_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.heartbeat.store_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn overlay_keeps_base_values_not_in_environment() {
        let base = JobwatchConfig {
            reaper: ReaperConfig {
                dead_after_secs: 3,
                sweep_interval_secs: 1,
                ..ReaperConfig::default()
            },
            ..JobwatchConfig::default()
        };

        let config = base
            .overlay(lookup(&[("JOBWATCH_SWEEP_INTERVAL_SECS", "5")]))
            .unwrap();

        assert_eq!(config.reaper.dead_after_secs, 3);
        assert_eq!(config.reaper.sweep_interval_secs, 5);
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err = JobwatchConfig::from_lookup(lookup(&[("JOBWATCH_DEAD_AFTER_SECS", "-5")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "JOBWATCH_DEAD_AFTER_SECS", .. }));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = JobwatchConfig::from_lookup(lookup(&[("JOBWATCH_SWEEP_INTERVAL_SECS", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: JobwatchConfig =
            serde_json::from_str(r#"{"reaper": {"dead_after_secs": 90}}"#).unwrap();
        assert_eq!(config.reaper.dead_after_secs, 90);
        assert_eq!(config.reaper.sweep_interval_secs, 60);
    }
}
