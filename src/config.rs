use crate::aggregator_core::DecayPolicy;
use std::{env, path::PathBuf, time::Duration};

/// Shortest allowed interval between two decay ticks
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct TopConfig {
    pub policy: DecayPolicy,
    /// Producer sleep when the source has nothing to hand out
    pub idle_backoff: Duration,
    /// Minimum interval between two decay ticks
    pub refresh_interval: Duration,
    /// How long one renderer cycle waits for a key
    pub input_timeout: Duration,
    pub log_dir: PathBuf,
    pub rust_log: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for TopConfig {
    fn default() -> Self {
        Self {
            policy: DecayPolicy::default(),
            idle_backoff: Duration::from_millis(50),
            refresh_interval: Duration::from_millis(1000),
            input_timeout: Duration::from_millis(1000),
            log_dir: PathBuf::from("/var/log/tagtop"),
            rust_log: None,
        }
    }
}

impl TopConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `TAGTOP_DECAY` (default: 0.999, range (0, 1])
    /// - `TAGTOP_EVICT_FACTOR` (default: 10, at least 1)
    /// - `TAGTOP_IDLE_BACKOFF_MS` (default: 50, above 0)
    /// - `TAGTOP_REFRESH_MS` (default: 1000, at least 1000)
    /// - `TAGTOP_INPUT_TIMEOUT_MS` (default: 1000, above 0)
    /// - `TAGTOP_LOG_DIR` (default: /var/log/tagtop)
    ///
    /// Values that do not parse fall back to the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let decay = parsed("TAGTOP_DECAY").unwrap_or(defaults.policy.decay);
        if !(decay > 0.0 && decay <= 1.0) {
            return Err(ConfigError::InvalidValue(format!(
                "TAGTOP_DECAY must be in (0, 1], got {}",
                decay
            )));
        }

        let evict_factor = parsed("TAGTOP_EVICT_FACTOR").unwrap_or(defaults.policy.evict_factor);
        if !(evict_factor >= 1.0) {
            return Err(ConfigError::InvalidValue(format!(
                "TAGTOP_EVICT_FACTOR must be at least 1, got {}",
                evict_factor
            )));
        }

        let millis = |var: &str, default: Duration| {
            parsed::<u64>(var)
                .map(Duration::from_millis)
                .unwrap_or(default)
        };

        // Ticks drive decay, so they must not run faster than once a second
        let refresh_interval = millis("TAGTOP_REFRESH_MS", defaults.refresh_interval);
        if refresh_interval < MIN_REFRESH_INTERVAL {
            return Err(ConfigError::InvalidValue(format!(
                "TAGTOP_REFRESH_MS must be at least {}, got {}",
                MIN_REFRESH_INTERVAL.as_millis(),
                refresh_interval.as_millis()
            )));
        }

        let input_timeout = millis("TAGTOP_INPUT_TIMEOUT_MS", defaults.input_timeout);
        if input_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "TAGTOP_INPUT_TIMEOUT_MS must be greater than 0".to_string(),
            ));
        }

        let idle_backoff = millis("TAGTOP_IDLE_BACKOFF_MS", defaults.idle_backoff);
        if idle_backoff.is_zero() {
            return Err(ConfigError::InvalidValue(
                "TAGTOP_IDLE_BACKOFF_MS must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            policy: DecayPolicy {
                decay,
                evict_factor,
            },
            idle_backoff,
            refresh_interval,
            input_timeout,
            log_dir: env::var("TAGTOP_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            rust_log: env::var("RUST_LOG").ok(),
        })
    }
}

fn parsed<T: std::str::FromStr>(var: &str) -> Option<T> {
    env::var(var).ok().and_then(|s| s.trim().parse().ok())
}
