use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Environment variable naming a YAML file read by [`Config::load`].
pub const CONFIG_ENV: &str = "COMPACT_HTTP_CONFIG";

pub const DEFAULT_OPEN_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_CLOSE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024;
pub const DEFAULT_MAX_BODY_LENGTH: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timeouts: Timeouts,
    pub limits: Limits,
}

/// Per-phase budgets. Every budget is spent as a number of pump attempts
/// spaced `poll_interval_ms` apart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub open_ms: u64,
    pub send_ms: u64,
    pub receive_ms: u64,
    pub close_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Longest request line or response line accepted, excluding CRLF.
    pub max_line_length: usize,
    /// Largest `Content-Length` a response may announce.
    pub max_body_length: usize,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            open_ms: DEFAULT_OPEN_TIMEOUT_MS,
            send_ms: DEFAULT_SEND_TIMEOUT_MS,
            receive_ms: DEFAULT_RECEIVE_TIMEOUT_MS,
            close_ms: DEFAULT_CLOSE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_body_length: DEFAULT_MAX_BODY_LENGTH,
        }
    }
}

impl Timeouts {
    pub fn open(&self) -> Duration {
        Duration::from_millis(self.open_ms)
    }

    pub fn send(&self) -> Duration {
        Duration::from_millis(self.send_ms)
    }

    pub fn receive(&self) -> Duration {
        Duration::from_millis(self.receive_ms)
    }

    pub fn close(&self) -> Duration {
        Duration::from_millis(self.close_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Number of pump attempts that fit in `budget`, never less than one.
    pub fn attempts(&self, budget: Duration) -> u32 {
        let interval = self.poll_interval_ms.max(1) as u128;
        let attempts = budget.as_millis().div_ceil(interval).max(1);
        u32::try_from(attempts).unwrap_or(u32::MAX)
    }
}

impl Config {
    /// Reads the file named by `COMPACT_HTTP_CONFIG`, falling back to the
    /// built-in defaults when the variable is unset or the file is unusable.
    pub fn load() -> Self {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path).unwrap_or_else(|e| {
                tracing::warn!(path = %path, error = %e, "Falling back to default configuration");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw).context("Invalid YAML configuration")?;
        if cfg.limits.max_line_length == 0 {
            anyhow::bail!("limits.max_line_length must be positive");
        }
        Ok(cfg)
    }
}
