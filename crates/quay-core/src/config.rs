//! Launch configuration
//!
//! Everything the shell needs at startup lives in one struct: the address to
//! poll and display, the optional backend spawn command, window options and
//! the readiness retry policy. There are no CLI flags and no config file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::Result;

/// Address the backend is expected to serve on.
pub const DEFAULT_TARGET_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// URL polled for readiness and loaded into the window
    pub target_url: Url,
    /// Backend process to spawn, if the shell owns the backend lifecycle
    pub backend: Option<BackendCommand>,
    /// Readiness retry policy
    pub retry: RetryPolicy,
    /// Native window options
    pub window: WindowOptions,
}

impl LaunchConfig {
    /// Display-only configuration: poll and show `target_url`, spawn nothing.
    pub fn new(target_url: &str) -> Result<Self> {
        Ok(Self {
            target_url: Url::parse(target_url)?,
            backend: None,
            retry: RetryPolicy::default(),
            window: WindowOptions::default(),
        })
    }

    pub fn with_backend(mut self, backend: BackendCommand) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        let mut config = Self::new(DEFAULT_TARGET_URL).expect("default target URL is valid");
        config.backend = Some(BackendCommand::new("python3", ["webapp.py"]));
        config
    }
}

/// Spawn description for the backend process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl BackendCommand {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowOptions {
    pub title: String,
    pub width: f64,
    pub height: f64,
    /// Optional window icon (PNG)
    pub icon_path: Option<PathBuf>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "Quay".to_string(),
            width: 1200.0,
            height: 660.0,
            icon_path: None,
        }
    }
}

/// Readiness retry policy
///
/// `max_attempts: None` keeps the historical behavior of waiting forever for
/// a local backend, but paced by the backoff schedule instead of hammering
/// the port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl RetryPolicy {
    pub fn unlimited() -> Self {
        Self {
            max_attempts: None,
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(5),
        }
    }

    pub fn limited(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            ..Self::unlimited()
        }
    }

    /// Delay to sleep after the given failed attempt (1-based).
    /// Doubles per attempt, capped at `max_interval`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.initial_interval.saturating_mul(1u32 << exponent);
        delay.min(self.max_interval)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LaunchConfig::default();
        assert_eq!(config.target_url.as_str(), "http://127.0.0.1:5000/");
        assert!(config.backend.is_some());
        assert!(config.retry.max_attempts.is_none());
        assert_eq!(config.window.width, 1200.0);
        assert_eq!(config.window.height, 660.0);
    }

    #[test]
    fn test_display_only_config() {
        let config = LaunchConfig::new("http://127.0.0.1:8080").unwrap();
        assert!(config.backend.is_none());
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(LaunchConfig::new("not a url").is_err());
    }

    #[test]
    fn test_config_survives_serialization() {
        let config = LaunchConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: LaunchConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.target_url, config.target_url);
        assert_eq!(restored.retry.initial_interval, config.retry.initial_interval);
        assert_eq!(
            restored.backend.as_ref().map(|b| b.program.as_str()),
            Some("python3")
        );
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: None,
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_millis(450),
        };

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        // Capped from here on
        assert_eq!(policy.delay_for(4), Duration::from_millis(450));
        assert_eq!(policy.delay_for(40), Duration::from_millis(450));
    }
}
