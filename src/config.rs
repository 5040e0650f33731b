use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::locator::retry::RetryPolicy;

/// Library configuration, resolved once per session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory template images are read from and diagnostic screenshots
    /// are written to.
    pub assets_dir: PathBuf,
    /// Directory for per-session audit logs. `None` keeps the log in memory
    /// only.
    pub log_dir: Option<PathBuf>,
    /// Whether successful text/color matches are exported as highlighted
    /// screenshots.
    pub save_artifacts: bool,
    /// Retry policy applied when a locate call does not supply its own.
    pub default_retry: RetryPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            assets_dir: env::var("SCREENPILOT_ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.assets_dir),
            log_dir: env::var("SCREENPILOT_LOG_DIR")
                .map(|d| Some(PathBuf::from(d)))
                .unwrap_or(defaults.log_dir),
            save_artifacts: env::var("SCREENPILOT_SAVE_ARTIFACTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.save_artifacts),
            default_retry: RetryPolicy {
                max_attempts: env::var("SCREENPILOT_MAX_ATTEMPTS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|&n| n >= 1)
                    .unwrap_or(defaults.default_retry.max_attempts),
                delay: env::var("SCREENPILOT_RETRY_DELAY_SECS")
                    .ok()
                    .and_then(|v| v.parse::<f64>().ok())
                    .filter(|&s| s >= 0.0)
                    .map(Duration::from_secs_f64)
                    .unwrap_or(defaults.default_retry.delay),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            log_dir: Some(PathBuf::from("logs")),
            save_artifacts: true,
            default_retry: RetryPolicy::default(),
        }
    }
}
