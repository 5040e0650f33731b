use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("element not found: {target} (after {attempts} attempts)")]
    ElementNotFound { target: String, attempts: u32 },

    #[error("failed to launch application: {0}")]
    ApplicationLaunch(String),

    #[error("asset not found: {path} ({detail})")]
    AssetNotFound { path: PathBuf, detail: String },

    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("unexpected failure: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl AutomationError {
    /// Stable kind string recorded in audit log entries.
    pub fn kind(&self) -> &'static str {
        match self {
            AutomationError::ElementNotFound { .. } => "element_not_found",
            AutomationError::ApplicationLaunch(_) => "application_launch_failure",
            AutomationError::AssetNotFound { .. } => "asset_not_found",
            AutomationError::Capture(_) => "capture_failure",
            AutomationError::Unexpected(_) => "unexpected_failure",
        }
    }
}

pub type Result<T> = std::result::Result<T, AutomationError>;
