//! Target application lifecycle: launch and close.
//!
//! Thin collaborator around `std::process::Command`; every failure maps to
//! `ApplicationLaunch` so the top-level caller can tell process trouble
//! apart from element-location trouble.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{AutomationError, Result};

pub mod locator;

pub use locator::{platform_locator, AppLocator};

pub struct AppController {
    locator: Box<dyn AppLocator>,
}

impl AppController {
    pub fn new() -> Self {
        Self {
            locator: platform_locator(),
        }
    }

    /// Use a specific locator instead of the platform default.
    pub fn with_locator(locator: Box<dyn AppLocator>) -> Self {
        Self { locator }
    }

    /// Launch an application given either a path to its executable or a bare
    /// name resolved through the platform locator.
    pub fn launch(&self, name_or_path: &str, as_admin: bool) -> Result<()> {
        let path = self.resolve(name_or_path)?;
        tracing::info!(path = %path.display(), as_admin, "launching application");

        let spawn_result = if as_admin {
            Self::spawn_elevated(&path)
        } else {
            Self::spawn(&path)
        };

        spawn_result.map_err(|e| {
            AutomationError::ApplicationLaunch(format!(
                "failed to launch {}: {e}",
                path.display()
            ))
        })
    }

    /// Force-terminate an application by process name. Used by cleanup paths,
    /// so a process that is already gone is not an error.
    pub fn close(&self, name: &str) -> Result<()> {
        tracing::info!(name, "closing application");

        #[cfg(target_os = "windows")]
        let status = {
            let name = if name.to_lowercase().ends_with(".exe") {
                name.to_string()
            } else {
                format!("{name}.exe")
            };
            Command::new("taskkill")
                .args(["/F", "/IM", &name])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
        };

        #[cfg(not(target_os = "windows"))]
        let status = Command::new("pkill")
            .arg(name)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        status
            .map(|_| ())
            .map_err(|e| AutomationError::ApplicationLaunch(format!("failed to close {name}: {e}")))
    }

    fn resolve(&self, name_or_path: &str) -> Result<PathBuf> {
        let as_path = Path::new(name_or_path);
        if as_path.is_file() || name_or_path.contains('/') || name_or_path.contains('\\') {
            return Ok(as_path.to_path_buf());
        }

        self.locator.locate(name_or_path)?.ok_or_else(|| {
            AutomationError::ApplicationLaunch(format!(
                "could not find executable for: {name_or_path}"
            ))
        })
    }

    fn spawn(path: &Path) -> std::io::Result<()> {
        #[cfg(target_os = "macos")]
        {
            // `open` resolves .app bundles and detaches properly.
            Command::new("open").arg(path).spawn().map(|_| ())
        }
        #[cfg(not(target_os = "macos"))]
        {
            Command::new(path).spawn().map(|_| ())
        }
    }

    fn spawn_elevated(path: &Path) -> std::io::Result<()> {
        #[cfg(target_os = "windows")]
        {
            Command::new("powershell")
                .args([
                    "-NoProfile",
                    "-Command",
                    &format!("Start-Process -FilePath '{}' -Verb RunAs", path.display()),
                ])
                .spawn()
                .map(|_| ())
        }
        #[cfg(target_os = "macos")]
        {
            Command::new("sudo")
                .arg("open")
                .arg(path)
                .spawn()
                .map(|_| ())
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            Command::new("pkexec").arg(path).spawn().map(|_| ())
        }
    }
}

impl Default for AppController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolvable_name_is_a_launch_failure() {
        let app = AppController::new();
        let err = app
            .launch("screenpilot-definitely-not-installed-9f3a", false)
            .unwrap_err();
        assert!(matches!(err, AutomationError::ApplicationLaunch(_)));
        assert_eq!(err.kind(), "application_launch_failure");
    }

    #[test]
    fn test_explicit_paths_skip_the_locator() {
        struct NeverLocator;
        impl AppLocator for NeverLocator {
            fn locate(&self, _name: &str) -> crate::error::Result<Option<PathBuf>> {
                panic!("locator must not be consulted for explicit paths");
            }
        }

        let app = AppController::with_locator(Box::new(NeverLocator));
        let resolved = app.resolve("/usr/bin/some-tool").unwrap();
        assert_eq!(resolved, PathBuf::from("/usr/bin/some-tool"));
    }
}
