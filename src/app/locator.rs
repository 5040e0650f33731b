//! Platform-specific executable discovery.
//!
//! Matching and retry logic never touch this; only [`AppController`]
//! resolves bare application names through the locator selected at startup.
//!
//! [`AppController`]: super::AppController

use std::path::PathBuf;
use std::process::Command;

use crate::error::Result;

/// Finds the executable path for an application name on the current
/// platform. `Ok(None)` means the name could not be resolved; the caller
/// decides whether that is fatal.
pub trait AppLocator {
    fn locate(&self, name: &str) -> Result<Option<PathBuf>>;
}

/// Locator for the platform this library was built for.
pub fn platform_locator() -> Box<dyn AppLocator> {
    #[cfg(target_os = "windows")]
    {
        Box::new(WindowsAppLocator)
    }
    #[cfg(target_os = "macos")]
    {
        Box::new(MacAppLocator)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Box::new(UnixAppLocator)
    }
}

/// Run a lookup command and take the first line of stdout as a path.
fn first_line_of(command: &str, args: &[&str]) -> Option<PathBuf> {
    let output = Command::new(command).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(PathBuf::from)
}

#[cfg(target_os = "windows")]
pub struct WindowsAppLocator;

#[cfg(target_os = "windows")]
impl AppLocator for WindowsAppLocator {
    fn locate(&self, name: &str) -> Result<Option<PathBuf>> {
        let name = if name.to_lowercase().ends_with(".exe") {
            name.to_string()
        } else {
            format!("{name}.exe")
        };

        // PATH first, then the common install roots.
        if let Some(path) = first_line_of("where", &[&name]) {
            return Ok(Some(path));
        }

        let roots = [
            std::env::var("PROGRAMFILES").ok(),
            std::env::var("PROGRAMFILES(X86)").ok(),
            std::env::var("LOCALAPPDATA").ok(),
            std::env::var("LOCALAPPDATA")
                .ok()
                .map(|p| format!("{p}\\Programs")),
        ];

        for root in roots.into_iter().flatten() {
            let candidate = PathBuf::from(root).join(&name);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}

#[cfg(target_os = "macos")]
pub struct MacAppLocator;

#[cfg(target_os = "macos")]
impl AppLocator for MacAppLocator {
    fn locate(&self, name: &str) -> Result<Option<PathBuf>> {
        if let Some(path) = first_line_of("which", &[name]) {
            return Ok(Some(path));
        }

        // `open -a` resolves bundle names itself; report the bundle path if
        // it exists so launch can still go through `open`.
        let bundle = PathBuf::from(format!("/Applications/{name}.app"));
        if bundle.exists() {
            return Ok(Some(bundle));
        }

        Ok(None)
    }
}

pub struct UnixAppLocator;

impl AppLocator for UnixAppLocator {
    fn locate(&self, name: &str) -> Result<Option<PathBuf>> {
        Ok(first_line_of("which", &[name]))
    }
}
