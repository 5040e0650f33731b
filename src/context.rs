//! Automation context: the composition root every chained call operates on.
//!
//! Holds typed handles to the app controller, input controller, and locator
//! plus the shared audit logger; it carries no other state. Every public
//! operation is routed through [`instrument`], and chainable operations
//! return `&mut Self` so calls compose left to right, evaluated eagerly and
//! synchronously. A failure anywhere propagates through `?` and aborts the
//! remainder of the chain; cleanup (such as closing the target application)
//! is the caller's responsibility on every exit path.

use std::thread;
use std::time::Duration;

use crate::app::{AppController, AppLocator};
use crate::artifacts::AssetStore;
use crate::audit::{instrument, ActionLogger};
use crate::capture::{FrameSource, Region, ScreenCapture, ScreenFrame};
use crate::config::Config;
use crate::error::Result;
use crate::input::InputController;
use crate::locator::{Locator, MatchCandidate, MatchRequest, RetryPolicy, Target};
use crate::ocr::TextRecognizer;

/// Pause after a click driven by a locate, so the target application has a
/// beat to react before the next chain step.
const CLICK_SETTLE: Duration = Duration::from_millis(500);

pub struct AutomationContext {
    app: AppController,
    input: InputController,
    locator: Locator,
    logger: ActionLogger,
    default_retry: RetryPolicy,
}

impl AutomationContext {
    /// Context with the default engines: xcap capture and Tesseract
    /// recognition.
    #[cfg(feature = "ocr")]
    pub fn new(config: Config) -> Result<Self> {
        Self::with_recognizer(config, Box::new(crate::ocr::TesseractRecognizer::new()))
    }

    /// Context with xcap capture and a caller-supplied recognition engine.
    pub fn with_recognizer(config: Config, recognizer: Box<dyn TextRecognizer>) -> Result<Self> {
        Self::with_frame_source(config, Box::new(ScreenCapture::new()), recognizer)
    }

    /// Fully injected construction; the seam used by tests and embedders
    /// with their own capture path.
    pub fn with_frame_source(
        config: Config,
        source: Box<dyn FrameSource>,
        recognizer: Box<dyn TextRecognizer>,
    ) -> Result<Self> {
        let logger = match &config.log_dir {
            Some(dir) => ActionLogger::to_file(dir)?,
            None => ActionLogger::in_memory(),
        };
        tracing::info!(session = %logger.session_id(), "automation session started");

        let locator = Locator::new(
            source,
            recognizer,
            AssetStore::new(&config.assets_dir),
            config.save_artifacts,
        );

        Ok(Self {
            app: AppController::new(),
            input: InputController::new()?,
            locator,
            logger,
            default_retry: config.default_retry,
        })
    }

    /// Replace the platform app locator (e.g. with a fixture in tests).
    pub fn with_app_locator(mut self, locator: Box<dyn AppLocator>) -> Self {
        self.app = AppController::with_locator(locator);
        self
    }

    pub fn logger(&self) -> &ActionLogger {
        &self.logger
    }

    /// Retry policy from the session config, for building requests.
    pub fn default_retry(&self) -> RetryPolicy {
        self.default_retry
    }

    /// Fluent entry point; purely cosmetic, the context is the chain.
    pub fn chain(&mut self) -> &mut Self {
        self
    }

    // ============ Application control ============

    pub fn launch_app(&mut self, name_or_path: &str, as_admin: bool) -> Result<&mut Self> {
        let Self { logger, app, .. } = self;
        instrument(
            logger,
            "launch_app",
            format!("app={name_or_path:?}, as_admin={as_admin}"),
            || app.launch(name_or_path, as_admin),
        )?;
        Ok(self)
    }

    pub fn close_app(&mut self, name: &str) -> Result<&mut Self> {
        let Self { logger, app, .. } = self;
        instrument(logger, "close_app", format!("app={name:?}"), || {
            app.close(name)
        })?;
        Ok(self)
    }

    // ============ Timing ============

    /// Block the chain for the given number of seconds. Negative values are
    /// clamped to zero; a non-finite or overflowing value is an error, not a
    /// panic.
    pub fn wait(&mut self, seconds: f64) -> Result<&mut Self> {
        let Self { logger, .. } = self;
        instrument(logger, "wait", format!("seconds={seconds}"), || {
            thread::sleep(wait_duration(seconds)?);
            Ok(())
        })?;
        Ok(self)
    }

    // ============ Input simulation ============

    pub fn move_mouse(&mut self, x: i32, y: i32) -> Result<&mut Self> {
        let Self { logger, input, .. } = self;
        instrument(logger, "move_mouse", format!("x={x}, y={y}"), || {
            input.move_mouse(x, y)
        })?;
        Ok(self)
    }

    pub fn click_at(&mut self, x: i32, y: i32) -> Result<&mut Self> {
        let Self { logger, input, .. } = self;
        instrument(logger, "click_at", format!("x={x}, y={y}"), || {
            input.click_at(x, y)
        })?;
        Ok(self)
    }

    pub fn double_click_at(&mut self, x: i32, y: i32) -> Result<&mut Self> {
        let Self { logger, input, .. } = self;
        instrument(logger, "double_click_at", format!("x={x}, y={y}"), || {
            input.double_click_at(x, y)
        })?;
        Ok(self)
    }

    pub fn right_click_at(&mut self, x: i32, y: i32) -> Result<&mut Self> {
        let Self { logger, input, .. } = self;
        instrument(logger, "right_click_at", format!("x={x}, y={y}"), || {
            input.right_click_at(x, y)
        })?;
        Ok(self)
    }

    pub fn drag(
        &mut self,
        from: (i32, i32),
        to: (i32, i32),
        duration: Duration,
    ) -> Result<&mut Self> {
        let Self { logger, input, .. } = self;
        instrument(
            logger,
            "drag",
            format!("from={from:?}, to={to:?}, duration_ms={}", duration.as_millis()),
            || input.drag(from, to, duration),
        )?;
        Ok(self)
    }

    pub fn scroll(&mut self, dx: i32, dy: i32) -> Result<&mut Self> {
        let Self { logger, input, .. } = self;
        instrument(logger, "scroll", format!("dx={dx}, dy={dy}"), || {
            input.scroll(dx, dy)
        })?;
        Ok(self)
    }

    pub fn type_text(&mut self, text: &str) -> Result<&mut Self> {
        let Self { logger, input, .. } = self;
        instrument(logger, "type_text", format!("text={text:?}"), || {
            input.type_text(text)
        })?;
        Ok(self)
    }

    pub fn press_key(&mut self, key: &str) -> Result<&mut Self> {
        let Self { logger, input, .. } = self;
        instrument(logger, "press_key", format!("key={key:?}"), || {
            input.press_key(key)
        })?;
        Ok(self)
    }

    pub fn hotkey(&mut self, modifiers: &[&str], key: &str) -> Result<&mut Self> {
        let Self { logger, input, .. } = self;
        instrument(
            logger,
            "hotkey",
            format!("modifiers={modifiers:?}, key={key:?}"),
            || input.hotkey(modifiers, key),
        )?;
        Ok(self)
    }

    // ============ Screen analysis ============

    /// Capture the full screen or a region. Terminal: returns the frame.
    pub fn capture(&mut self, region: Option<Region>) -> Result<ScreenFrame> {
        let Self { logger, locator, .. } = self;
        instrument(logger, "capture", format!("region={region:?}"), || {
            locator.capture(region)
        })
    }

    /// Resolve a match request. Terminal: returns the located candidate.
    ///
    /// A request without its own retry policy inherits the session default
    /// from [`Config::default_retry`].
    pub fn locate(&mut self, request: &MatchRequest) -> Result<MatchCandidate> {
        let request = request.clone().or_retry(self.default_retry);
        let Self { logger, locator, .. } = self;
        instrument(
            logger,
            action_name(&request.target),
            request_args(&request),
            || locator.find(&request),
        )
    }

    /// Resolve a match request and click the candidate's center.
    pub fn locate_and_click(&mut self, request: &MatchRequest) -> Result<&mut Self> {
        let request = request.clone().or_retry(self.default_retry);
        let action = format!("{}_and_click", action_name(&request.target));
        let Self {
            logger,
            locator,
            input,
            ..
        } = self;
        instrument(logger, &action, request_args(&request), || {
            let candidate = locator.find(&request)?;
            let (x, y) = candidate.center();
            input.click_at(x, y)?;
            thread::sleep(CLICK_SETTLE);
            Ok(())
        })?;
        Ok(self)
    }
}

fn action_name(target: &Target) -> &'static str {
    match target {
        Target::Text { .. } => "find_text",
        Target::Template { .. } => "find_template",
        Target::Color { .. } => "find_color",
    }
}

fn request_args(request: &MatchRequest) -> String {
    serde_json::to_string(request).unwrap_or_else(|_| request.target.describe())
}

fn wait_duration(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds.max(0.0))
        .map_err(|e| anyhow::anyhow!("invalid wait duration {seconds}: {e}").into())
}
