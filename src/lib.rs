//! screenpilot: vision-driven desktop UI automation.
//!
//! Locates on-screen elements by recognized text, image template, or pixel
//! color, drives pointer/keyboard input against them, retries under
//! transient visual conditions, and records a structured audit trail of
//! every action.
//!
//! Execution is single-threaded and synchronous: capture, recognition,
//! correlation, and retry delays each block the calling thread, and there is
//! no cancellation of an in-flight recognition pass. The screen, pointer,
//! and keyboard are singleton resources held by one [`AutomationContext`]
//! per session.
//!
//! ## Example
//!
//! Requires the `ocr` feature for the default Tesseract recognizer.
//!
//! ```rust,ignore
//! use screenpilot::{AutomationContext, AutomationError, Config, MatchRequest};
//!
//! fn run(ctx: &mut AutomationContext) -> screenpilot::Result<()> {
//!     ctx.chain()
//!         .launch_app("chrome", false)?
//!         .wait(5.0)?
//!         .locate_and_click(&MatchRequest::text(["Search"]))?
//!         .type_text("example.com")?
//!         .press_key("enter")?;
//!     Ok(())
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut ctx = AutomationContext::new(Config::from_env())?;
//! let outcome = run(&mut ctx);
//!
//! // Cleanup runs on every exit path; the chain only propagates.
//! ctx.close_app("chrome")?;
//!
//! match outcome {
//!     Err(AutomationError::ElementNotFound { target, .. }) => {
//!         eprintln!("gave up waiting for {target}");
//!     }
//!     other => other?,
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod artifacts;
pub mod audit;
pub mod capture;
pub mod config;
pub mod context;
pub mod error;
pub mod input;
pub mod locator;
pub mod ocr;

pub use audit::{ActionLogEntry, ActionLogger, ActionStatus};
pub use capture::{FrameSource, Region, ScreenCapture, ScreenFrame};
pub use config::Config;
pub use context::AutomationContext;
pub use error::{AutomationError, Result};
pub use locator::{
    BoundingBox, Locator, MatchCandidate, MatchRequest, RetryPolicy, Target,
};
pub use ocr::{TextDetection, TextRecognizer};
