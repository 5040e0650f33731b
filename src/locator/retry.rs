//! Bounded-retry orchestration for locate attempts.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::MatchCandidate;
use crate::error::{AutomationError, Result};

/// Bounded re-attempt configuration.
///
/// Attempts are counted `1..=max_attempts`; the delay runs between attempts
/// and never after the last one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Single attempt, no waiting.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Re-invoke `attempt` until it yields a candidate or the budget runs out.
///
/// Each invocation is expected to work on a fresh capture; the screen may
/// have changed between attempts. A miss (`Ok(None)`) consumes one attempt.
/// Any error is treated as fatal and propagates immediately without
/// consuming the remaining budget.
pub fn run<F>(policy: &RetryPolicy, target: &str, mut attempt: F) -> Result<MatchCandidate>
where
    F: FnMut(u32) -> Result<Option<MatchCandidate>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for n in 1..=max_attempts {
        tracing::debug!(target = %target, attempt = n, max_attempts, "locate attempt");

        if let Some(candidate) = attempt(n)? {
            return Ok(candidate);
        }

        if n < max_attempts {
            tracing::debug!(
                target = %target,
                delay_ms = policy.delay.as_millis() as u64,
                "not found, waiting before next attempt"
            );
            thread::sleep(policy.delay);
        }
    }

    Err(AutomationError::ElementNotFound {
        target: target.to_string(),
        attempts: max_attempts,
    })
}
