//! Client-side pacing of public contact submissions.
//!
//! This is a deterrent only. The gateway enforces the same window and its
//! answer wins.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum time between two accepted submissions.
pub const COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// True iff `now - last >= COOLDOWN`, or nothing was submitted yet.
pub fn can_submit(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    SubmissionThrottle {
        last_submission: last,
        cooldown: COOLDOWN,
    }
    .can_submit(now)
}

/// Remembers the last successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionThrottle {
    last_submission: Option<DateTime<Utc>>,
    #[serde(skip, default = "default_cooldown")]
    cooldown: Duration,
}

fn default_cooldown() -> Duration {
    COOLDOWN
}

impl Default for SubmissionThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionThrottle {
    pub fn new() -> Self {
        Self::with_cooldown(COOLDOWN)
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            last_submission: None,
            cooldown,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn last_submission(&self) -> Option<DateTime<Utc>> {
        self.last_submission
    }

    pub fn can_submit(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).is_zero()
    }

    /// Time left before the next submission is allowed. Zero when allowed.
    ///
    /// A clock that went backwards never yields more than the full window.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let Some(last) = self.last_submission else {
            return Duration::ZERO;
        };

        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        self.cooldown.saturating_sub(elapsed).min(self.cooldown)
    }

    /// Records a successful submission at `now`.
    pub fn record(&mut self, now: DateTime<Utc>) {
        self.last_submission = Some(now);
    }
}

/// Formats a remaining duration as `m:ss`, rounding partial seconds up.
pub fn format_remaining(remaining: &Duration) -> String {
    let mut secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs += 1;
    }
    format!("{}:{:02}", secs / 60, secs % 60)
}
