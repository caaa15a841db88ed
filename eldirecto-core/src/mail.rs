//! Public contact form submission.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::gateway::{Gateway, GatewayError};
use crate::throttle::{format_remaining, SubmissionThrottle};

/// A message from the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    #[serde(default)]
    pub company: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub message: String,
}

/// A form field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("invalid message: {}", summarize(.0))]
    Invalid(Vec<FieldError>),

    #[error("please wait {} before sending another message", format_remaining(.remaining))]
    Throttled { remaining: Duration },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// `local@domain.tld` with no whitespace anywhere.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    match domain.rsplit_once('.') {
        Some((host, tld)) => !local.is_empty() && !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

impl ContactMessage {
    /// Checks required fields and the email shape.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError {
                field: "name",
                reason: "is required",
            });
        }
        if self.email.trim().is_empty() {
            errors.push(FieldError {
                field: "email",
                reason: "is required",
            });
        } else if !looks_like_email(self.email.trim()) {
            errors.push(FieldError {
                field: "email",
                reason: "is not a valid address",
            });
        }
        if self.message.trim().is_empty() {
            errors.push(FieldError {
                field: "message",
                reason: "is required",
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Validates, checks the throttle, and posts the message.
///
/// The submission time is recorded only when the gateway accepts it. A 429
/// from the gateway is reported as `Throttled` with its retry-after.
pub async fn submit<G: Gateway>(
    gateway: &G,
    throttle: &mut SubmissionThrottle,
    message: &ContactMessage,
    now: DateTime<Utc>,
) -> Result<(), ContactError> {
    message.validate().map_err(ContactError::Invalid)?;

    if !throttle.can_submit(now) {
        return Err(ContactError::Throttled {
            remaining: throttle.remaining(now),
        });
    }

    match gateway.send_mail(message).await {
        Ok(()) => {
            throttle.record(now);
            info!(from = %message.email, "Contact message sent");
            Ok(())
        }
        Err(GatewayError::RateLimited { retry_after }) => {
            warn!("Gateway throttled contact message");
            Err(ContactError::Throttled {
                remaining: retry_after.unwrap_or_else(|| throttle.cooldown()),
            })
        }
        Err(e) => Err(e.into()),
    }
}
