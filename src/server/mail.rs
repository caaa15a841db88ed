//! Public contact form relay.
//!
//! Messages are validated, throttled per client address, and appended to
//! `outbox.jsonl` for whatever delivers mail.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use eldirecto_core::{ContactMessage, SubmissionThrottle};
use serde::Serialize;
use uuid::Uuid;

use super::error::ApiError;
use super::AppState;

const OUTBOX_FILE: &str = "outbox.jsonl";

#[derive(Serialize)]
struct OutboxEntry<'a> {
    id: Uuid,
    received_at: DateTime<Utc>,
    from_ip: IpAddr,
    #[serde(flatten)]
    message: &'a ContactMessage,
}

/// Outbox writer with a per-address submission window.
#[derive(Debug)]
pub struct MailRelay {
    outbox: PathBuf,
    cooldown: Duration,
    senders: Mutex<HashMap<IpAddr, SubmissionThrottle>>,
}

impl MailRelay {
    pub fn new(data_dir: &Path, cooldown: Duration) -> Self {
        Self {
            outbox: data_dir.join(OUTBOX_FILE),
            cooldown,
            senders: Mutex::new(HashMap::new()),
        }
    }

    pub fn outbox(&self) -> &Path {
        &self.outbox
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Queues `message` from `ip` unless that address is inside its window.
    ///
    /// Returns the remaining wait when throttled. Addresses whose window has
    /// passed are forgotten.
    pub fn accept(
        &self,
        ip: IpAddr,
        message: &ContactMessage,
        now: DateTime<Utc>,
    ) -> Result<Result<(), Duration>, std::io::Error> {
        let mut senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|_, throttle| !throttle.can_submit(now));
        let throttle = senders
            .entry(ip)
            .or_insert_with(|| SubmissionThrottle::with_cooldown(self.cooldown));
        if !throttle.can_submit(now) {
            return Ok(Err(throttle.remaining(now)));
        }

        let entry = OutboxEntry {
            id: Uuid::new_v4(),
            received_at: now,
            from_ip: ip,
            message,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.outbox)?;
        file.write_all(line.as_bytes())?;

        throttle.record(now);
        Ok(Ok(()))
    }
}

/// `POST /mail`
pub async fn send(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(message): Json<ContactMessage>,
) -> Result<StatusCode, ApiError> {
    if let Err(errors) = message.validate() {
        let fields: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Err(ApiError::unprocessable(fields.join(", ")));
    }

    match state.mail.accept(addr.ip(), &message, Utc::now()) {
        Ok(Ok(())) => {
            tracing::info!("Queued contact message from {}", addr.ip());
            Ok(StatusCode::ACCEPTED)
        }
        Ok(Err(remaining)) => {
            tracing::warn!("Throttled contact message from {}", addr.ip());
            let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            Err(ApiError::too_many_requests(secs))
        }
        Err(e) => {
            tracing::error!("Failed to write outbox: {}", e);
            Err(ApiError::internal("Message could not be queued"))
        }
    }
}
