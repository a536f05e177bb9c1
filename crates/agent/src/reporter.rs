//! Upload transport, response classification, and failure policy.
//!
//! One place classifies every upload result into the outcome taxonomy
//! the worker acts on; call sites never branch on raw status codes.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

/// Wire payload for `POST /api/v1/locations`.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundSample {
    pub device_uuid: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_kmh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
    pub is_moving: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<i32>,
    pub source: &'static str,
}

/// Classified result of one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Stored (or deliberately deduplicated) by the server.
    Accepted { rate_limited: bool },
    /// The session is no longer valid; retrying cannot help.
    AuthRejected,
    /// The family's subscription is locked; retrying cannot help.
    SubscriptionLocked,
    /// The server refused this specific payload; drop it and move on.
    Rejected(String),
    /// Network or server trouble; retry with backoff.
    Transient(String),
}

/// Transport seam so the worker can be driven without a network.
#[async_trait::async_trait]
pub trait Uploader: Send + Sync + 'static {
    async fn upload(&self, sample: OutboundSample) -> UploadOutcome;
}

/// Production transport speaking to the ingestion API over HTTPS.
pub struct HttpUploader {
    client: reqwest::Client,
    endpoint: String,
    session_token: String,
}

impl HttpUploader {
    pub fn new(server_url: &str, session_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/v1/locations", server_url.trim_end_matches('/')),
            session_token,
        }
    }
}

#[async_trait::async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, sample: OutboundSample) -> UploadOutcome {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.session_token)
            .json(&sample)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return UploadOutcome::Transient(e.to_string()),
        };

        let status = response.status();
        if status.is_success() {
            let rate_limited = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("rate_limited").and_then(|v| v.as_bool()))
                .unwrap_or(false);
            return UploadOutcome::Accepted { rate_limited };
        }

        match status.as_u16() {
            401 => UploadOutcome::AuthRejected,
            402 => UploadOutcome::SubscriptionLocked,
            400..=499 => {
                let body = response.text().await.unwrap_or_default();
                UploadOutcome::Rejected(format!("{}: {}", status, body))
            }
            _ => UploadOutcome::Transient(format!("server returned {}", status)),
        }
    }
}

/// Delay steps after consecutive transient failures.
const BACKOFF_STEPS: [Duration; 5] = [
    Duration::from_secs(10),
    Duration::from_secs(30),
    Duration::from_secs(60),
    Duration::from_secs(120),
    Duration::from_secs(300),
];

/// Consecutive-failure counter with a capped delay ladder.
#[derive(Debug, Default)]
pub struct Backoff {
    failures: u32,
}

impl Backoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Delay before the next attempt, or none when nothing failed yet.
    pub fn delay(&self) -> Option<Duration> {
        if self.failures == 0 {
            return None;
        }
        let index = ((self.failures - 1) as usize).min(BACKOFF_STEPS.len() - 1);
        Some(BACKOFF_STEPS[index])
    }
}

/// Upload suppression window after auth or billing rejections.
///
/// Lifts itself when the window passes; the user is alerted once per
/// engagement, not once per suppressed upload.
#[derive(Debug, Default)]
pub struct AuthBlock {
    blocked_until: Option<Instant>,
    alerted: bool,
}

impl AuthBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter (or extend) the block. Returns true when the caller should
    /// alert the user.
    pub fn engage(&mut self, now: Instant, window: Duration) -> bool {
        self.blocked_until = Some(now + window);
        let first = !self.alerted;
        self.alerted = true;
        first
    }

    /// Whether uploads are currently suppressed. A lapsed window resets
    /// the alert latch so the next engagement alerts again.
    pub fn is_active(&mut self, now: Instant) -> bool {
        match self.blocked_until {
            Some(until) if until > now => true,
            Some(_) => {
                self.blocked_until = None;
                self.alerted = false;
                false
            }
            None => false,
        }
    }
}
