use serde::Serialize;

use crate::errors::DeliveryError;
use crate::models::ChartArtifact;

/// The independent delivery mechanisms the dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Telegram,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Email => write!(f, "email"),
            ChannelKind::Telegram => write!(f, "telegram"),
        }
    }
}

/// Outcome of one channel's single delivery attempt. Never persisted; logged
/// and returned to the caller.
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    pub channel: ChannelKind,
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn success(channel: ChannelKind) -> Self {
        Self { channel, error: None }
    }

    pub fn failure(channel: ChannelKind, err: &DeliveryError) -> Self {
        Self { channel, error: Some(err.to_string()) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything the dispatcher needs to deliver one report: channel-specific
/// payloads plus the chart artifacts whose bytes the email channel reads at
/// send time.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub subject: String,
    pub html_body: String,
    pub digest_text: String,
    pub charts: Vec<ChartArtifact>,
}
