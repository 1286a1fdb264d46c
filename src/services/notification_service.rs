use async_trait::async_trait;
use futures::future::join_all;
use lettre::{
    message::{header::ContentType, Attachment, Body, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::collections::HashMap;
use tracing::{error, info};

use crate::errors::DeliveryError;
use crate::models::{ChannelKind, DeliveryResult, RenderedReport};

/// One independent delivery mechanism. Implementations read their secrets
/// from the environment at send time; a missing secret surfaces as a typed
/// `NotConfigured` failure in the result map instead of being swallowed.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;
    async fn deliver(&self, report: &RenderedReport) -> Result<(), DeliveryError>;
}

/// Fans the rendered report out across every configured channel. The central
/// resilience contract of the pipeline lives here: every channel gets exactly
/// one awaited attempt, every outcome is captured, and `dispatch` itself
/// never fails.
pub struct NotificationDispatcher {
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    /// Channels enabled via `EMAIL_ENABLED` / `TELEGRAM_ENABLED` (both
    /// default on).
    pub fn from_env() -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();
        if env_flag("EMAIL_ENABLED", true) {
            channels.push(Box::new(EmailChannel));
        }
        if env_flag("TELEGRAM_ENABLED", true) {
            channels.push(Box::new(TelegramChannel::new()));
        }
        Self { channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Deliver over all channels concurrently; channels are independent and
    /// order-insensitive. Always returns one result per channel.
    pub async fn dispatch(&self, report: &RenderedReport) -> HashMap<ChannelKind, DeliveryResult> {
        let attempts = self.channels.iter().map(|channel| async {
            let kind = channel.kind();
            match channel.deliver(report).await {
                Ok(()) => {
                    info!("✅ {} delivery succeeded", kind);
                    DeliveryResult::success(kind)
                }
                Err(e) => {
                    error!("❌ {} delivery failed: {}", kind, e);
                    DeliveryResult::failure(kind, &e)
                }
            }
        });

        join_all(attempts)
            .await
            .into_iter()
            .map(|result| (result.channel, result))
            .collect()
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_required(key: &str) -> Result<String, DeliveryError> {
    std::env::var(key).map_err(|_| DeliveryError::NotConfigured(format!("{key} is not set")))
}

// ==============================================================================
// Email channel
// ==============================================================================

/// HTML email over an SMTP relay, chart images attached inline with a
/// Content-ID equal to each chart's file name so the HTML references resolve.
pub struct EmailChannel;

struct SmtpSettings {
    host: String,
    port: u16,
    username: String,
    password: String,
    from: String,
    recipients: Vec<String>,
}

impl SmtpSettings {
    fn from_env() -> Result<Self, DeliveryError> {
        let port = std::env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|e| DeliveryError::NotConfigured(format!("SMTP_PORT: {e}")))?;
        let from_email = env_required("SMTP_FROM_EMAIL")?;
        let from_name =
            std::env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "marketbrief".to_string());

        let recipients: Vec<String> = env_required("REPORT_RECIPIENTS")?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if recipients.is_empty() {
            return Err(DeliveryError::NotConfigured("REPORT_RECIPIENTS is empty".into()));
        }

        Ok(Self {
            host: env_required("SMTP_HOST")?,
            port,
            username: env_required("SMTP_USERNAME")?,
            password: env_required("SMTP_PASSWORD")?,
            from: format!("{from_name} <{from_email}>"),
            recipients,
        })
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn deliver(&self, report: &RenderedReport) -> Result<(), DeliveryError> {
        let settings = SmtpSettings::from_env()?;

        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| DeliveryError::Payload(format!("invalid from address: {e}")))?;

        let mut builder = Message::builder().from(from).subject(report.subject.clone());
        for recipient in &settings.recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e| DeliveryError::Payload(format!("invalid recipient {recipient}: {e}")))?;
            builder = builder.to(to);
        }

        // multipart/related: the HTML body first, then one inline image per
        // chart, each keyed by the cid the HTML already references.
        let mut multipart = MultiPart::related().singlepart(
            SinglePart::builder()
                .header(ContentType::TEXT_HTML)
                .body(report.html_body.clone()),
        );

        let png = ContentType::parse("image/png")
            .map_err(|e| DeliveryError::Payload(format!("image/png content type: {e}")))?;

        for chart in &report.charts {
            let bytes = tokio::fs::read(&chart.path).await.map_err(|e| {
                DeliveryError::Payload(format!("cannot read {}: {e}", chart.path.display()))
            })?;
            multipart = multipart.singlepart(
                Attachment::new_inline(chart.cid.clone()).body(Body::new(bytes), png.clone()),
            );
        }

        let email = builder
            .multipart(multipart)
            .map_err(|e| DeliveryError::Payload(format!("failed to build email: {e}")))?;

        let creds = Credentials::new(settings.username.clone(), settings.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| DeliveryError::Transport(format!("SMTP relay {}: {e}", settings.host)))?
            .port(settings.port)
            .credentials(creds)
            .build();

        // One transaction for all recipients; per-recipient failures are the
        // relay's to report, not distinguished here.
        mailer.send(email).await.map_err(|e| {
            let msg = e.to_string();
            if msg.contains("535") || msg.to_lowercase().contains("auth") {
                DeliveryError::Auth(msg)
            } else {
                DeliveryError::Transport(msg)
            }
        })?;

        info!("📧 Report emailed to {} recipient(s)", settings.recipients.len());
        Ok(())
    }
}

// ==============================================================================
// Telegram channel
// ==============================================================================

/// The JSON payload for the Telegram `sendMessage` endpoint. Plain text, no
/// parse mode: the digest carries nothing but literal newlines.
#[derive(Debug, serde::Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Plain-text digest to one chat via the Telegram Bot API.
pub struct TelegramChannel {
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for TelegramChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Telegram
    }

    async fn deliver(&self, report: &RenderedReport) -> Result<(), DeliveryError> {
        let token = env_required("TELEGRAM_BOT_TOKEN")?;
        let chat_id = env_required("TELEGRAM_CHAT_ID")?;

        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let payload = SendMessagePayload { chat_id: &chat_id, text: &report.digest_text };

        // Awaited to completion: the outcome of this send is part of the
        // run's delivery summary, never fire-and-forget.
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(DeliveryError::Auth(format!("Telegram API rejected the bot token ({status})")));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to decode error response".to_string());
            return Err(DeliveryError::Transport(format!("Telegram API {status}: {error_text}")));
        }

        info!("💬 Digest sent to Telegram chat");
        Ok(())
    }
}
