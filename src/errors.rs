use thiserror::Error;

/// Errors that abort a report run. Delivery failures are deliberately not
/// represented here; they are captured per channel (see `DeliveryError`) so
/// one broken channel never kills the run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("no usable market data: {0}")]
    DataUnavailable(String),
    #[error("insufficient history for {ticker}: {rows} aligned rows")]
    InsufficientHistory { ticker: String, rows: usize },
    #[error("chart render failed: {0}")]
    Render(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("external service error: {0}")]
    External(String),
}

/// Per-channel delivery failure, carried inside a `DeliveryResult` instead of
/// being thrown out of the dispatcher.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed payload: {0}")]
    Payload(String),
    #[error("channel not configured: {0}")]
    NotConfigured(String),
}

impl From<String> for ReportError {
    fn from(value: String) -> Self {
        ReportError::Config(value)
    }
}
