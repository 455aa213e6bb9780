use thiserror::Error;

/// Why a single page could not be fetched.
///
/// These never abort a run: the scheduler turns each one into an error
/// [`Device`](inkwatch_core::Device) carrying the message and status code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("timeout of {timeout_ms}ms exceeded fetching {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("request to {url} failed with status code {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
}

impl FetchError {
    /// HTTP status code, when the device answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures setting up a collector. Runs themselves never fail.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

pub type Result<T> = std::result::Result<T, CollectError>;
