use thiserror::Error;

/// Error taxonomy for everything that talks to the backend platform.
///
/// Not-found is deliberately absent: single-row fetches report it as
/// `Ok(None)`, a valid empty state rather than an error.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// Client-side validation that failed before any network activity.
    #[error("{0}")]
    Validation(String),

    /// The backend rejected the request; the message is passed through
    /// verbatim so the user sees what the platform said.
    #[error("{0}")]
    Request(String),

    /// The request never produced a backend answer (network, decode).
    #[error("network error: {0}")]
    Transport(String),

    /// The resumable upload client ran out of retries mid-transfer.
    #[error("upload failed after retries: {0}")]
    RetriesExhausted(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Transport(e.to_string())
    }
}
