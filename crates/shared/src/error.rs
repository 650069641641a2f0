use thiserror::Error;

/// Boundary error for every REST call. Transport and API failures are
/// reported inline to the user; neither is fatal to the process.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("api error ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// True for timeouts and connection failures, the only class where the
    /// AI question path is allowed a single automatic retry.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
