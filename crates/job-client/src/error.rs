use thiserror::Error;

/// Errors raised at the query-job API boundary.
///
/// A job that the backend reports as failed is NOT an error here: `poll_status`
/// itself succeeded and the failure travels as data in `JobPoll`.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Local precondition failure. Never reaches the network.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Network-level failure talking to the backend.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The backend answered but the payload could not be decoded.
    #[error("failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The backend answered with an error payload for the operation.
    #[error("backend error: {0}")]
    Api(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl ClientError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}
