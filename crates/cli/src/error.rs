use job_client::error::ClientError;
use session_core::error::{LocatorError, PersistError};
use session_runtime::error::ControllerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid session locator: {0}")]
    Locator(#[from] LocatorError),

    #[error("Query session error: {0}")]
    Controller(#[from] ControllerError),

    #[error("Query API error: {0}")]
    Client(#[from] ClientError),

    #[error("State store error: {0}")]
    Persist(#[from] PersistError),

    #[error("Failed to serialize output as JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("The locator does not name a job")]
    LocatorWithoutJob,

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
