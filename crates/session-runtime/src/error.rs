use job_client::error::ClientError;
use session_core::error::{PersistError, SessionError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("poll interval must be at least {min_ms}ms, got {got_ms}ms")]
    IntervalTooShort { min_ms: u64, got_ms: u64 },
}

/// Errors surfaced by result pagination. Non-fatal for the session: the
/// phase stays `succeeded` and the caller may retry.
#[derive(Debug, Error)]
pub enum PaginateError {
    #[error("failed to fetch result page: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Top-level errors for the query-session controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Local precondition failure: no scope selected or empty query text.
    /// The session phase is left untouched and no network call is made.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("query job client error: {0}")]
    Client(#[from] ClientError),

    #[error(transparent)]
    Paginate(#[from] PaginateError),

    #[error("failed to load persisted session identity: {0}")]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}
