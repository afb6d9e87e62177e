use model::session::SessionPhase;
use thiserror::Error;

/// A `SessionAction` was applied from a phase the transition table does not
/// permit. This is a programmer error: callers must sequence actions through
/// the controller, and tests assert these are raised, never swallowed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid transition: {action} is not permitted from phase {from}")]
pub struct TransitionError {
    pub from: SessionPhase,
    pub action: &'static str,
}

/// Errors from the durable identity store.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state store error: {0}")]
    Sled(#[from] sled::Error),

    #[error("failed to encode identity record: {0}")]
    Encode(#[from] bincode::Error),
}

/// Errors surfaced by `SessionStateStore::apply`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("failed to persist session identity: {0}")]
    Persist(#[from] PersistError),
}

/// Errors parsing a session locator string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("malformed locator segment: {0}")]
    Malformed(String),

    #[error("unknown locator key: {0}")]
    UnknownKey(String),

    #[error("locator carries neither a scope nor a job id")]
    Empty,
}
