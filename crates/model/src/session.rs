use crate::{
    job::JobId,
    records::{PageToken, Row},
    scope::DataScope,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of a query session. Exactly one session is active per
/// surface, and exactly one phase is observable at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Provisioning,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Provisioning => "provisioning",
            SessionPhase::Running => "running",
            SessionPhase::Succeeded => "succeeded",
            SessionPhase::Failed => "failed",
            SessionPhase::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionPhase::Succeeded | SessionPhase::Failed | SessionPhase::Canceled
        )
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one query lifecycle attempt.
///
/// Invariants maintained by the transition table in `session-core`:
/// - `job_id` is present only in running/succeeded/failed/canceled;
/// - `rows` is non-empty only in succeeded;
/// - `error_message` is present only in failed;
/// - changing scope resets job, rows and continuation token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySession {
    pub scope: Option<DataScope>,
    pub job_id: Option<JobId>,
    pub phase: SessionPhase,
    pub error_message: Option<String>,
    /// Result rows accumulated so far, append-only while more pages exist.
    pub rows: Vec<Row>,
    /// Pages appended so far. Zero means the first page has not landed yet,
    /// which is distinct from a legitimately empty result set.
    pub pages_fetched: usize,
    pub continuation_token: Option<PageToken>,
}

impl QuerySession {
    pub fn new() -> Self {
        QuerySession {
            scope: None,
            job_id: None,
            phase: SessionPhase::Idle,
            error_message: None,
            rows: Vec::new(),
            pages_fetched: 0,
            continuation_token: None,
        }
    }

    /// Whether a further result page can be requested: either the first page
    /// has not landed yet, or a continuation token remains.
    pub fn has_more(&self) -> bool {
        self.phase == SessionPhase::Succeeded
            && (self.pages_fetched == 0 || self.continuation_token.is_some())
    }
}

impl Default for QuerySession {
    fn default() -> Self {
        Self::new()
    }
}
