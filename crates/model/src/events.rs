use crate::{job::JobId, scope::DataScope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted over the lifetime of a query session, in the order the
/// transitions were applied. Consumed by presentation layers and audit sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A data scope was selected; any previous session state was discarded.
    ScopeSelected {
        scope: DataScope,
        timestamp: DateTime<Utc>,
    },

    /// A query was handed to the backend for provisioning.
    QuerySubmitted {
        scope: DataScope,
        timestamp: DateTime<Utc>,
    },

    /// The backend assigned a job handle; polling begins.
    JobStarted {
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },

    /// The job reached its success state; results are available.
    JobSucceeded {
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },

    /// The session failed, either in provisioning or while running.
    JobFailed {
        job_id: Option<JobId>,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// The user abandoned the session; the job handle was released.
    JobCanceled {
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },

    /// A result page was appended to the session.
    PageFetched {
        job_id: JobId,
        row_count: usize,
        has_more: bool,
        timestamp: DateTime<Utc>,
    },
}
