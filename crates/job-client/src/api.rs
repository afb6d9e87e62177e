use crate::error::ClientError;
use async_trait::async_trait;
use model::{
    job::{JobId, JobStatus},
    records::{Page, PageToken},
    scope::DataScope,
};

/// Status report for one poll of a query job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPoll {
    pub status: JobStatus,
    /// Human-readable failure reason, present when `status` is failed.
    pub error: Option<String>,
}

impl JobPoll {
    pub fn new(status: JobStatus) -> Self {
        JobPoll {
            status,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        JobPoll {
            status: JobStatus::Failed,
            error: Some(message.into()),
        }
    }
}

/// Boundary to the remote query-job API.
///
/// All operations are asynchronous and may fail with a transport error.
/// `poll_status` is an idempotent read and safe to call repeatedly.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Provision a query job for `query_text` against `scope`.
    /// Fails with `ClientError::Validation` when the query text is empty.
    async fn submit(&self, scope: &DataScope, query_text: &str) -> Result<JobId, ClientError>;

    /// Report the job's current lifecycle status.
    async fn poll_status(&self, job_id: &JobId) -> Result<JobPoll, ClientError>;

    /// Fetch the next result page. `token: None` requests the first page;
    /// the returned page carries `next_token: None` once exhausted.
    async fn fetch_page(
        &self,
        job_id: &JobId,
        token: Option<&PageToken>,
    ) -> Result<Page, ClientError>;

    /// Request cancellation of an executing job. Best-effort: callers abandon
    /// the session locally regardless of the outcome.
    async fn cancel(&self, job_id: &JobId) -> Result<(), ClientError>;
}
