use crate::{
    api::{JobApi, JobPoll},
    error::ClientError,
    types::{
        CancelData, GraphQlEnvelope, GraphQlRequest, JobVars, PageData, PageVars, StatusData,
        SubmitData, SubmitVars,
    },
};
use async_trait::async_trait;
use model::{
    job::JobId,
    records::{Page, PageToken},
    scope::DataScope,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;
use uuid::Uuid;

const ENDPOINT_ENV: &str = "SIFT_ENDPOINT";
const TOKEN_ENV: &str = "SIFT_TOKEN";

const SUBMIT_QUERY_JOB: &str = r#"
mutation SubmitQueryJob($scope: String!, $sql: String!, $requestId: ID!) {
  submitQueryJob(input: { scope: $scope, sql: $sql, requestId: $requestId }) {
    jobId
  }
}"#;

const QUERY_JOB_STATUS: &str = r#"
query QueryJobStatus($jobId: ID!) {
  queryJobStatus(jobId: $jobId) {
    status
    error
  }
}"#;

const QUERY_JOB_RESULTS: &str = r#"
query QueryJobResults($jobId: ID!, $token: String) {
  queryJobResults(jobId: $jobId, token: $token) {
    rows {
      columns {
        name
        value
      }
    }
    nextToken
  }
}"#;

const CANCEL_QUERY_JOB: &str = r#"
mutation CancelQueryJob($jobId: ID!) {
  cancelQueryJob(jobId: $jobId) {
    success
  }
}"#;

/// GraphQL-shaped HTTP implementation of the query-job boundary.
pub struct HttpJobClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpJobClient {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        HttpJobClient {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token,
        }
    }

    /// Builds a client from `SIFT_ENDPOINT` / `SIFT_TOKEN`.
    pub fn from_env() -> Result<Self, ClientError> {
        let endpoint = std::env::var(ENDPOINT_ENV)
            .map_err(|_| ClientError::Validation(format!("{ENDPOINT_ENV} is not set")))?;
        let token = std::env::var(TOKEN_ENV).ok();
        Ok(Self::new(endpoint, token))
    }

    async fn execute<V, T>(&self, document: &'static str, variables: V) -> Result<T, ClientError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let mut request = self.http.post(&self.endpoint).json(&GraphQlRequest {
            query: document,
            variables,
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;
        let body = response.bytes().await?;
        let envelope: GraphQlEnvelope<T> = serde_json::from_slice(&body)?;

        if !envelope.errors.is_empty() {
            let messages: Vec<&str> = envelope
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect();
            return Err(ClientError::Api(messages.join("; ")));
        }

        envelope
            .data
            .ok_or_else(|| ClientError::Api("response carried no data".to_string()))
    }
}

#[async_trait]
impl JobApi for HttpJobClient {
    async fn submit(&self, scope: &DataScope, query_text: &str) -> Result<JobId, ClientError> {
        if query_text.trim().is_empty() {
            return Err(ClientError::Validation("query text is empty".to_string()));
        }
        if scope.as_str().is_empty() {
            return Err(ClientError::Validation("data scope is empty".to_string()));
        }

        let request_id = Uuid::new_v4();
        debug!(scope = %scope, %request_id, "submitting query job");

        let data: SubmitData = self
            .execute(
                SUBMIT_QUERY_JOB,
                SubmitVars {
                    scope: scope.as_str(),
                    sql: query_text,
                    request_id,
                },
            )
            .await?;

        Ok(data.submit_query_job.job_id)
    }

    async fn poll_status(&self, job_id: &JobId) -> Result<JobPoll, ClientError> {
        let data: StatusData = self
            .execute(
                QUERY_JOB_STATUS,
                JobVars {
                    job_id: job_id.as_str(),
                },
            )
            .await?;

        let reply = data.query_job_status;
        Ok(JobPoll {
            status: reply.status,
            error: reply.error,
        })
    }

    async fn fetch_page(
        &self,
        job_id: &JobId,
        token: Option<&PageToken>,
    ) -> Result<Page, ClientError> {
        let data: PageData = self
            .execute(
                QUERY_JOB_RESULTS,
                PageVars {
                    job_id: job_id.as_str(),
                    token: token.map(PageToken::as_str),
                },
            )
            .await?;

        let reply = data.query_job_results;
        Ok(Page {
            rows: reply.rows,
            next_token: reply.next_token,
        })
    }

    async fn cancel(&self, job_id: &JobId) -> Result<(), ClientError> {
        let data: CancelData = self
            .execute(
                CANCEL_QUERY_JOB,
                JobVars {
                    job_id: job_id.as_str(),
                },
            )
            .await?;

        if !data.cancel_query_job.success {
            return Err(ClientError::Api(format!(
                "backend declined to cancel job {job_id}"
            )));
        }
        Ok(())
    }
}
