use model::{
    job::{JobId, JobStatus},
    records::{PageToken, Row},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outgoing GraphQL request body: a static operation document plus variables.
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<V: Serialize> {
    pub query: &'static str,
    pub variables: V,
}

/// Standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphQlEnvelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVars<'a> {
    pub scope: &'a str,
    pub sql: &'a str,
    /// Client-generated idempotency id for the submission.
    pub request_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobVars<'a> {
    pub job_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageVars<'a> {
    pub job_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitData {
    pub submit_query_job: SubmitReply,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReply {
    pub job_id: JobId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    pub query_job_status: StatusReply,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReply {
    pub status: JobStatus,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub query_job_results: PageReply,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReply {
    pub rows: Vec<Row>,
    pub next_token: Option<PageToken>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelData {
    pub cancel_query_job: CancelReply,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReply {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_status_envelope() {
        let body = json!({
            "data": {
                "queryJobStatus": { "status": "running", "error": null }
            }
        });

        let envelope: GraphQlEnvelope<StatusData> = serde_json::from_value(body).unwrap();
        let reply = envelope.data.unwrap().query_job_status;
        assert_eq!(reply.status, JobStatus::Running);
        assert!(reply.error.is_none());
        assert!(envelope.errors.is_empty());
    }

    #[test]
    fn decodes_error_envelope_without_data() {
        let body = json!({
            "data": null,
            "errors": [{ "message": "scope not found" }]
        });

        let envelope: GraphQlEnvelope<StatusData> = serde_json::from_value(body).unwrap();
        assert!(envelope.data.is_none());
        assert_eq!(envelope.errors[0].message, "scope not found");
    }

    #[test]
    fn page_vars_omit_absent_token() {
        let vars = PageVars {
            job_id: "q-1",
            token: None,
        };
        let encoded = serde_json::to_value(&vars).unwrap();
        assert_eq!(encoded, json!({ "jobId": "q-1" }));
    }
}
