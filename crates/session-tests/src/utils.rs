#![allow(dead_code)]

use job_client::{api::JobPoll, testing::ScriptedJobClient};
use model::{
    job::JobStatus,
    records::{ColumnValue, Page, Row},
    session::QuerySession,
};
use serde_json::json;
use session_runtime::controller::QuerySessionController;

/// A detection-result row with a numeric id and a fixed source column.
pub fn row(id: u64) -> Row {
    Row::new(vec![
        ColumnValue::new("id", json!(id)),
        ColumnValue::new("source", json!("cloudtrail")),
    ])
}

pub fn page(ids: &[u64], next: Option<&str>) -> Page {
    Page {
        rows: ids.iter().copied().map(row).collect(),
        next_token: next.map(Into::into),
    }
}

/// Script `job` to report running once, then succeed, serving `pages` in order.
pub fn script_success(client: &ScriptedJobClient, job: &str, pages: Vec<Page>) {
    client.enqueue_job(job);
    client.script_poll(job, JobPoll::new(JobStatus::Running));
    client.script_poll(job, JobPoll::new(JobStatus::Succeeded));
    for p in pages {
        client.script_page(job, p);
    }
}

/// Block until the session satisfies `pred`, returning the matching snapshot.
/// Paused test time auto-advances while waiting, so poll timers fire.
pub async fn wait_for(
    controller: &QuerySessionController,
    pred: impl Fn(&QuerySession) -> bool,
) -> QuerySession {
    let mut rx = controller.subscribe().await;
    rx.wait_for(|s| pred(s)).await.expect("state watch closed").clone()
}

/// The `id` column of every accumulated row, in order.
pub fn row_ids(session: &QuerySession) -> Vec<u64> {
    session
        .rows
        .iter()
        .filter_map(|r| r.get("id").and_then(|v| v.as_u64()))
        .collect()
}
