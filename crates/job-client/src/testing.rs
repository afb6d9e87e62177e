//! Scripted in-memory implementation of the job boundary.
//!
//! Plays back pre-programmed poll outcomes and result pages, records every
//! call, and can hold individual operations at a gate so tests can interleave
//! responses deterministically.

use crate::{
    api::{JobApi, JobPoll},
    error::ClientError,
};
use async_trait::async_trait;
use model::{
    job::JobId,
    records::{Page, PageToken},
    scope::DataScope,
};
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio::sync::Notify;

#[derive(Default)]
struct Script {
    job_queue: VecDeque<JobId>,
    polls: HashMap<JobId, VecDeque<JobPoll>>,
    pages: HashMap<JobId, VecDeque<Page>>,
    poll_gates: HashMap<JobId, Arc<Notify>>,
    fetch_gate: Option<Arc<Notify>>,
    submit_failure: Option<String>,
    fetch_failure: Option<String>,
    cancel_failure: Option<String>,
}

#[derive(Default)]
struct CallStats {
    submits: AtomicUsize,
    polls: AtomicUsize,
    fetches: AtomicUsize,
    cancels: AtomicUsize,
    fetches_in_flight: AtomicUsize,
    max_concurrent_fetches: AtomicUsize,
}

#[derive(Default)]
pub struct ScriptedJobClient {
    script: Mutex<Script>,
    stats: CallStats,
}

impl ScriptedJobClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("script lock poisoned")
    }

    /// Queue the job id the next `submit` call will return.
    pub fn enqueue_job(&self, job_id: &str) {
        self.script().job_queue.push_back(JobId::new(job_id));
    }

    /// Append a poll outcome for `job_id`. The final queued outcome repeats
    /// on every subsequent poll, like an idempotent read of a settled job.
    pub fn script_poll(&self, job_id: &str, poll: JobPoll) {
        self.script()
            .polls
            .entry(JobId::new(job_id))
            .or_default()
            .push_back(poll);
    }

    /// Append a result page for `job_id`, served in FIFO order.
    pub fn script_page(&self, job_id: &str, page: Page) {
        self.script()
            .pages
            .entry(JobId::new(job_id))
            .or_default()
            .push_back(page);
    }

    /// Park every `poll_status` call for `job_id` until `release_polls`.
    pub fn hold_polls(&self, job_id: &str) {
        self.script()
            .poll_gates
            .insert(JobId::new(job_id), Arc::new(Notify::new()));
    }

    /// Release one parked poll for `job_id` and lift the gate.
    pub fn release_polls(&self, job_id: &str) {
        if let Some(gate) = self.script().poll_gates.remove(&JobId::new(job_id)) {
            gate.notify_one();
        }
    }

    /// Park every `fetch_page` call until `release_fetches`.
    pub fn hold_fetches(&self) {
        self.script().fetch_gate = Some(Arc::new(Notify::new()));
    }

    pub fn release_fetches(&self) {
        if let Some(gate) = self.script().fetch_gate.take() {
            gate.notify_one();
        }
    }

    pub fn fail_next_submit(&self, message: &str) {
        self.script().submit_failure = Some(message.to_string());
    }

    pub fn fail_fetches(&self, message: &str) {
        self.script().fetch_failure = Some(message.to_string());
    }

    pub fn fail_cancels(&self, message: &str) {
        self.script().cancel_failure = Some(message.to_string());
    }

    pub fn submit_calls(&self) -> usize {
        self.stats.submits.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> usize {
        self.stats.polls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.stats.fetches.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.stats.cancels.load(Ordering::SeqCst)
    }

    /// Highest number of `fetch_page` calls ever outstanding at once.
    pub fn max_concurrent_fetches(&self) -> usize {
        self.stats.max_concurrent_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobApi for ScriptedJobClient {
    async fn submit(&self, scope: &DataScope, query_text: &str) -> Result<JobId, ClientError> {
        self.stats.submits.fetch_add(1, Ordering::SeqCst);

        if query_text.trim().is_empty() {
            return Err(ClientError::Validation("query text is empty".to_string()));
        }
        if scope.as_str().is_empty() {
            return Err(ClientError::Validation("data scope is empty".to_string()));
        }

        let mut script = self.script();
        if let Some(message) = script.submit_failure.take() {
            return Err(ClientError::Transport(message));
        }
        script
            .job_queue
            .pop_front()
            .ok_or_else(|| ClientError::Api("no job scripted for submit".to_string()))
    }

    async fn poll_status(&self, job_id: &JobId) -> Result<JobPoll, ClientError> {
        self.stats.polls.fetch_add(1, Ordering::SeqCst);

        let gate = self.script().poll_gates.get(job_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut script = self.script();
        let queue = script
            .polls
            .get_mut(job_id)
            .ok_or_else(|| ClientError::Api(format!("no polls scripted for job {job_id}")))?;

        if queue.len() > 1 {
            Ok(queue.pop_front().expect("non-empty queue"))
        } else {
            queue
                .front()
                .cloned()
                .ok_or_else(|| ClientError::Api(format!("no polls scripted for job {job_id}")))
        }
    }

    async fn fetch_page(
        &self,
        job_id: &JobId,
        _token: Option<&PageToken>,
    ) -> Result<Page, ClientError> {
        self.stats.fetches.fetch_add(1, Ordering::SeqCst);
        let outstanding = self.stats.fetches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats
            .max_concurrent_fetches
            .fetch_max(outstanding, Ordering::SeqCst);

        let gate = self.script().fetch_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let result = {
            let mut script = self.script();
            if let Some(message) = script.fetch_failure.clone() {
                Err(ClientError::Transport(message))
            } else {
                script
                    .pages
                    .get_mut(job_id)
                    .and_then(VecDeque::pop_front)
                    .ok_or_else(|| ClientError::Api(format!("no pages scripted for job {job_id}")))
            }
        };

        self.stats.fetches_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn cancel(&self, _job_id: &JobId) -> Result<(), ClientError> {
        self.stats.cancels.fetch_add(1, Ordering::SeqCst);

        match self.script().cancel_failure.clone() {
            Some(message) => Err(ClientError::Transport(message)),
            None => Ok(()),
        }
    }
}
