use crate::paginator::ResultPaginator;
use job_client::api::{JobApi, JobPoll};
use model::job::{JobId, JobStatus};
use session_core::store::{SessionAction, SessionStateStore};
use std::{
    sync::{
        Arc, Mutex as StdMutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{sync::Mutex, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

struct ActivePoll {
    job_id: JobId,
    cancel: CancellationToken,
    generation: u64,
}

/// Drives repeated status polls for the session's in-flight job.
///
/// At most one poll loop is logically active per session. Every `start`
/// increments a generation counter; an in-flight poll response is discarded
/// unless its generation still matches AND the session still tracks its job,
/// so a response resolving after `stop()` or after a newer submission can
/// never mutate state.
pub struct PollingScheduler {
    client: Arc<dyn JobApi>,
    store: Arc<Mutex<SessionStateStore>>,
    paginator: Arc<ResultPaginator>,
    generation: Arc<AtomicU64>,
    active: Arc<StdMutex<Option<ActivePoll>>>,
}

impl PollingScheduler {
    pub fn new(
        client: Arc<dyn JobApi>,
        store: Arc<Mutex<SessionStateStore>>,
        paginator: Arc<ResultPaginator>,
    ) -> Self {
        PollingScheduler {
            client,
            store,
            paginator,
            generation: Arc::new(AtomicU64::new(0)),
            active: Arc::new(StdMutex::new(None)),
        }
    }

    /// Begin polling `job_id` every `interval`. Starting for the job already
    /// being polled is a no-op; starting for a new job stops the previous
    /// loop first.
    pub fn start(&self, job_id: JobId, interval: Duration) {
        let mut active = self.active.lock().expect("scheduler lock poisoned");
        if let Some(current) = active.as_ref() {
            if current.job_id == job_id && !current.cancel.is_cancelled() {
                debug!(%job_id, "poll loop already active for job");
                return;
            }
            current.cancel.cancel();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        *active = Some(ActivePoll {
            job_id: job_id.clone(),
            cancel: cancel.clone(),
            generation,
        });
        drop(active);

        debug!(%job_id, generation, interval_ms = interval.as_millis() as u64, "starting poll loop");

        let client = self.client.clone();
        let store = self.store.clone();
        let paginator = self.paginator.clone();
        let counter = self.generation.clone();
        let slot = self.active.clone();
        tokio::spawn(async move {
            poll_loop(
                client, store, paginator, counter, generation, job_id, interval, cancel,
            )
            .await;

            let mut active = slot.lock().expect("scheduler lock poisoned");
            if active.as_ref().map(|a| a.generation) == Some(generation) {
                *active = None;
            }
        });
    }

    /// Cancel the pending timer. Safe to call when already idle. Any poll
    /// response still in flight is superseded and will be discarded.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(current) = self
            .active
            .lock()
            .expect("scheduler lock poisoned")
            .take()
        {
            debug!(job_id = %current.job_id, "stopping poll loop");
            current.cancel.cancel();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.active
            .lock()
            .expect("scheduler lock poisoned")
            .is_some()
    }
}

#[allow(clippy::too_many_arguments)]
async fn poll_loop(
    client: Arc<dyn JobApi>,
    store: Arc<Mutex<SessionStateStore>>,
    paginator: Arc<ResultPaginator>,
    counter: Arc<AtomicU64>,
    generation: u64,
    job_id: JobId,
    interval: Duration,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = time::sleep(interval) => {}
        }
        if cancel.is_cancelled() {
            break;
        }

        let poll = client.poll_status(&job_id).await;

        // The response may have raced with stop() or a newer submission.
        if cancel.is_cancelled() || counter.load(Ordering::SeqCst) != generation {
            debug!(%job_id, generation, "discarding stale poll response");
            break;
        }

        let mut guard = store.lock().await;
        if guard.session().job_id.as_ref() != Some(&job_id) {
            debug!(%job_id, "session moved on; discarding poll response");
            break;
        }

        let outcome = match poll {
            Ok(outcome) => outcome,
            Err(err) => {
                apply_or_warn(&mut guard, SessionAction::PollFailed(err.to_string()), &job_id)
                    .await;
                break;
            }
        };

        match outcome.status {
            JobStatus::Provisioning | JobStatus::Running => {
                drop(guard);
            }
            JobStatus::Succeeded => {
                apply_or_warn(&mut guard, SessionAction::PollSucceeded, &job_id).await;
                drop(guard);
                if let Err(err) = paginator.load_more().await {
                    warn!(%job_id, error = %err, "initial result fetch failed");
                }
                break;
            }
            JobStatus::Failed => {
                let message = failure_message(outcome);
                apply_or_warn(&mut guard, SessionAction::PollFailed(message), &job_id).await;
                break;
            }
            JobStatus::Canceled => {
                apply_or_warn(&mut guard, SessionAction::Canceled, &job_id).await;
                break;
            }
        }
    }
}

fn failure_message(outcome: JobPoll) -> String {
    outcome
        .error
        .unwrap_or_else(|| "query job failed".to_string())
}

async fn apply_or_warn(store: &mut SessionStateStore, action: SessionAction, job_id: &JobId) {
    if let Err(err) = store.apply(action).await {
        warn!(%job_id, error = %err, "failed to apply poll transition");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_client::testing::ScriptedJobClient;
    use model::{
        records::{ColumnValue, Page, Row},
        scope::DataScope,
        session::SessionPhase,
    };
    use serde_json::json;
    use session_core::persist::memory::MemoryIdentityStore;

    const INTERVAL: Duration = Duration::from_millis(100);

    async fn harness(job: &str) -> (PollingScheduler, Arc<ScriptedJobClient>, Arc<Mutex<SessionStateStore>>) {
        let client = Arc::new(ScriptedJobClient::new());
        let store = Arc::new(Mutex::new(SessionStateStore::new(
            "test",
            Arc::new(MemoryIdentityStore::new()),
        )));

        {
            let mut guard = store.lock().await;
            guard
                .apply(SessionAction::SelectScope(DataScope::new("logs")))
                .await
                .unwrap();
            guard.apply(SessionAction::Submitted).await.unwrap();
            guard
                .apply(SessionAction::JobStarted(JobId::new(job)))
                .await
                .unwrap();
        }

        let api: Arc<dyn JobApi> = client.clone();
        let paginator = Arc::new(ResultPaginator::new(api.clone(), store.clone()));
        let scheduler = PollingScheduler::new(api, store.clone(), paginator);
        (scheduler, client, store)
    }

    #[tokio::test(start_paused = true)]
    async fn starting_same_job_twice_keeps_one_timer() {
        let (scheduler, client, _store) = harness("q-1").await;
        client.script_poll("q-1", JobPoll::new(JobStatus::Running));

        scheduler.start(JobId::new("q-1"), INTERVAL);
        scheduler.start(JobId::new("q-1"), INTERVAL);

        // Let the loop register its timer before firing it.
        tokio::task::yield_now().await;
        time::advance(INTERVAL).await;
        tokio::task::yield_now().await;
        assert_eq!(client.poll_calls(), 1);
        assert!(scheduler.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_halts_polling() {
        let (scheduler, client, _store) = harness("q-1").await;
        client.script_poll("q-1", JobPoll::new(JobStatus::Running));

        scheduler.start(JobId::new("q-1"), INTERVAL);
        scheduler.stop();
        scheduler.stop();

        time::advance(INTERVAL * 10).await;
        assert_eq!(client.poll_calls(), 0);
        assert!(!scheduler.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_status_stops_the_loop_and_primes_results() {
        let (scheduler, client, store) = harness("q-1").await;
        client.script_poll("q-1", JobPoll::new(JobStatus::Succeeded));
        client.script_page(
            "q-1",
            Page {
                rows: vec![Row::new(vec![ColumnValue::new("id", json!(1))])],
                next_token: None,
            },
        );

        let mut rx = store.lock().await.subscribe();
        scheduler.start(JobId::new("q-1"), INTERVAL);

        rx.wait_for(|s| s.phase == SessionPhase::Succeeded && !s.rows.is_empty())
            .await
            .unwrap();

        let polls_after_success = client.poll_calls();
        time::advance(INTERVAL * 10).await;
        assert_eq!(client.poll_calls(), polls_after_success);
        assert_eq!(store.lock().await.session().rows.len(), 1);
    }
}
