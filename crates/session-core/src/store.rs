use crate::{
    error::{SessionError, TransitionError},
    persist::{IdentityStore, models::SessionIdentity},
};
use chrono::Utc;
use model::{
    events::SessionEvent,
    job::JobId,
    records::{PageToken, Row},
    scope::DataScope,
    session::{QuerySession, SessionPhase},
};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::debug;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// The only mutation paths into a `QuerySession`. Anything else is rejected.
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// From any phase: select a scope and discard all dependent state.
    SelectScope(DataScope),
    /// From idle: a query was handed to the backend.
    Submitted,
    /// From provisioning: the backend assigned a job handle.
    JobStarted(JobId),
    /// From running: the job reached its success state.
    PollSucceeded,
    /// From running or provisioning: the session failed.
    PollFailed(String),
    /// From running: the user abandoned the session.
    Canceled,
    /// From succeeded: a result page arrived.
    PageAppended {
        rows: Vec<Row>,
        next_token: Option<PageToken>,
    },
}

impl SessionAction {
    pub fn name(&self) -> &'static str {
        match self {
            SessionAction::SelectScope(_) => "select_scope",
            SessionAction::Submitted => "submitted",
            SessionAction::JobStarted(_) => "job_started",
            SessionAction::PollSucceeded => "poll_succeeded",
            SessionAction::PollFailed(_) => "poll_failed",
            SessionAction::Canceled => "canceled",
            SessionAction::PageAppended { .. } => "page_appended",
        }
    }
}

/// Canonical owner of the query session for one UI surface.
///
/// All mutation goes through `apply`, which enforces the transition table,
/// mirrors identity changes into the durable store, and publishes a snapshot
/// plus a lifecycle event after every successful transition.
pub struct SessionStateStore {
    surface: String,
    session: QuerySession,
    identity: Arc<dyn IdentityStore>,
    snapshot_tx: watch::Sender<QuerySession>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl SessionStateStore {
    pub fn new(surface: impl Into<String>, identity: Arc<dyn IdentityStore>) -> Self {
        let session = QuerySession::new();
        let (snapshot_tx, _) = watch::channel(session.clone());
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        SessionStateStore {
            surface: surface.into(),
            session,
            identity,
            snapshot_tx,
            events_tx,
        }
    }

    pub fn surface(&self) -> &str {
        &self.surface
    }

    pub fn session(&self) -> &QuerySession {
        &self.session
    }

    pub fn subscribe(&self) -> watch::Receiver<QuerySession> {
        self.snapshot_tx.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    pub async fn apply(&mut self, action: SessionAction) -> Result<(), SessionError> {
        let action_name = action.name();
        let scope_before = self.session.scope.clone();
        let job_before = self.session.job_id.clone();

        let event = self.transition(action)?;
        debug!(
            surface = %self.surface,
            action = action_name,
            phase = %self.session.phase,
            "applied session transition"
        );

        if self.session.scope != scope_before || self.session.job_id != job_before {
            let record =
                SessionIdentity::new(self.session.scope.clone(), self.session.job_id.clone());
            self.identity.save_identity(&self.surface, &record).await?;
        }
        if let SessionEvent::ScopeSelected { scope, .. } = &event {
            self.identity.save_last_scope(&self.surface, scope).await?;
        }

        self.snapshot_tx.send_replace(self.session.clone());
        // Nobody listening is fine; events are advisory.
        let _ = self.events_tx.send(event);
        Ok(())
    }

    fn transition(&mut self, action: SessionAction) -> Result<SessionEvent, TransitionError> {
        let phase = self.session.phase;
        let rejected = |action: &SessionAction| TransitionError {
            from: phase,
            action: action.name(),
        };

        match action {
            SessionAction::SelectScope(scope) => {
                self.session = QuerySession {
                    scope: Some(scope.clone()),
                    ..QuerySession::new()
                };
                Ok(SessionEvent::ScopeSelected {
                    scope,
                    timestamp: Utc::now(),
                })
            }

            ref action @ SessionAction::Submitted => {
                let Some(scope) = self.session.scope.clone() else {
                    return Err(rejected(action));
                };
                if phase != SessionPhase::Idle {
                    return Err(rejected(action));
                }
                self.session.phase = SessionPhase::Provisioning;
                self.session.error_message = None;
                Ok(SessionEvent::QuerySubmitted {
                    scope,
                    timestamp: Utc::now(),
                })
            }

            SessionAction::JobStarted(job_id) => {
                if phase != SessionPhase::Provisioning {
                    return Err(TransitionError {
                        from: phase,
                        action: "job_started",
                    });
                }
                self.session.phase = SessionPhase::Running;
                self.session.job_id = Some(job_id.clone());
                self.session.error_message = None;
                Ok(SessionEvent::JobStarted {
                    job_id,
                    timestamp: Utc::now(),
                })
            }

            ref action @ SessionAction::PollSucceeded => {
                if phase != SessionPhase::Running {
                    return Err(rejected(action));
                }
                let Some(job_id) = self.session.job_id.clone() else {
                    return Err(rejected(action));
                };
                self.session.phase = SessionPhase::Succeeded;
                Ok(SessionEvent::JobSucceeded {
                    job_id,
                    timestamp: Utc::now(),
                })
            }

            ref action @ SessionAction::PollFailed(ref message) => {
                if phase != SessionPhase::Running && phase != SessionPhase::Provisioning {
                    return Err(rejected(action));
                }
                self.session.phase = SessionPhase::Failed;
                self.session.error_message = Some(message.clone());
                Ok(SessionEvent::JobFailed {
                    job_id: self.session.job_id.clone(),
                    error: message.clone(),
                    timestamp: Utc::now(),
                })
            }

            ref action @ SessionAction::Canceled => {
                if phase != SessionPhase::Running {
                    return Err(rejected(action));
                }
                let Some(job_id) = self.session.job_id.take() else {
                    return Err(rejected(action));
                };
                self.session.phase = SessionPhase::Canceled;
                Ok(SessionEvent::JobCanceled {
                    job_id,
                    timestamp: Utc::now(),
                })
            }

            ref action @ SessionAction::PageAppended {
                ref rows,
                ref next_token,
            } => {
                if phase != SessionPhase::Succeeded {
                    return Err(rejected(action));
                }
                let Some(job_id) = self.session.job_id.clone() else {
                    return Err(rejected(action));
                };
                let row_count = rows.len();
                self.session.rows.extend(rows.iter().cloned());
                self.session.pages_fetched += 1;
                self.session.continuation_token = next_token.clone();
                Ok(SessionEvent::PageFetched {
                    job_id,
                    row_count,
                    has_more: next_token.is_some(),
                    timestamp: Utc::now(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::memory::MemoryIdentityStore;
    use model::records::ColumnValue;
    use serde_json::json;

    fn store() -> SessionStateStore {
        SessionStateStore::new("explorer", Arc::new(MemoryIdentityStore::new()))
    }

    fn row(id: u64) -> Row {
        Row::new(vec![ColumnValue::new("id", json!(id))])
    }

    async fn drive_to_running(store: &mut SessionStateStore) {
        store
            .apply(SessionAction::SelectScope(DataScope::new("logs")))
            .await
            .unwrap();
        store.apply(SessionAction::Submitted).await.unwrap();
        store
            .apply(SessionAction::JobStarted(JobId::new("q-1")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn full_lifecycle_reaches_succeeded_with_rows() {
        let mut store = store();
        drive_to_running(&mut store).await;

        store.apply(SessionAction::PollSucceeded).await.unwrap();
        store
            .apply(SessionAction::PageAppended {
                rows: vec![row(1), row(2)],
                next_token: Some("p2".into()),
            })
            .await
            .unwrap();

        let session = store.session();
        assert_eq!(session.phase, SessionPhase::Succeeded);
        assert_eq!(session.rows.len(), 2);
        assert!(session.has_more());
        // A successful session never carries an error indicator.
        assert_eq!(session.error_message, None);
    }

    #[tokio::test]
    async fn select_scope_resets_from_every_phase() {
        // idle, provisioning, running, succeeded, failed, canceled
        for target in 0..6 {
            let mut store = store();
            match target {
                0 => {}
                1 => {
                    store
                        .apply(SessionAction::SelectScope(DataScope::new("logs")))
                        .await
                        .unwrap();
                    store.apply(SessionAction::Submitted).await.unwrap();
                }
                2 => drive_to_running(&mut store).await,
                3 => {
                    drive_to_running(&mut store).await;
                    store.apply(SessionAction::PollSucceeded).await.unwrap();
                }
                4 => {
                    drive_to_running(&mut store).await;
                    store
                        .apply(SessionAction::PollFailed("boom".into()))
                        .await
                        .unwrap();
                }
                _ => {
                    drive_to_running(&mut store).await;
                    store.apply(SessionAction::Canceled).await.unwrap();
                }
            }

            store
                .apply(SessionAction::SelectScope(DataScope::new("fresh")))
                .await
                .unwrap();

            let session = store.session();
            assert_eq!(session.phase, SessionPhase::Idle, "case {target}");
            assert_eq!(session.scope, Some(DataScope::new("fresh")));
            assert_eq!(session.job_id, None);
            assert!(session.rows.is_empty());
            assert_eq!(session.continuation_token, None);
            assert_eq!(session.error_message, None);
        }
    }

    #[tokio::test]
    async fn invalid_transitions_are_rejected() {
        let mut store = store();

        // No scope selected yet.
        assert!(store.apply(SessionAction::Submitted).await.is_err());
        assert!(store.apply(SessionAction::PollSucceeded).await.is_err());
        assert!(
            store
                .apply(SessionAction::JobStarted(JobId::new("q-1")))
                .await
                .is_err()
        );

        drive_to_running(&mut store).await;

        // Running: a second submission must go through SelectScope first.
        assert!(store.apply(SessionAction::Submitted).await.is_err());
        assert!(
            store
                .apply(SessionAction::PageAppended {
                    rows: vec![row(1)],
                    next_token: None,
                })
                .await
                .is_err()
        );

        store.apply(SessionAction::PollSucceeded).await.unwrap();
        assert!(store.apply(SessionAction::Canceled).await.is_err());

        // The rejected attempts changed nothing.
        assert_eq!(store.session().phase, SessionPhase::Succeeded);
    }

    #[tokio::test]
    async fn canceled_clears_job_id() {
        let mut store = store();
        drive_to_running(&mut store).await;

        store.apply(SessionAction::Canceled).await.unwrap();

        let session = store.session();
        assert_eq!(session.phase, SessionPhase::Canceled);
        assert_eq!(session.job_id, None);
    }

    #[tokio::test]
    async fn poll_failed_from_provisioning_carries_message() {
        let mut store = store();
        store
            .apply(SessionAction::SelectScope(DataScope::new("logs")))
            .await
            .unwrap();
        store.apply(SessionAction::Submitted).await.unwrap();

        store
            .apply(SessionAction::PollFailed("submit refused".into()))
            .await
            .unwrap();

        let session = store.session();
        assert_eq!(session.phase, SessionPhase::Failed);
        assert_eq!(session.error_message.as_deref(), Some("submit refused"));
    }

    #[tokio::test]
    async fn identity_changes_are_mirrored() {
        let identity = Arc::new(MemoryIdentityStore::new());
        let mut store = SessionStateStore::new("explorer", identity.clone());

        store
            .apply(SessionAction::SelectScope(DataScope::new("logs")))
            .await
            .unwrap();
        store.apply(SessionAction::Submitted).await.unwrap();
        store
            .apply(SessionAction::JobStarted(JobId::new("q-1")))
            .await
            .unwrap();

        let persisted = identity.load_identity("explorer").await.unwrap().unwrap();
        assert_eq!(persisted.scope, Some(DataScope::new("logs")));
        assert_eq!(persisted.job_id, Some(JobId::new("q-1")));
        assert_eq!(
            identity.load_last_scope("explorer").await.unwrap(),
            Some(DataScope::new("logs"))
        );
    }

    #[tokio::test]
    async fn snapshots_are_published_on_transition() {
        let mut store = store();
        let mut rx = store.subscribe();

        store
            .apply(SessionAction::SelectScope(DataScope::new("logs")))
            .await
            .unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().scope, Some(DataScope::new("logs")));
    }

    #[tokio::test]
    async fn events_follow_transition_order() {
        let mut store = store();
        let mut events = store.events();

        drive_to_running(&mut store).await;
        store.apply(SessionAction::PollSucceeded).await.unwrap();

        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::ScopeSelected { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::QuerySubmitted { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::JobStarted { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::JobSucceeded { .. }
        ));
    }

}
