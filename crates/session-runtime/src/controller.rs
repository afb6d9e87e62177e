use crate::{
    error::ControllerError,
    paginator::ResultPaginator,
    scheduler::PollingScheduler,
    settings::SessionSettings,
};
use job_client::api::JobApi;
use model::{
    events::SessionEvent,
    job::JobId,
    scope::DataScope,
    session::{QuerySession, SessionPhase},
};
use session_core::{
    locator::SessionLocator,
    persist::IdentityStore,
    store::{SessionAction, SessionStateStore},
};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, info, warn};

/// Composition root for one query-session surface.
///
/// Owns the state store, poll scheduler and paginator, and exposes the
/// user-facing operations: select a scope, submit a query, cancel it, page
/// through results, and restore a session from its locator.
pub struct QuerySessionController {
    client: Arc<dyn JobApi>,
    identity: Arc<dyn IdentityStore>,
    store: Arc<Mutex<SessionStateStore>>,
    scheduler: Arc<PollingScheduler>,
    paginator: Arc<ResultPaginator>,
    settings: SessionSettings,
    surface: String,
}

impl QuerySessionController {
    pub fn new(
        client: Arc<dyn JobApi>,
        identity: Arc<dyn IdentityStore>,
        surface: &str,
        settings: SessionSettings,
    ) -> Result<Self, ControllerError> {
        settings.validate()?;

        let store = Arc::new(Mutex::new(SessionStateStore::new(surface, identity.clone())));
        let paginator = Arc::new(ResultPaginator::new(client.clone(), store.clone()));
        let scheduler = Arc::new(PollingScheduler::new(
            client.clone(),
            store.clone(),
            paginator.clone(),
        ));

        Ok(QuerySessionController {
            client,
            identity,
            store,
            scheduler,
            paginator,
            settings,
            surface: surface.to_string(),
        })
    }

    /// Select the data partition to query. Discards any previous session
    /// state, including an in-flight job.
    pub async fn select_scope(&self, scope: DataScope) -> Result<(), ControllerError> {
        self.scheduler.stop();
        self.store
            .lock()
            .await
            .apply(SessionAction::SelectScope(scope))
            .await?;
        Ok(())
    }

    /// Submit `query_text` against the selected scope and start polling.
    ///
    /// Validation failures (empty text, no scope) surface before any state
    /// change or network call. A previous session, whatever its phase, is
    /// fully superseded.
    pub async fn submit_query(&self, query_text: &str) -> Result<JobId, ControllerError> {
        if query_text.trim().is_empty() {
            return Err(ControllerError::Validation(
                "query text is empty".to_string(),
            ));
        }

        self.scheduler.stop();

        let scope = {
            let mut guard = self.store.lock().await;
            let Some(scope) = guard.session().scope.clone() else {
                return Err(ControllerError::Validation(
                    "no data scope selected".to_string(),
                ));
            };
            if guard.session().phase != SessionPhase::Idle {
                guard
                    .apply(SessionAction::SelectScope(scope.clone()))
                    .await?;
            }
            guard.apply(SessionAction::Submitted).await?;
            scope
        };

        match self.client.submit(&scope, query_text).await {
            Ok(job_id) => {
                self.store
                    .lock()
                    .await
                    .apply(SessionAction::JobStarted(job_id.clone()))
                    .await?;
                self.scheduler
                    .start(job_id.clone(), self.settings.poll_interval);
                info!(surface = %self.surface, %job_id, "query job started");
                Ok(job_id)
            }
            Err(err) => {
                let mut guard = self.store.lock().await;
                // The session may already have been superseded while the
                // submit was in flight; only mark failure if still ours.
                if guard.session().phase == SessionPhase::Provisioning {
                    guard
                        .apply(SessionAction::PollFailed(err.to_string()))
                        .await?;
                }
                Err(err.into())
            }
        }
    }

    /// Abandon the running job. Polling stops before this returns; the remote
    /// cancel is fire-and-forget and its failure never blocks the session.
    pub async fn cancel_query(&self) -> Result<(), ControllerError> {
        self.scheduler.stop();

        let mut guard = self.store.lock().await;
        if guard.session().phase != SessionPhase::Running {
            debug!(surface = %self.surface, phase = %guard.session().phase, "cancel requested outside running; ignoring");
            return Ok(());
        }

        if let Some(job_id) = guard.session().job_id.clone() {
            let client = self.client.clone();
            tokio::spawn(async move {
                if let Err(err) = client.cancel(&job_id).await {
                    warn!(%job_id, error = %err, "remote cancel failed; session abandoned locally");
                }
            });
        }

        guard.apply(SessionAction::Canceled).await?;
        Ok(())
    }

    /// Fetch the next result page. Returns `false` when there is nothing to
    /// do (exhausted, not succeeded, or a fetch already in flight).
    pub async fn load_more(&self) -> Result<bool, ControllerError> {
        Ok(self.paginator.load_more().await?)
    }

    /// Rebuild session identity from a locator, falling back to the durable
    /// store when none is given, and resume polling if a job was attached.
    ///
    /// Hydration replays the canonical transitions rather than teleporting
    /// state, so every invariant of the transition table holds for restored
    /// sessions; the first poll reconciles against the backend's actual job
    /// status.
    pub async fn restore(&self, locator: Option<SessionLocator>) -> Result<(), ControllerError> {
        let (scope, job_id) = match locator {
            Some(locator) => (locator.scope, locator.job_id),
            None => match self.identity.load_identity(&self.surface).await? {
                Some(identity) => (identity.scope, identity.job_id),
                None => (None, None),
            },
        };

        let scope = match scope {
            Some(scope) => Some(scope),
            None => self.identity.load_last_scope(&self.surface).await?,
        };

        let Some(scope) = scope else {
            if job_id.is_some() {
                return Err(ControllerError::Validation(
                    "cannot restore a job without a scope".to_string(),
                ));
            }
            debug!(surface = %self.surface, "nothing to restore");
            return Ok(());
        };

        let mut guard = self.store.lock().await;
        guard.apply(SessionAction::SelectScope(scope)).await?;

        if let Some(job_id) = job_id {
            guard.apply(SessionAction::Submitted).await?;
            guard
                .apply(SessionAction::JobStarted(job_id.clone()))
                .await?;
            drop(guard);
            info!(surface = %self.surface, %job_id, "restored session; resuming polling");
            self.scheduler.start(job_id, self.settings.poll_interval);
        }
        Ok(())
    }

    /// Current session state for rendering.
    pub async fn snapshot(&self) -> QuerySession {
        self.store.lock().await.session().clone()
    }

    /// Watch channel following every session transition.
    pub async fn subscribe(&self) -> watch::Receiver<QuerySession> {
        self.store.lock().await.subscribe()
    }

    /// Lifecycle events in transition order.
    pub async fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.store.lock().await.events()
    }

    /// Shareable locator for the current session identity, if any.
    pub async fn locator(&self) -> Option<SessionLocator> {
        SessionLocator::for_session(self.store.lock().await.session())
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_polling()
    }
}
