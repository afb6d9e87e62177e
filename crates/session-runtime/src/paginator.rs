use crate::error::PaginateError;
use job_client::api::JobApi;
use model::session::SessionPhase;
use session_core::store::{SessionAction, SessionStateStore};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::Mutex;
use tracing::debug;

/// Serially accumulates result pages into the session.
///
/// At most one `fetch_page` call is outstanding at any time: concurrent
/// invocations are no-ops, which keeps page appends ordered and duplicate-free.
pub struct ResultPaginator {
    client: Arc<dyn JobApi>,
    store: Arc<Mutex<SessionStateStore>>,
    in_flight: AtomicBool,
}

impl ResultPaginator {
    pub fn new(client: Arc<dyn JobApi>, store: Arc<Mutex<SessionStateStore>>) -> Self {
        ResultPaginator {
            client,
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Fetch the next page: the first page when none has landed yet,
    /// otherwise the page behind the session's continuation token.
    ///
    /// Returns `Ok(false)` when there is nothing to do: the result set is
    /// exhausted, a fetch is already in flight, or the session is not in the
    /// succeeded phase. Failures are non-fatal for the session.
    pub async fn load_more(&self) -> Result<bool, PaginateError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        let result = self.fetch_inner().await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn fetch_inner(&self) -> Result<bool, PaginateError> {
        let (job_id, token) = {
            let guard = self.store.lock().await;
            let session = guard.session();
            if session.phase != SessionPhase::Succeeded {
                return Ok(false);
            }
            let Some(job_id) = session.job_id.clone() else {
                return Ok(false);
            };

            if session.pages_fetched == 0 {
                (job_id, None)
            } else {
                let Some(token) = session.continuation_token.clone() else {
                    return Ok(false);
                };
                (job_id, Some(token))
            }
        };

        let page = self.client.fetch_page(&job_id, token.as_ref()).await?;

        let mut guard = self.store.lock().await;
        if guard.session().job_id.as_ref() != Some(&job_id) {
            debug!(%job_id, "session moved on; dropping fetched page");
            return Ok(false);
        }
        guard
            .apply(SessionAction::PageAppended {
                rows: page.rows,
                next_token: page.next_token,
            })
            .await?;
        Ok(true)
    }
}
