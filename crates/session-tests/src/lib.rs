#![allow(dead_code)]

use job_client::{api::JobApi, testing::ScriptedJobClient};
use session_core::persist::{IdentityStore, memory::MemoryIdentityStore};
use session_runtime::{controller::QuerySessionController, settings::SessionSettings};
use std::{sync::Arc, time::Duration};

pub mod utils;

pub const SURFACE: &str = "explorer";
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A controller wired to a fresh scripted client and in-memory identity store.
pub fn controller() -> (Arc<QuerySessionController>, Arc<ScriptedJobClient>) {
    controller_with_identity(Arc::new(MemoryIdentityStore::new()))
}

/// Same, but over a caller-provided identity store (shared across
/// controllers to exercise restore paths).
pub fn controller_with_identity(
    identity: Arc<dyn IdentityStore>,
) -> (Arc<QuerySessionController>, Arc<ScriptedJobClient>) {
    let client = Arc::new(ScriptedJobClient::new());
    let api: Arc<dyn JobApi> = client.clone();
    let controller = QuerySessionController::new(
        api,
        identity,
        SURFACE,
        SessionSettings::with_poll_interval(POLL_INTERVAL),
    )
    .expect("valid settings");
    (Arc::new(controller), client)
}
