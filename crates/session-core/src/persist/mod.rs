use crate::error::PersistError;
use async_trait::async_trait;
use model::scope::DataScope;

pub mod memory;
pub mod models;
pub mod sled_store;

pub use models::SessionIdentity;

/// Durable store for session identity: the `{scope, job_id}` pair that lets a
/// restarted process reattach to its query session. Results are never
/// persisted; they are re-fetched from the backend.
///
/// Writes are last-write-wins per surface. Only one session is active per
/// surface at a time, so no merge semantics are needed.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn save_identity(
        &self,
        surface: &str,
        identity: &SessionIdentity,
    ) -> Result<(), PersistError>;

    async fn load_identity(&self, surface: &str) -> Result<Option<SessionIdentity>, PersistError>;

    /// The last scope the user selected on this surface, kept even after the
    /// session identity is cleared. Used as a fallback when no locator is
    /// provided.
    async fn save_last_scope(&self, surface: &str, scope: &DataScope) -> Result<(), PersistError>;

    async fn load_last_scope(&self, surface: &str) -> Result<Option<DataScope>, PersistError>;
}
