use crate::{
    error::PersistError,
    persist::{IdentityStore, models::SessionIdentity},
};
use async_trait::async_trait;
use model::scope::DataScope;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory identity store for ephemeral surfaces and tests.
#[derive(Default)]
pub struct MemoryIdentityStore {
    identities: RwLock<HashMap<String, SessionIdentity>>,
    scopes: RwLock<HashMap<String, DataScope>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn save_identity(
        &self,
        surface: &str,
        identity: &SessionIdentity,
    ) -> Result<(), PersistError> {
        self.identities
            .write()
            .await
            .insert(surface.to_string(), identity.clone());
        Ok(())
    }

    async fn load_identity(&self, surface: &str) -> Result<Option<SessionIdentity>, PersistError> {
        Ok(self.identities.read().await.get(surface).cloned())
    }

    async fn save_last_scope(&self, surface: &str, scope: &DataScope) -> Result<(), PersistError> {
        self.scopes
            .write()
            .await
            .insert(surface.to_string(), scope.clone());
        Ok(())
    }

    async fn load_last_scope(&self, surface: &str) -> Result<Option<DataScope>, PersistError> {
        Ok(self.scopes.read().await.get(surface).cloned())
    }
}
