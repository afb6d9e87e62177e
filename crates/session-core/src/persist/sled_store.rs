use crate::{
    error::PersistError,
    persist::{IdentityStore, models::SessionIdentity},
};
use async_trait::async_trait;
use model::scope::DataScope;
use std::path::Path;

/// Sled-backed identity store. One tree, prefixed keys per record kind.
pub struct SledIdentityStore {
    db: sled::Db,
}

impl SledIdentityStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, sled::Error> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    #[inline]
    fn identity_key(surface: &str) -> String {
        format!("sid:{surface}")
    }

    #[inline]
    fn scope_key(surface: &str) -> String {
        format!("scope:{surface}")
    }
}

#[async_trait]
impl IdentityStore for SledIdentityStore {
    async fn save_identity(
        &self,
        surface: &str,
        identity: &SessionIdentity,
    ) -> Result<(), PersistError> {
        let bytes = bincode::serialize(identity)?;
        self.db.insert(Self::identity_key(surface), bytes)?;
        Ok(())
    }

    async fn load_identity(&self, surface: &str) -> Result<Option<SessionIdentity>, PersistError> {
        match self.db.get(Self::identity_key(surface))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save_last_scope(&self, surface: &str, scope: &DataScope) -> Result<(), PersistError> {
        self.db
            .insert(Self::scope_key(surface), scope.as_str().as_bytes())?;
        Ok(())
    }

    async fn load_last_scope(&self, surface: &str) -> Result<Option<DataScope>, PersistError> {
        match self.db.get(Self::scope_key(surface))? {
            Some(bytes) => Ok(Some(DataScope::new(String::from_utf8_lossy(&bytes)))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::job::JobId;
    use tempfile::tempdir;

    #[tokio::test]
    async fn identity_round_trips() {
        let dir = tempdir().unwrap();
        let store = SledIdentityStore::open(dir.path()).unwrap();

        let identity = SessionIdentity::new(
            Some(DataScope::new("security_logs")),
            Some(JobId::new("q-1")),
        );
        store.save_identity("explorer", &identity).await.unwrap();

        let loaded = store.load_identity("explorer").await.unwrap().unwrap();
        assert_eq!(loaded, identity);
    }

    #[tokio::test]
    async fn identity_is_last_write_wins() {
        let dir = tempdir().unwrap();
        let store = SledIdentityStore::open(dir.path()).unwrap();

        store
            .save_identity(
                "explorer",
                &SessionIdentity::new(Some(DataScope::new("a")), Some(JobId::new("q-1"))),
            )
            .await
            .unwrap();
        store
            .save_identity(
                "explorer",
                &SessionIdentity::new(Some(DataScope::new("b")), None),
            )
            .await
            .unwrap();

        let loaded = store.load_identity("explorer").await.unwrap().unwrap();
        assert_eq!(loaded.scope, Some(DataScope::new("b")));
        assert_eq!(loaded.job_id, None);
    }

    #[tokio::test]
    async fn surfaces_are_namespaced() {
        let dir = tempdir().unwrap();
        let store = SledIdentityStore::open(dir.path()).unwrap();

        store
            .save_last_scope("explorer", &DataScope::new("security_logs"))
            .await
            .unwrap();

        assert_eq!(
            store.load_last_scope("explorer").await.unwrap(),
            Some(DataScope::new("security_logs"))
        );
        assert_eq!(store.load_last_scope("shell").await.unwrap(), None);
        assert!(store.load_identity("explorer").await.unwrap().is_none());
    }
}
