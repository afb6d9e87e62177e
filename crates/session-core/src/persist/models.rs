use chrono::{DateTime, Utc};
use model::{job::JobId, scope::DataScope};
use serde::{Deserialize, Serialize};

/// The durable subset of a query session: enough to reattach after a restart,
/// never the in-memory result cache.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionIdentity {
    pub scope: Option<DataScope>,
    pub job_id: Option<JobId>,
    pub updated_at: DateTime<Utc>,
}

impl SessionIdentity {
    pub fn new(scope: Option<DataScope>, job_id: Option<JobId>) -> Self {
        SessionIdentity {
            scope,
            job_id,
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scope.is_none() && self.job_id.is_none()
    }
}
