use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the data partition a query runs against
/// (a catalog/database name in the data lake).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataScope(String);

impl DataScope {
    pub fn new(name: impl Into<String>) -> Self {
        DataScope(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataScope {
    fn from(name: &str) -> Self {
        DataScope::new(name)
    }
}
