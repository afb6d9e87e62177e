use crate::error::LocatorError;
use model::{job::JobId, scope::DataScope, session::QuerySession};
use std::{fmt, str::FromStr};

const SCOPE_KEY: &str = "scope";
const JOB_KEY: &str = "job";

/// Shareable, query-string-shaped handle of a session's identity, e.g.
/// `scope=security_logs&job=q-42`. Printed on submission so a session can be
/// reattached from another process via `resume`/`status`/`cancel`.
///
/// Values may not contain `&` or `=`; scopes and job ids are plain
/// identifiers, so no escaping scheme is carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLocator {
    pub scope: Option<DataScope>,
    pub job_id: Option<JobId>,
}

impl SessionLocator {
    pub fn new(scope: Option<DataScope>, job_id: Option<JobId>) -> Result<Self, LocatorError> {
        if scope.is_none() && job_id.is_none() {
            return Err(LocatorError::Empty);
        }
        Ok(SessionLocator { scope, job_id })
    }

    /// The locator for a session's current identity, if it has one.
    pub fn for_session(session: &QuerySession) -> Option<Self> {
        Self::new(session.scope.clone(), session.job_id.clone()).ok()
    }
}

impl fmt::Display for SessionLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if let Some(scope) = &self.scope {
            write!(f, "{SCOPE_KEY}={scope}")?;
            first = false;
        }
        if let Some(job_id) = &self.job_id {
            if !first {
                f.write_str("&")?;
            }
            write!(f, "{JOB_KEY}={job_id}")?;
        }
        Ok(())
    }
}

impl FromStr for SessionLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scope = None;
        let mut job_id = None;

        for segment in s.split('&').filter(|seg| !seg.is_empty()) {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| LocatorError::Malformed(segment.to_string()))?;
            if value.is_empty() || value.contains('=') {
                return Err(LocatorError::Malformed(segment.to_string()));
            }

            match key {
                SCOPE_KEY => scope = Some(DataScope::new(value)),
                JOB_KEY => job_id = Some(JobId::new(value)),
                other => return Err(LocatorError::UnknownKey(other.to_string())),
            }
        }

        SessionLocator::new(scope, job_id)
    }
}
