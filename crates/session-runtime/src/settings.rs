use crate::error::SettingsError;
use std::time::Duration;

/// Polling below this floor would hammer the backend without making the
/// session observably fresher.
const MIN_POLL_INTERVAL_MS: u64 = 50;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(750);

/// Tunables for one query-session surface.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Cadence of job status polls while a job is in flight.
    pub poll_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SessionSettings {
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        SessionSettings { poll_interval }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let got_ms = self.poll_interval.as_millis() as u64;
        if got_ms < MIN_POLL_INTERVAL_MS {
            return Err(SettingsError::IntervalTooShort {
                min_ms: MIN_POLL_INTERVAL_MS,
                got_ms,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_is_valid() {
        assert!(SessionSettings::default().validate().is_ok());
    }

    #[test]
    fn sub_floor_interval_is_rejected() {
        let settings = SessionSettings::with_poll_interval(Duration::from_millis(5));
        assert_eq!(
            settings.validate(),
            Err(SettingsError::IntervalTooShort {
                min_ms: 50,
                got_ms: 5
            })
        );
    }
}
