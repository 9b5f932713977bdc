//! Buffer pool configuration parameters.

use std::time::Duration;

use crate::error::MarshalError;

/// Configuration for the scratch buffer pool.
///
/// Validated when a [`MarshalService`](crate::MarshalService) is built from
/// it; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of scratch entries created for each newly seen record type.
    ///
    /// Default: 4. Must be at least 1.
    pub entries_per_type: usize,

    /// Upper bound on how long a caller waits for a free entry.
    ///
    /// `None` (the default) waits indefinitely. When set, an exhausted
    /// pool yields [`MarshalError::LeaseTimeout`] after this long.
    /// Must be non-zero.
    pub lease_timeout: Option<Duration>,
}

impl PoolConfig {
    /// Default number of scratch entries per record type.
    pub const DEFAULT_ENTRIES_PER_TYPE: usize = 4;

    /// Create a config with `entries_per_type` entries and no lease timeout.
    pub fn new(entries_per_type: usize) -> Self {
        Self {
            entries_per_type,
            lease_timeout: None,
        }
    }

    /// Return a copy of this config with the given lease timeout.
    pub fn with_lease_timeout(mut self, timeout: Duration) -> Self {
        self.lease_timeout = Some(timeout);
        self
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<(), MarshalError> {
        if self.entries_per_type == 0 {
            return Err(MarshalError::InvalidConfig {
                reason: "entries_per_type must be at least 1".into(),
            });
        }
        if self.lease_timeout == Some(Duration::ZERO) {
            return Err(MarshalError::InvalidConfig {
                reason: "lease_timeout must be non-zero (use try_lease for polling)".into(),
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ENTRIES_PER_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_four_entries_and_no_timeout() {
        let config = PoolConfig::default();
        assert_eq!(config.entries_per_type, 4);
        assert_eq!(config.lease_timeout, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_entries_rejected() {
        assert!(matches!(
            PoolConfig::new(0).validate(),
            Err(MarshalError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = PoolConfig::default().with_lease_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
