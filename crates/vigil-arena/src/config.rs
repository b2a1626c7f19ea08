//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for the slot arena.
///
/// The capacity is the hard ceiling on object ids and is fixed when the
/// level loads. It is never resized at runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Maximum number of slots (and therefore the largest valid id).
    ///
    /// Default: 65_535. Must be at least 1 and below `u32::MAX`.
    pub capacity: u32,
}

impl ArenaConfig {
    /// Default slot capacity.
    pub const DEFAULT_CAPACITY: u32 = 65_535;

    /// Create a config with the given capacity.
    pub fn new(capacity: u32) -> Self {
        Self { capacity }
    }

    /// Check structural constraints.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.capacity == 0 || self.capacity == u32::MAX {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "capacity must be in 1..{}, got {}",
                    u32::MAX,
                    self.capacity
                ),
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ArenaConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            ArenaConfig::new(0).validate(),
            Err(ArenaError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn max_capacity_rejected() {
        assert!(ArenaConfig::new(u32::MAX).validate().is_err());
    }
}
