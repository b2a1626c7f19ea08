//! Container configuration.

use vigil_arena::ArenaConfig;

use crate::error::ContainerError;

/// Configuration for an [`ObjectContainer`](crate::ObjectContainer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Slot arena sizing.
    pub arena: ArenaConfig,
    /// Maximum drain passes per flush.
    ///
    /// Each pass destroys everything pending when it starts; objects
    /// deregistered during a pass are handled by the next one. A chain
    /// longer than this is treated as runaway reentrancy. Default: 64.
    pub max_flush_passes: u32,
}

impl ContainerConfig {
    /// Default flush pass ceiling.
    pub const DEFAULT_MAX_FLUSH_PASSES: u32 = 64;

    /// Create a config with the given arena capacity and default limits.
    pub fn new(capacity: u32) -> Self {
        Self {
            arena: ArenaConfig::new(capacity),
            max_flush_passes: Self::DEFAULT_MAX_FLUSH_PASSES,
        }
    }

    /// Check structural constraints.
    pub fn validate(&self) -> Result<(), ContainerError> {
        self.arena.validate()?;
        if self.max_flush_passes == 0 {
            return Err(ContainerError::InvalidConfig {
                reason: "max_flush_passes must be at least 1".into(),
            });
        }
        Ok(())
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            max_flush_passes: Self::DEFAULT_MAX_FLUSH_PASSES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ContainerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_passes_rejected() {
        let mut config = ContainerConfig::new(16);
        config.max_flush_passes = 0;
        assert!(matches!(
            config.validate(),
            Err(ContainerError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn arena_errors_propagate() {
        let config = ContainerConfig::new(0);
        assert!(matches!(config.validate(), Err(ContainerError::Arena(_))));
    }
}
