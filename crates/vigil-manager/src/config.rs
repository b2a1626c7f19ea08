//! Manager configuration.

use vigil_registry::ContainerConfig;

use crate::error::ManagerError;

/// Configuration for an [`ObjectManager`](crate::ObjectManager).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Object container settings.
    pub container: ContainerConfig,
    /// Initial pool slab block count.
    ///
    /// Normally left at zero and set once the pool system reports its
    /// bucket size through
    /// [`on_pool_bucket_size_loaded`](crate::ObjectManager::on_pool_bucket_size_loaded).
    pub pool_slab_blocks: u32,
    /// Compare registration counters with arena occupancy after every flush.
    pub check_for_leaks: bool,
}

impl ManagerConfig {
    /// Default initial slab size.
    pub const DEFAULT_POOL_SLAB_BLOCKS: u32 = 0;

    /// Create a config with the given id capacity and default settings.
    pub fn new(capacity: u32) -> Self {
        Self {
            container: ContainerConfig::new(capacity),
            ..Self::default()
        }
    }

    /// Check structural constraints.
    pub fn validate(&self) -> Result<(), ManagerError> {
        self.container.validate()?;
        if self.pool_slab_blocks > self.container.arena.capacity {
            return Err(ManagerError::InvalidConfig {
                reason: format!(
                    "pool_slab_blocks ({}) exceeds object capacity ({})",
                    self.pool_slab_blocks, self.container.arena.capacity
                ),
            });
        }
        Ok(())
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            container: ContainerConfig::default(),
            pool_slab_blocks: Self::DEFAULT_POOL_SLAB_BLOCKS,
            check_for_leaks: true,
        }
    }
}
