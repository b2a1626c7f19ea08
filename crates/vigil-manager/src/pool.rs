//! Entity pool integration.
//!
//! Pooled world entities are prepared ahead of time and parked when they
//! leave the simulation. The pool system asks the manager to reserve an
//! object id for each entity it prepares, so the entity's AI object comes
//! back at the same id every time it is reactivated.

use indexmap::IndexMap;
use vigil_core::{EntityId, ObjectId, ObjectKind};

use crate::error::ManagerError;

/// The entity pool system, as seen by the object manager.
pub trait PoolManager {
    /// Whether `entity` is managed by the pool.
    fn is_pool_backed(&self, entity: EntityId) -> bool;

    /// The object id reserved for `entity` when it was prepared.
    fn reserved_object_id(&self, entity: EntityId) -> Option<ObjectId>;
}

/// A pool that manages nothing.
impl PoolManager for () {
    fn is_pool_backed(&self, _entity: EntityId) -> bool {
        false
    }

    fn reserved_object_id(&self, _entity: EntityId) -> Option<ObjectId> {
        None
    }
}

/// One slab block in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlabBlock {
    /// Object occupying the block.
    pub object: ObjectId,
    /// Pooled entity the object belongs to.
    pub entity: EntityId,
    /// Kind of the object.
    pub kind: ObjectKind,
}

/// Fixed block table for objects backing pooled entities.
///
/// Sized once from the pool's bucket count and reclaimed in bulk at level
/// unload. Blocks are keyed by object id; freed blocks go on a free list
/// and are reused before untouched ones.
#[derive(Debug, Default)]
pub struct PoolSlab {
    blocks: Vec<Option<SlabBlock>>,
    free_list: Vec<usize>,
    /// Object id → block index.
    live_map: IndexMap<ObjectId, usize>,
    capacity: u32,
}

impl PoolSlab {
    /// A slab with `capacity` blocks.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Number of blocks.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Blocks in use.
    pub fn len(&self) -> usize {
        self.live_map.len()
    }

    /// Whether no block is in use.
    pub fn is_empty(&self) -> bool {
        self.live_map.is_empty()
    }

    /// Change the block count. Only allowed while no block is in use.
    pub fn resize(&mut self, capacity: u32) -> Result<(), ManagerError> {
        if !self.is_empty() {
            return Err(ManagerError::SlabInUse {
                live: self.live_map.len(),
            });
        }
        self.blocks.clear();
        self.free_list.clear();
        self.capacity = capacity;
        Ok(())
    }

    /// Take a block for `object`. Returns the block index.
    ///
    /// Allocating twice for the same object returns its existing block.
    pub fn alloc(
        &mut self,
        object: ObjectId,
        entity: EntityId,
        kind: ObjectKind,
    ) -> Result<usize, ManagerError> {
        if let Some(&idx) = self.live_map.get(&object) {
            return Ok(idx);
        }
        let block = SlabBlock {
            object,
            entity,
            kind,
        };
        let idx = if let Some(reuse) = self.free_list.pop() {
            self.blocks[reuse] = Some(block);
            reuse
        } else if self.blocks.len() < self.capacity as usize {
            self.blocks.push(Some(block));
            self.blocks.len() - 1
        } else {
            return Err(ManagerError::SlabExhausted {
                capacity: self.capacity,
            });
        };
        self.live_map.insert(object, idx);
        tracing::trace!(%object, %entity, block = idx, "slab block allocated");
        Ok(idx)
    }

    /// Return the block held by `object`. Returns whether it held one.
    pub fn free(&mut self, object: ObjectId) -> bool {
        let Some(idx) = self.live_map.shift_remove(&object) else {
            return false;
        };
        self.blocks[idx] = None;
        self.free_list.push(idx);
        true
    }

    /// Block index held by `object`.
    pub fn block_of(&self, object: ObjectId) -> Option<usize> {
        self.live_map.get(&object).copied()
    }

    /// The block at `idx`, if in use.
    pub fn block(&self, idx: usize) -> Option<&SlabBlock> {
        self.blocks.get(idx)?.as_ref()
    }

    /// Blocks in use, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &SlabBlock> + '_ {
        self.live_map
            .values()
            .filter_map(|&idx| self.blocks.get(idx)?.as_ref())
    }

    /// Release every block, keeping the block count.
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.free_list.clear();
        self.live_map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(slab: &mut PoolSlab, id: u32) -> Result<usize, ManagerError> {
        slab.alloc(ObjectId(id), EntityId(id * 10), ObjectKind::Actor)
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut slab = PoolSlab::new(2);
        alloc(&mut slab, 1).unwrap();
        alloc(&mut slab, 2).unwrap();
        assert!(matches!(
            alloc(&mut slab, 3),
            Err(ManagerError::SlabExhausted { capacity: 2 })
        ));
    }

    #[test]
    fn freed_blocks_are_reused() {
        let mut slab = PoolSlab::new(4);
        let a = alloc(&mut slab, 1).unwrap();
        alloc(&mut slab, 2).unwrap();
        assert!(slab.free(ObjectId(1)));
        assert!(!slab.free(ObjectId(1)));
        assert_eq!(alloc(&mut slab, 3).unwrap(), a);
        assert_eq!(slab.block(a).map(|b| b.object), Some(ObjectId(3)));
        assert_eq!(slab.len(), 2);
    }

    #[test]
    fn alloc_is_idempotent_per_object() {
        let mut slab = PoolSlab::new(4);
        let first = alloc(&mut slab, 5).unwrap();
        assert_eq!(alloc(&mut slab, 5).unwrap(), first);
        assert_eq!(slab.len(), 1);
    }

    #[test]
    fn resize_requires_empty_slab() {
        let mut slab = PoolSlab::new(1);
        alloc(&mut slab, 1).unwrap();
        assert!(matches!(
            slab.resize(8),
            Err(ManagerError::SlabInUse { live: 1 })
        ));
        slab.reset();
        slab.resize(8).unwrap();
        assert_eq!(slab.capacity(), 8);
        assert!(slab.is_empty());
    }

    #[test]
    fn unpooled_default() {
        assert!(!().is_pool_backed(EntityId(1)));
        assert_eq!(().reserved_object_id(EntityId(1)), None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn blocks_stay_unique_and_bounded(
                ops in proptest::collection::vec((any::<bool>(), 1u32..12), 1..60),
            ) {
                let mut slab = PoolSlab::new(6);
                for (take, raw) in ops {
                    if take {
                        let _ = alloc(&mut slab, raw);
                    } else {
                        slab.free(ObjectId(raw));
                    }
                    prop_assert!(slab.len() <= slab.capacity() as usize);
                    let mut seen = std::collections::HashSet::new();
                    for block in slab.iter() {
                        let idx = slab.block_of(block.object);
                        prop_assert!(idx.is_some());
                        prop_assert!(seen.insert(idx));
                    }
                    prop_assert_eq!(seen.len(), slab.len());
                }
            }
        }
    }
}
