//! The slot arena.
//!
//! [`SlotArena`] stores values in slots addressed by [`ObjectId`]. Id `n`
//! lives at slot index `n - 1`; id 0 is never issued. Slots are created
//! lazily up to the configured capacity and never shrink while the arena
//! lives.

use std::collections::BTreeSet;

use vigil_core::ObjectId;

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::slot::{Slot, SlotEntry, SlotState};

/// Fixed-capacity indexed storage with free-list reuse and reservations.
///
/// # Invariants
///
/// - An id is valid iff its slot is [`SlotState::Occupied`].
/// - The free list holds exactly the ids of slots that are `Free` and
///   below the high-water mark, with no duplicates.
/// - No id in the reserved set is ever on the free list.
/// - `len()` equals the number of occupied slots.
#[derive(Debug)]
pub struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    /// LIFO stack of free ids.
    free_list: Vec<u32>,
    /// Ids whose slot must come back as `Reserved` when erased.
    reserved: BTreeSet<ObjectId>,
    occupied: usize,
    capacity: u32,
}

impl<T> SlotArena<T> {
    /// Create an empty arena.
    pub fn new(config: &ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            reserved: BTreeSet::new(),
            occupied: 0,
            capacity: config.capacity,
        })
    }

    /// Configured id ceiling.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Highest id that has ever been touched.
    pub fn high_water(&self) -> u32 {
        self.slots.len() as u32
    }

    // ── Insertion ───────────────────────────────────────────────

    /// Store `value` in a free slot and return its id.
    ///
    /// Reuses the most recently freed slot, or grows the arena by one slot.
    /// Never returns an id that is reserved or claimed.
    pub fn insert(&mut self, value: T) -> Result<ObjectId, ArenaError> {
        let id = self.allocate_free_id()?;
        let idx = Self::index_of(id);
        self.slots[idx].occupy(value);
        self.occupied += 1;
        Ok(id)
    }

    /// Store `value` at a caller-chosen id.
    ///
    /// The slot must be `Free` or `Reserved`. Inserting into a reserved
    /// slot keeps the id in the reserved set, so the slot returns to
    /// `Reserved` when the value is erased.
    pub fn insert_at(&mut self, id: ObjectId, value: T) -> Result<(), ArenaError> {
        self.check_range(id)?;
        self.grow_to(id);
        let idx = Self::index_of(id);
        match self.slots[idx].state() {
            SlotState::Occupied => return Err(ArenaError::IdCollision { id }),
            SlotState::Free => self.remove_from_free_list(id),
            SlotState::Reserved => {}
        }
        self.slots[idx].occupy(value);
        self.occupied += 1;
        Ok(())
    }

    // ── Lookup ──────────────────────────────────────────────────

    /// Whether `id` currently names a stored value.
    pub fn validate(&self, id: ObjectId) -> bool {
        self.state(id) == SlotState::Occupied
    }

    /// State of the slot for `id`.
    ///
    /// Ids that were never touched (or lie outside the arena) are `Free`.
    pub fn state(&self, id: ObjectId) -> SlotState {
        self.slot(id).map_or(SlotState::Free, Slot::state)
    }

    /// Borrow the value at `id`.
    pub fn get(&self, id: ObjectId) -> Option<&T> {
        match &self.slot(id)?.entry {
            SlotEntry::Occupied(value) => Some(value),
            _ => None,
        }
    }

    /// Mutably borrow the value at `id`.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut T> {
        let idx = id.0.checked_sub(1)? as usize;
        match &mut self.slots.get_mut(idx)?.entry {
            SlotEntry::Occupied(value) => Some(value),
            _ => None,
        }
    }

    /// Generation of the current occupant of `id`.
    pub fn generation(&self, id: ObjectId) -> Option<u32> {
        let slot = self.slot(id)?;
        (slot.state() == SlotState::Occupied).then_some(slot.generation)
    }

    /// Iterate occupied slots in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| match &slot.entry {
                SlotEntry::Occupied(value) => Some((Self::id_of(idx), value)),
                _ => None,
            })
    }

    /// Iterate occupied slots mutably in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(idx, slot)| match &mut slot.entry {
                SlotEntry::Occupied(value) => Some((Self::id_of(idx), value)),
                _ => None,
            })
    }

    /// Ids of every occupied slot, in id order.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.iter().map(|(id, _)| id).collect()
    }

    // ── Removal ─────────────────────────────────────────────────

    /// Remove and return the value at `id`.
    ///
    /// The slot becomes `Reserved` if `id` is in the reserved set and
    /// `Free` otherwise. Returns `None` if the slot was not occupied.
    pub fn erase(&mut self, id: ObjectId) -> Option<T> {
        if !self.validate(id) {
            return None;
        }
        let idx = Self::index_of(id);
        let landing = if self.reserved.contains(&id) {
            SlotEntry::Reserved
        } else {
            self.free_list.push(id.0);
            SlotEntry::Free
        };
        self.occupied -= 1;
        match std::mem::replace(&mut self.slots[idx].entry, landing) {
            SlotEntry::Occupied(value) => Some(value),
            _ => None,
        }
    }

    /// Drop every value and forget every reservation.
    ///
    /// Slot generations survive, so handles taken before the clear never
    /// resolve to objects inserted after it. Ids are handed out from 1 again.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.entry = SlotEntry::Free;
        }
        self.free_list = (1..=self.slots.len() as u32).rev().collect();
        self.reserved.clear();
        self.occupied = 0;
    }

    // ── Reservation ─────────────────────────────────────────────

    /// Add `id` to the reserved set, claiming its slot if it is `Free`.
    ///
    /// Idempotent. Reserving an occupied id only records the reservation;
    /// the slot lands on `Reserved` when its value is erased.
    pub fn reserve(&mut self, id: ObjectId) -> Result<(), ArenaError> {
        self.check_range(id)?;
        self.grow_to(id);
        if self.state(id) == SlotState::Free {
            self.remove_from_free_list(id);
            self.slots[Self::index_of(id)].entry = SlotEntry::Reserved;
        }
        self.reserved.insert(id);
        Ok(())
    }

    /// Claim the next free id and reserve it.
    pub fn reserve_fresh(&mut self) -> Result<ObjectId, ArenaError> {
        let id = self.allocate_free_id()?;
        self.slots[Self::index_of(id)].entry = SlotEntry::Reserved;
        self.reserved.insert(id);
        Ok(id)
    }

    /// Put a placeholder in a free slot without joining the reserved set.
    ///
    /// Used while loading, to keep an id out of the free list until its
    /// object is recreated. Released with [`unreserve`](Self::unreserve).
    pub fn claim(&mut self, id: ObjectId) -> Result<(), ArenaError> {
        self.check_range(id)?;
        self.grow_to(id);
        match self.state(id) {
            SlotState::Occupied => Err(ArenaError::IdCollision { id }),
            SlotState::Reserved => Ok(()),
            SlotState::Free => {
                self.remove_from_free_list(id);
                self.slots[Self::index_of(id)].entry = SlotEntry::Reserved;
                Ok(())
            }
        }
    }

    /// Remove `id` from the reserved set and free its placeholder slot.
    ///
    /// Idempotent on ids that are neither reserved nor claimed. Fails if
    /// the slot holds a live value; the reservation is left untouched.
    pub fn unreserve(&mut self, id: ObjectId) -> Result<(), ArenaError> {
        self.check_range(id)?;
        match self.state(id) {
            SlotState::Occupied => Err(ArenaError::UnreserveLive { id }),
            SlotState::Reserved => {
                self.reserved.remove(&id);
                self.slots[Self::index_of(id)].entry = SlotEntry::Free;
                self.free_list.push(id.0);
                Ok(())
            }
            SlotState::Free => {
                self.reserved.remove(&id);
                Ok(())
            }
        }
    }

    /// Whether `id` is in the reserved set.
    pub fn is_reserved(&self, id: ObjectId) -> bool {
        self.reserved.contains(&id)
    }

    /// Reserved ids in ascending order.
    pub fn reserved_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.reserved.iter().copied()
    }

    /// Size of the reserved set.
    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }

    /// Number of slots holding a placeholder (reserved or claimed).
    pub fn placeholder_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state() == SlotState::Reserved)
            .count()
    }

    // ── Internals ───────────────────────────────────────────────

    fn index_of(id: ObjectId) -> usize {
        id.0 as usize - 1
    }

    fn id_of(idx: usize) -> ObjectId {
        ObjectId(idx as u32 + 1)
    }

    fn slot(&self, id: ObjectId) -> Option<&Slot<T>> {
        let idx = id.0.checked_sub(1)? as usize;
        self.slots.get(idx)
    }

    fn check_range(&self, id: ObjectId) -> Result<(), ArenaError> {
        if !id.is_valid() || id.0 > self.capacity {
            return Err(ArenaError::OutOfRange {
                id,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Pop a free id or grow by one slot. The returned slot is `Free`.
    fn allocate_free_id(&mut self) -> Result<ObjectId, ArenaError> {
        if let Some(raw) = self.free_list.pop() {
            debug_assert_eq!(self.state(ObjectId(raw)), SlotState::Free);
            return Ok(ObjectId(raw));
        }
        let next = self.slots.len() as u32 + 1;
        if next > self.capacity {
            return Err(ArenaError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.slots.push(Slot::free());
        Ok(ObjectId(next))
    }

    /// Create slots up to and including `id`.
    ///
    /// Ids strictly between the old high-water mark and `id` go on the
    /// free list, lowest on top. `id` itself is left `Free` but off the
    /// list; the caller is about to take it.
    fn grow_to(&mut self, id: ObjectId) {
        let old_len = self.slots.len() as u32;
        if id.0 <= old_len {
            return;
        }
        self.slots.resize_with(id.0 as usize, Slot::free);
        self.free_list.extend((old_len + 1..id.0).rev());
    }

    fn remove_from_free_list(&mut self, id: ObjectId) {
        self.free_list.retain(|&raw| raw != id.0);
    }
}
