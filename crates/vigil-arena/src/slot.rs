//! Slot storage and state.

/// Observable state of a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Available to the free list.
    Free,
    /// Claimed but holding no object.
    Reserved,
    /// Holding a live object.
    Occupied,
}

/// Contents of one slot.
#[derive(Debug)]
pub(crate) enum SlotEntry<T> {
    Free,
    Reserved,
    Occupied(T),
}

/// A slot and its generation counter.
///
/// The generation is bumped every time the slot becomes occupied, so it
/// is 0 until the first occupant arrives.
#[derive(Debug)]
pub(crate) struct Slot<T> {
    pub(crate) entry: SlotEntry<T>,
    pub(crate) generation: u32,
}

impl<T> Slot<T> {
    pub(crate) fn free() -> Self {
        Self {
            entry: SlotEntry::Free,
            generation: 0,
        }
    }

    pub(crate) fn state(&self) -> SlotState {
        match self.entry {
            SlotEntry::Free => SlotState::Free,
            SlotEntry::Reserved => SlotState::Reserved,
            SlotEntry::Occupied(_) => SlotState::Occupied,
        }
    }

    /// Install a value, bumping the generation. Returns the new generation.
    pub(crate) fn occupy(&mut self, value: T) -> u32 {
        // Generation 0 is reserved for "never occupied"; skip it on wrap.
        self.generation = self.generation.wrapping_add(1).max(1);
        self.entry = SlotEntry::Occupied(value);
        self.generation
    }
}
