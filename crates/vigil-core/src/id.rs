//! Strongly-typed identifiers.

use std::fmt;

/// Handle to an AI object slot.
///
/// An opaque unsigned integer. `ObjectId(0)` is the invalid sentinel and
/// is never handed out by an arena. Whether an id currently names a live
/// object is answered only by the arena that issued it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// The invalid sentinel.
    pub const INVALID: ObjectId = ObjectId(0);

    /// Whether this is anything other than the invalid sentinel.
    ///
    /// This says nothing about liveness; see `SlotArena::validate`.
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ObjectId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a world entity (the game-side object an AI object is bound to).
///
/// Entity ids are owned by the entity system; the AI layer only stores
/// them and asks the pool manager questions about them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Faction (species) an AI object belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactionId(pub u8);

impl FactionId {
    /// Objects that belong to no faction.
    pub const NONE: FactionId = FactionId(u8::MAX);
}

impl Default for FactionId {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies an AI group (squad) roster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GroupId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_invalid() {
        assert!(!ObjectId::INVALID.is_valid());
        assert!(!ObjectId::default().is_valid());
        assert!(ObjectId(1).is_valid());
    }

    #[test]
    fn default_faction_is_none() {
        assert_eq!(FactionId::default(), FactionId::NONE);
    }

    #[test]
    fn ids_order_numerically() {
        let mut ids = vec![ObjectId(7), ObjectId(2), ObjectId(5)];
        ids.sort();
        assert_eq!(ids, vec![ObjectId(2), ObjectId(5), ObjectId(7)]);
    }
}
