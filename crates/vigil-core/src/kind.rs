//! Object kind tags.
//!
//! The kind tag is written into every persisted object header and drives
//! factory dispatch when objects are recreated. Tag values are part of the
//! save format and must never be renumbered.

use std::fmt;

/// The concrete kind of an AI object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    /// Base representation with no specialised behaviour.
    ///
    /// Also the fallback for tags this build does not recognise.
    Generic,
    /// A puppet-style actor driven by the simulation.
    Actor,
    /// A vehicle actor.
    Vehicle,
    /// The player-controlled actor.
    Player,
    /// A group leader that owns formation points.
    Leader,
    /// A dummy object (formation point, anchor, reference point).
    Dummy,
}

impl ObjectKind {
    /// Every kind, in tag order.
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Generic,
        ObjectKind::Actor,
        ObjectKind::Vehicle,
        ObjectKind::Player,
        ObjectKind::Leader,
        ObjectKind::Dummy,
    ];

    /// The persisted tag for this kind.
    pub fn tag(self) -> u16 {
        match self {
            Self::Generic => 0,
            Self::Actor => 1,
            Self::Vehicle => 2,
            Self::Player => 3,
            Self::Leader => 4,
            Self::Dummy => 5,
        }
    }

    /// Decode a persisted tag, returning `None` for unknown values.
    pub fn from_tag(tag: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.tag() == tag)
    }

    /// Decode a persisted tag, falling back to [`ObjectKind::Generic`].
    ///
    /// Saves written by newer builds may carry kinds this build does not
    /// know; they load as generic objects instead of failing.
    pub fn from_tag_or_generic(tag: u16) -> Self {
        Self::from_tag(tag).unwrap_or(Self::Generic)
    }

    /// Human-readable kind name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Actor => "actor",
            Self::Vehicle => "vehicle",
            Self::Player => "player",
            Self::Leader => "leader",
            Self::Dummy => "dummy",
        }
    }

    /// Whether objects of this kind are simulated actors.
    pub fn is_actor(self) -> bool {
        matches!(self, Self::Actor | Self::Vehicle | Self::Player)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
