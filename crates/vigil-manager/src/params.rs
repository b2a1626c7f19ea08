//! Creation parameters.

use vigil_core::{EntityId, FactionId, GroupId, ObjectKind};

/// Everything [`create_object`](crate::ObjectManager::create_object) needs
/// to build and file a new object.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateParams {
    /// Which concrete type to build.
    pub kind: ObjectKind,
    /// Display name. Empty names are replaced with `<kind><id>` once the
    /// id is known.
    pub name: String,
    /// Backing world entity, if any.
    pub entity: Option<EntityId>,
    /// Faction membership.
    pub faction: FactionId,
    /// Group roster to join (actors and leaders only).
    pub group: Option<GroupId>,
    /// Initial world position.
    pub position: [f32; 3],
}

impl CreateParams {
    /// Parameters for an unnamed object of `kind` with no entity.
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            name: String::new(),
            entity: None,
            faction: FactionId::NONE,
            group: None,
            position: [0.0; 3],
        }
    }

    /// Set the display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bind to a world entity.
    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Join a faction.
    pub fn in_faction(mut self, faction: FactionId) -> Self {
        self.faction = faction;
        self
    }

    /// Join a group roster.
    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    /// Set the initial position.
    pub fn at(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }
}
