use std::any::Any;

use vigil_core::{GroupId, ObjectKind};
use vigil_registry::{AiObject, LiveIds, ObjectCore, WeakRef};
use vigil_stream::{Serializer, StreamError};

/// A simulated agent: a puppet, a vehicle or a player.
///
/// Group membership and the attention target are mirrored in the
/// manager's indices, so they change only through
/// [`ObjectManager::set_group`](crate::ObjectManager::set_group) and
/// [`ObjectManager::track_target`](crate::ObjectManager::track_target).
#[derive(Debug)]
pub struct Actor {
    core: ObjectCore,
    group: Option<GroupId>,
    attention: WeakRef,
    health: f32,
    max_health: f32,
}

impl Actor {
    /// Health an actor starts with.
    pub const DEFAULT_MAX_HEALTH: f32 = 100.0;

    /// An unregistered actor of `kind` at full health.
    pub fn new(kind: ObjectKind, name: &str) -> Self {
        debug_assert!(kind.is_actor(), "{kind} is not an actor kind");
        Self {
            core: ObjectCore::new(kind, name),
            group: None,
            attention: WeakRef::nil(),
            health: Self::DEFAULT_MAX_HEALTH,
            max_health: Self::DEFAULT_MAX_HEALTH,
        }
    }

    /// Group roster this actor belongs to.
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub(crate) fn set_group(&mut self, group: Option<GroupId>) {
        self.group = group;
    }

    /// Object this actor is paying attention to.
    pub fn attention_target(&self) -> WeakRef {
        self.attention
    }

    pub(crate) fn set_attention_target(&mut self, target: WeakRef) {
        self.attention = target;
    }

    /// Current health.
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Apply damage (or healing, if negative), clamped to `0..=max_health`.
    pub fn apply_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).clamp(0.0, self.max_health);
    }

    /// Whether health is above zero.
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

impl AiObject for Actor {
    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), StreamError> {
        self.core.serialize(ser)?;
        ser.begin_group("Actor")?;
        super::serialize_group(ser, &mut self.group)?;
        ser.value("attentionTarget", &mut self.attention)?;
        ser.value("health", &mut self.health)?;
        ser.value("maxHealth", &mut self.max_health)?;
        ser.end_group()
    }

    fn post_serialize(&mut self, live: &LiveIds) {
        self.attention.rebind(live);
    }

    fn on_registered(&mut self) {
        super::name_if_unnamed(&mut self.core);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_is_clamped() {
        let mut actor = Actor::new(ObjectKind::Actor, "grunt");
        actor.apply_damage(30.0);
        assert_eq!(actor.health(), 70.0);
        actor.apply_damage(-100.0);
        assert_eq!(actor.health(), actor.max_health());
        actor.apply_damage(500.0);
        assert!(!actor.is_alive());
    }
}
