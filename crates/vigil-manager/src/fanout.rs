//! The manager's side tables and the removal fan-out that keeps them honest.

use std::collections::HashMap;

use indexmap::IndexMap;
use vigil_core::{EntityId, FactionId, GroupId, ObjectId};
use vigil_registry::{
    AiObject, CountedRef, DeregisterQueue, Memberships, ObjectIndex, RemovalListener, StrongRef,
};

use crate::objects::{Actor, Leader};
use crate::pool::PoolSlab;

/// Every back-reference the manager keeps to live objects.
///
/// The container calls [`on_object_removed`](RemovalListener::on_object_removed)
/// for each object it destroys; by the time that returns, nothing here
/// mentions the object and external listeners have been told.
pub(crate) struct Fanout {
    /// Owning references for objects the manager created or loaded.
    pub owners: IndexMap<ObjectId, StrongRef>,
    pub factions: ObjectIndex<FactionId>,
    pub groups: ObjectIndex<GroupId>,
    /// Target id → actors paying attention to it.
    pub tracks: ObjectIndex<ObjectId>,
    pub leaders: IndexMap<GroupId, ObjectId>,
    pub entities: HashMap<EntityId, ObjectId>,
    /// Objects backing pooled entities.
    pub pooled: HashMap<ObjectId, EntityId>,
    pub slab: PoolSlab,
    pub listeners: Vec<Box<dyn RemovalListener>>,
}

impl Fanout {
    pub fn new(memberships: Memberships, slab_blocks: u32) -> Self {
        Self {
            owners: IndexMap::new(),
            factions: ObjectIndex::new("factions", memberships.clone()),
            groups: ObjectIndex::new("groups", memberships.clone()),
            tracks: ObjectIndex::new("tracks", memberships),
            leaders: IndexMap::new(),
            entities: HashMap::new(),
            pooled: HashMap::new(),
            slab: PoolSlab::new(slab_blocks),
            listeners: Vec::new(),
        }
    }

    /// File `object` in every index its current state calls for.
    pub fn file(&mut self, id: ObjectId, object: &dyn AiObject) {
        let member = CountedRef::new(object.core().self_ref());
        let core = object.core();
        if let Some(entity) = core.entity {
            if let Some(previous) = self.entities.insert(entity, id) {
                if previous != id {
                    tracing::warn!(%entity, %previous, %id, "entity rebound to a different object");
                }
            }
        }
        if core.faction != FactionId::NONE {
            self.factions.insert(core.faction, member);
        }
        if let Some(actor) = object.as_any().downcast_ref::<Actor>() {
            if let Some(group) = actor.group() {
                self.groups.insert(group, member);
            }
            let target = actor.attention_target();
            if !target.is_nil() {
                self.tracks.insert(target.id(), member);
            }
        } else if let Some(leader) = object.as_any().downcast_ref::<Leader>() {
            if let Some(group) = leader.group() {
                self.bind_leader(group, id);
            }
        }
    }

    /// Remove `id` from every index, keeping ownership and pool state.
    ///
    /// Tracks naming `id` as the target are kept.
    pub fn unfile(&mut self, id: ObjectId) {
        self.factions.scrub(id);
        self.groups.scrub(id);
        self.tracks.scrub(id);
        self.leaders.retain(|_, leader| *leader != id);
        self.entities.retain(|_, object| *object != id);
    }

    pub fn bind_leader(&mut self, group: GroupId, id: ObjectId) {
        if let Some(previous) = self.leaders.insert(group, id) {
            if previous != id {
                tracing::warn!(%group, %previous, %id, "group leader replaced");
            }
        }
    }

    /// Drop every index entry. Owners are disowned, not released.
    pub fn clear(&mut self) {
        for (_, mut owner) in self.owners.drain(..) {
            owner.disown();
        }
        self.clear_indices();
        self.pooled.clear();
        self.slab.reset();
    }

    pub fn clear_indices(&mut self) {
        self.factions.clear();
        self.groups.clear();
        self.tracks.clear();
        self.leaders.clear();
        self.entities.clear();
    }
}

impl RemovalListener for Fanout {
    fn on_object_removed(&mut self, id: ObjectId, object: &dyn AiObject, queue: &DeregisterQueue) {
        // Deletion is already pending; the owner must not enqueue it again.
        if let Some(mut owner) = self.owners.shift_remove(&id) {
            owner.disown();
        }
        self.unfile(id);
        let observers = self.tracks.remove_key(id);
        if !observers.is_empty() {
            tracing::trace!(%id, observers = observers.len(), "dropped tracks on removed target");
        }
        self.pooled.remove(&id);
        self.slab.free(id);
        for listener in &mut self.listeners {
            listener.on_object_removed(id, object, queue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::ObjectKind;
    use vigil_registry::{ContainerConfig, ObjectContainer};

    fn setup() -> (ObjectContainer, Fanout) {
        let container = ObjectContainer::new(&ContainerConfig::new(16)).unwrap();
        let fanout = Fanout::new(container.memberships(), 4);
        (container, fanout)
    }

    #[test]
    fn removal_scrubs_every_table() {
        let (mut container, mut fanout) = setup();
        let target = container
            .register(Actor::new(ObjectKind::Actor, "target"), None)
            .unwrap();
        let mut actor = Actor::new(ObjectKind::Actor, "watcher");
        actor.set_group(Some(GroupId(3)));
        actor.set_attention_target(target.weak().untyped());
        actor.core_mut().faction = FactionId(2);
        actor.core_mut().entity = Some(EntityId(40));
        let watcher = container.register(actor, None).unwrap();
        let id = watcher.id();
        fanout.file(id, container.get(id).unwrap());
        fanout.owners.insert(id, watcher.into_untyped());
        fanout.pooled.insert(id, EntityId(40));
        fanout.slab.alloc(id, EntityId(40), ObjectKind::Actor).unwrap();

        assert_eq!(fanout.groups.get(GroupId(3)).len(), 1);
        assert_eq!(fanout.tracks.get(target.id()).len(), 1);
        // by_kind plus faction, group and track.
        assert_eq!(container.memberships().count(id), 4);

        container.deregister_object_untyped(id).unwrap();
        container.release_deregistered_objects(true, &mut fanout).unwrap();

        assert!(fanout.owners.is_empty());
        assert!(fanout.groups.is_empty());
        assert!(fanout.factions.is_empty());
        assert!(fanout.tracks.is_empty());
        assert!(fanout.entities.is_empty());
        assert!(fanout.pooled.is_empty());
        assert!(fanout.slab.is_empty());
        assert_eq!(container.memberships().count(id), 0);
        // The owner was disowned, so nothing was enqueued twice.
        assert_eq!(container.pending_count(), 0);
        drop(target);
    }

    #[test]
    fn removed_target_loses_its_observers() {
        let (mut container, mut fanout) = setup();
        let mut target = container
            .register(Actor::new(ObjectKind::Actor, "target"), None)
            .unwrap();
        let mut actor = Actor::new(ObjectKind::Actor, "watcher");
        actor.set_attention_target(target.weak().untyped());
        let watcher = container.register(actor, None).unwrap();
        fanout.file(watcher.id(), container.get(watcher.id()).unwrap());

        container.deregister_object(&mut target).unwrap();
        container.release_deregistered_objects(true, &mut fanout).unwrap();
        assert!(fanout.tracks.is_empty());
        assert_eq!(container.memberships().count(watcher.id()), 1);
    }

    #[test]
    fn leader_binding_follows_group() {
        let (mut container, mut fanout) = setup();
        let mut leader = Leader::new("boss");
        leader.set_group(Some(GroupId(1)));
        let mut owner = container.register(leader, None).unwrap();
        fanout.file(owner.id(), container.get(owner.id()).unwrap());
        assert_eq!(fanout.leaders.get(&GroupId(1)), Some(&owner.id()));

        container.deregister_object(&mut owner).unwrap();
        container.release_deregistered_objects(true, &mut fanout).unwrap();
        assert!(fanout.leaders.is_empty());
    }
}
