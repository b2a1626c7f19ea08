//! The object manager: typed creation, pooling and the removal fan-out.

use vigil_core::{EntityId, FactionId, GroupId, ObjectId, ObjectKind};
use vigil_registry::{
    AiObject, ContainerError, CountedRef, ObjectContainer, ObjectType, RemovalListener, WeakRef,
};

use crate::config::ManagerConfig;
use crate::error::ManagerError;
use crate::fanout::Fanout;
use crate::objects::{self, Actor, DummyObject, Leader};
use crate::params::CreateParams;
use crate::pool::{PoolManager, PoolSlab};

/// Creates, indexes and removes AI objects on top of an
/// [`ObjectContainer`].
///
/// The manager holds the owning reference of every object it creates, so
/// callers get [`WeakRef`]s and remove objects by id. Group rosters,
/// faction membership, attention tracks, leader bindings and the
/// entity ↔ object binding are kept here and scrubbed when the container
/// destroys an object, before external [`RemovalListener`]s are told.
///
/// # Frame protocol
///
/// ```text
/// create_object / remove_object / ...   (any number, any order)
/// release_deregistered_objects          (once, at the end of the frame)
/// ```
pub struct ObjectManager {
    pub(crate) container: ObjectContainer,
    pub(crate) fanout: Fanout,
    check_for_leaks: bool,
}

impl ObjectManager {
    /// Create an empty manager.
    pub fn new(config: &ManagerConfig) -> Result<Self, ManagerError> {
        config.validate()?;
        let container = ObjectContainer::new(&config.container)?;
        let fanout = Fanout::new(container.memberships(), config.pool_slab_blocks);
        Ok(Self {
            container,
            fanout,
            check_for_leaks: config.check_for_leaks,
        })
    }

    // ── Creation and removal ────────────────────────────────────

    /// Build, register and index a new object.
    ///
    /// If `params.entity` is pool-backed, the object is placed at the id
    /// the pool reserved for that entity and takes a pool slab block.
    /// The object's post-registration hook runs before it is indexed.
    pub fn create_object(
        &mut self,
        params: CreateParams,
        pool: &dyn PoolManager,
    ) -> Result<WeakRef, ManagerError> {
        if let Some(entity) = params.entity {
            if let Some(&id) = self.fanout.entities.get(&entity) {
                if self.container.validate(id) && !self.container.is_pending(id) {
                    return Err(ManagerError::EntityAlreadyBound { entity, id });
                }
                self.fanout.entities.remove(&entity);
            }
        }

        let pooled = params.entity.filter(|&entity| pool.is_pool_backed(entity));
        let requested = match pooled {
            Some(entity) => {
                let id = pool
                    .reserved_object_id(entity)
                    .ok_or(ManagerError::NoPoolReservation { entity })?;
                self.fanout.slab.alloc(id, entity, params.kind)?;
                Some(id)
            }
            None => None,
        };

        let mut object = objects::construct(params.kind, &params.name);
        let core = object.core_mut();
        core.entity = params.entity;
        core.faction = params.faction;
        core.position = params.position;
        if params.group.is_some() && !objects::assign_group(&mut *object, params.group) {
            tracing::warn!(kind = %params.kind, "group ignored for a kind without rosters");
        }

        let owner = match self.container.register_object(object, requested) {
            Ok(owner) => owner,
            Err(err) => {
                if let Some(id) = requested {
                    self.fanout.slab.free(id);
                }
                return Err(err.into());
            }
        };
        let id = owner.id();
        let weak = owner.weak();
        self.fanout.owners.insert(id, owner);
        if let Some(entity) = pooled {
            self.fanout.pooled.insert(id, entity);
        }
        if let Some(object) = self.container.get_mut(id) {
            object.on_registered();
        }
        if let Some(object) = self.container.get(id) {
            self.fanout.file(id, object);
        }
        tracing::debug!(%id, kind = %params.kind, pooled = pooled.is_some(), "created object");
        Ok(weak)
    }

    /// Deregister the object at `id`. It is destroyed at the next flush.
    ///
    /// The object stops counting as pool-backed immediately.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<(), ManagerError> {
        if !self.container.validate(id) {
            return Err(ManagerError::UnknownObject { id });
        }
        if self.container.is_pending(id) {
            return Err(ContainerError::AlreadyDeregistered { id }.into());
        }
        self.fanout.pooled.remove(&id);
        match self.fanout.owners.shift_remove(&id) {
            Some(mut owner) => {
                if let Err(err) = self.container.deregister_object(&mut owner) {
                    self.fanout.owners.insert(id, owner);
                    return Err(err.into());
                }
            }
            // Owned elsewhere, e.g. a leader's formation point.
            None => self.container.deregister_object_untyped(id)?,
        }
        Ok(())
    }

    /// Destroy everything removed since the last flush.
    ///
    /// Call once per frame. Returns the number of objects destroyed.
    pub fn release_deregistered_objects(&mut self) -> Result<usize, ManagerError> {
        Ok(self
            .container
            .release_deregistered_objects(self.check_for_leaks, &mut self.fanout)?)
    }

    /// Add a subsystem to notify for every destroyed object.
    ///
    /// Listeners run after the manager's own tables are scrubbed.
    pub fn register_listener(&mut self, listener: Box<dyn RemovalListener>) {
        self.fanout.listeners.push(listener);
    }

    /// Destroy every object, drop every reservation and empty the pool
    /// slab. Listeners stay registered.
    pub fn reset(&mut self) -> Result<(), ManagerError> {
        self.container.reset(&mut self.fanout)?;
        self.fanout.clear();
        tracing::debug!("object manager reset");
        Ok(())
    }

    // ── Pool integration ────────────────────────────────────────

    /// Reserve an id for a pooled entity the pool is about to prepare.
    pub fn reserve_id_for_pooled_entity(&mut self, entity: EntityId) -> Result<ObjectId, ManagerError> {
        let id = self.container.reserve_fresh_id()?;
        tracing::debug!(%entity, %id, "reserved id for pooled entity");
        Ok(id)
    }

    /// The pool parked `entity`: remove its object but keep the id
    /// reserved so the object can come back at the same id.
    ///
    /// Returns the id, or `None` if the entity had no object.
    pub fn on_entity_returned_to_pool(
        &mut self,
        entity: EntityId,
    ) -> Result<Option<ObjectId>, ManagerError> {
        let Some(&id) = self.fanout.entities.get(&entity) else {
            return Ok(None);
        };
        if !self.container.validate(id) || self.container.is_pending(id) {
            return Ok(None);
        }
        self.container.reserve_id(id)?;
        self.remove_object(id)?;
        tracing::debug!(%entity, %id, "entity returned to pool");
        Ok(Some(id))
    }

    /// Size the pool slab from the pool's bucket count.
    ///
    /// Only allowed while no pooled object is live.
    pub fn on_pool_bucket_size_loaded(&mut self, blocks: u32) -> Result<(), ManagerError> {
        let capacity = self.container.capacity();
        if blocks > capacity {
            return Err(ManagerError::InvalidConfig {
                reason: format!("pool bucket size {blocks} exceeds object capacity {capacity}"),
            });
        }
        self.fanout.slab.resize(blocks)?;
        tracing::debug!(blocks, "pool slab sized");
        Ok(())
    }

    // ── Index maintenance ───────────────────────────────────────

    /// Move an actor or leader to `group`, or out of any group.
    pub fn set_group(&mut self, id: ObjectId, group: Option<GroupId>) -> Result<(), ManagerError> {
        let object = self
            .container
            .get_mut(id)
            .ok_or(ManagerError::UnknownObject { id })?;
        let old = objects::group_of(object);
        if !objects::assign_group(object, group) {
            return Err(ManagerError::WrongKind {
                id,
                expected: "an actor or leader",
            });
        }
        let member = CountedRef::new(object.core().self_ref());

        if object.kind() == ObjectKind::Leader {
            if let Some(old) = old {
                if self.fanout.leaders.get(&old) == Some(&id) {
                    self.fanout.leaders.shift_remove(&old);
                }
            }
            if let Some(group) = group {
                self.fanout.bind_leader(group, id);
            }
        } else {
            if let Some(old) = old {
                self.fanout.groups.remove(old, id);
            }
            if let Some(group) = group {
                self.fanout.groups.insert(group, member);
            }
        }
        Ok(())
    }

    /// Move an object to `faction`.
    pub fn set_faction(&mut self, id: ObjectId, faction: FactionId) -> Result<(), ManagerError> {
        let object = self
            .container
            .get_mut(id)
            .ok_or(ManagerError::UnknownObject { id })?;
        let core = object.core_mut();
        let old = std::mem::replace(&mut core.faction, faction);
        let member = CountedRef::new(core.self_ref());
        if old != FactionId::NONE {
            self.fanout.factions.remove(old, id);
        }
        if faction != FactionId::NONE {
            self.fanout.factions.insert(faction, member);
        }
        Ok(())
    }

    /// Point an actor's attention at `target`, or clear it.
    pub fn track_target(
        &mut self,
        observer: ObjectId,
        target: Option<ObjectId>,
    ) -> Result<(), ManagerError> {
        let weak = match target {
            Some(target) => {
                let weak = self.container.weak_ref(target);
                if weak.is_nil() || self.container.is_pending(target) {
                    return Err(ManagerError::UnknownObject { id: target });
                }
                weak
            }
            None => WeakRef::nil(),
        };
        let actor = self.actor_mut(observer)?;
        let old = actor.attention_target();
        actor.set_attention_target(weak);
        let member = CountedRef::new(actor.core().self_ref());

        if !old.is_nil() {
            self.fanout.tracks.remove(old.id(), observer);
        }
        if !weak.is_nil() {
            self.fanout.tracks.insert(weak.id(), member);
        }
        Ok(())
    }

    /// Give a leader `points` formation points, replacing any it had.
    ///
    /// The points are dummy objects owned by the leader; they are
    /// destroyed with it. Returns their ids.
    pub fn create_formation(
        &mut self,
        leader: ObjectId,
        points: u32,
    ) -> Result<Vec<ObjectId>, ManagerError> {
        let object = self
            .container
            .get(leader)
            .ok_or(ManagerError::UnknownObject { id: leader })?;
        if !object.as_any().is::<Leader>() {
            return Err(ManagerError::WrongKind {
                id: leader,
                expected: "a leader",
            });
        }
        let owner = object.core().self_ref();
        let name = object.core().name.clone();
        let position = object.core().position;

        let mut formation = Vec::with_capacity(points as usize);
        for slot in 0..points {
            let mut point = DummyObject::owned_by(&format!("{name}_formation{slot}"), owner);
            point.core_mut().position = position;
            let point = self.container.register(point, None)?;
            if let Some(object) = self.container.get_mut(point.id()) {
                object.on_registered();
            }
            formation.push(point);
        }
        let ids: Vec<ObjectId> = formation.iter().map(|p| p.id()).collect();

        let leader_object = self
            .container
            .get_mut(leader)
            .and_then(|o| o.as_any_mut().downcast_mut::<Leader>())
            .ok_or(ManagerError::UnknownObject { id: leader })?;
        leader_object.set_formation(formation);
        tracing::debug!(%leader, points, "formation created");
        Ok(ids)
    }

    /// Re-derive every manager index from live object state.
    pub fn rebuild_indices(&mut self) {
        self.fanout.clear_indices();
        for (id, object) in self.container.iter() {
            self.fanout.file(id, object);
        }
    }

    // ── Queries ─────────────────────────────────────────────────

    /// The object container.
    pub fn container(&self) -> &ObjectContainer {
        &self.container
    }

    /// The live object at `id`.
    pub fn object(&self, id: ObjectId) -> Option<&dyn AiObject> {
        self.container.get(id)
    }

    /// The live object at `id`, if it is a `T`.
    pub fn get<T: ObjectType>(&self, id: ObjectId) -> Option<&T> {
        self.container.resolve(&self.container.weak_ref(id).cast::<T>())
    }

    /// The live object at `id` mutably, if it is a `T`.
    pub fn get_mut<T: ObjectType>(&mut self, id: ObjectId) -> Option<&mut T> {
        let weak = self.container.weak_ref(id).cast::<T>();
        self.container.resolve_mut(&weak)
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.container.len()
    }

    /// Whether no object is live.
    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    /// Actors on `group`'s roster.
    pub fn group_members(&self, group: GroupId) -> &[CountedRef] {
        self.fanout.groups.get(group)
    }

    /// Objects in `faction`.
    pub fn faction_members(&self, faction: FactionId) -> &[CountedRef] {
        self.fanout.factions.get(faction)
    }

    /// Objects some actor is paying attention to.
    pub fn tracked_targets(&self) -> Vec<ObjectId> {
        self.fanout.tracks.keys().collect()
    }

    /// Actors paying attention to `target`.
    pub fn observers_of(&self, target: ObjectId) -> &[CountedRef] {
        self.fanout.tracks.get(target)
    }

    /// Leader of `group`.
    pub fn group_leader(&self, group: GroupId) -> Option<ObjectId> {
        self.fanout.leaders.get(&group).copied()
    }

    /// Object bound to `entity`.
    pub fn object_for_entity(&self, entity: EntityId) -> Option<ObjectId> {
        self.fanout.entities.get(&entity).copied()
    }

    /// Whether `id` backs a pooled entity.
    pub fn is_pooled(&self, id: ObjectId) -> bool {
        self.fanout.pooled.contains_key(&id)
    }

    /// The pooled entity `id` backs.
    pub fn pooled_entity(&self, id: ObjectId) -> Option<EntityId> {
        self.fanout.pooled.get(&id).copied()
    }

    /// The pool slab.
    pub fn slab(&self) -> &PoolSlab {
        &self.fanout.slab
    }

    fn actor_mut(&mut self, id: ObjectId) -> Result<&mut Actor, ManagerError> {
        self.container
            .get_mut(id)
            .ok_or(ManagerError::UnknownObject { id })?
            .as_any_mut()
            .downcast_mut::<Actor>()
            .ok_or(ManagerError::WrongKind {
                id,
                expected: "an actor",
            })
    }
}

impl std::fmt::Debug for ObjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectManager")
            .field("container", &self.container)
            .field("owned", &self.fanout.owners.len())
            .field("pooled", &self.fanout.pooled.len())
            .field("slab", &self.fanout.slab)
            .field("listeners", &self.fanout.listeners.len())
            .finish()
    }
}
