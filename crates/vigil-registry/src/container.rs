//! The object container: registration, deferred deletion and id reservation.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use indexmap::IndexMap;
use vigil_arena::{SlotArena, SlotState};
use vigil_core::{ObjectId, ObjectKind};

use crate::config::ContainerConfig;
use crate::error::{ContainerError, LeakReport};
use crate::index::{Memberships, ObjectIndex};
use crate::listener::RemovalListener;
use crate::object::{AiObject, LiveIds, ObjectType};
use crate::queue::DeregisterQueue;
use crate::refs::{CountedRef, StrongRef, WeakRef};

/// Owns every registered AI object.
///
/// # Lifecycle
///
/// 1. [`register`](Self::register) places the object in a slot and hands
///    back its unique [`StrongRef`].
/// 2. Releasing that reference (or calling
///    [`deregister_object`](Self::deregister_object)) queues the id. The
///    object stays resolvable until the flush.
/// 3. [`release_deregistered_objects`](Self::release_deregistered_objects)
///    notifies the removal listener, destroys the object and frees (or
///    re-reserves) its slot.
///
/// The container keeps two indices of its own, by kind and dummies by
/// kind, and scrubs them before notifying listeners.
pub struct ObjectContainer {
    pub(crate) arena: SlotArena<Box<dyn AiObject>>,
    queue: DeregisterQueue,
    working: IndexMap<ObjectId, u32>,
    memberships: Memberships,
    pub(crate) by_kind: ObjectIndex<ObjectKind>,
    pub(crate) dummies: ObjectIndex<ObjectKind>,
    /// Ids claimed by a load pre-pass and not yet recreated.
    pub(crate) load_claims: BTreeSet<ObjectId>,
    registered: u64,
    deregistered: u64,
    max_flush_passes: u32,
}

impl ObjectContainer {
    /// Create an empty container.
    pub fn new(config: &ContainerConfig) -> Result<Self, ContainerError> {
        config.validate()?;
        let memberships = Memberships::new();
        Ok(Self {
            arena: SlotArena::new(&config.arena)?,
            queue: DeregisterQueue::new(),
            working: IndexMap::new(),
            by_kind: ObjectIndex::new("by_kind", memberships.clone()),
            dummies: ObjectIndex::new("dummies", memberships.clone()),
            memberships,
            load_claims: BTreeSet::new(),
            registered: 0,
            deregistered: 0,
            max_flush_passes: config.max_flush_passes,
        })
    }

    // ── Registration ────────────────────────────────────────────

    /// Register a concrete object and return its typed owning reference.
    pub fn register<T: AiObject + ObjectType>(
        &mut self,
        object: T,
        requested: Option<ObjectId>,
    ) -> Result<StrongRef<T>, ContainerError> {
        Ok(self.register_object(Box::new(object), requested)?.cast())
    }

    /// Register a boxed object.
    ///
    /// With `requested`, the object is placed at exactly that id, which
    /// must be free or reserved (a reservation survives the placement).
    /// Otherwise the arena picks the next free id.
    ///
    /// The object's self-reference is installed and it is filed in the
    /// container's own indices. [`AiObject::on_registered`] is left to the
    /// caller, which usually has more setup to do first.
    pub fn register_object(
        &mut self,
        object: Box<dyn AiObject>,
        requested: Option<ObjectId>,
    ) -> Result<StrongRef, ContainerError> {
        if object.core().is_registered() {
            return Err(ContainerError::AlreadyRegistered { id: object.id() });
        }
        let kind = object.kind();
        let dummy = object.is_dummy();
        let id = match requested {
            Some(id) => {
                self.arena.insert_at(id, object)?;
                id
            }
            None => self.arena.insert(object)?,
        };
        let generation = self
            .arena
            .generation(id)
            .ok_or(ContainerError::NotRegistered { id })?;
        let weak = WeakRef::bound(id, generation);
        if let Some(object) = self.arena.get_mut(id) {
            object.core_mut().self_ref = weak;
        }

        self.by_kind.insert(kind, CountedRef::new(weak));
        if dummy {
            self.dummies.insert(kind, CountedRef::new(weak));
        }
        self.registered += 1;
        tracing::debug!(%id, %kind, generation, "registered object");
        Ok(StrongRef::mint(weak, self.queue.clone()))
    }

    /// Deregister the target of `owner`, leaving `owner` nil.
    ///
    /// The object is destroyed at the next flush.
    pub fn deregister_object<T: ?Sized>(
        &mut self,
        owner: &mut StrongRef<T>,
    ) -> Result<(), ContainerError> {
        if owner.is_nil() {
            return Err(ContainerError::NilReference);
        }
        let weak = owner.weak();
        if !owner.minted_by(&self.queue) {
            return Err(ContainerError::ForeignOwner { id: weak.id() });
        }
        self.check_deregistrable(weak.id(), Some(weak.generation()))?;
        owner.release();
        tracing::debug!(id = %weak.id(), "deregistered object");
        Ok(())
    }

    /// Deregister by id, for callers that do not hold the owning reference.
    ///
    /// Whoever does hold it should [`disown`](StrongRef::disown) it rather
    /// than release it.
    pub fn deregister_object_untyped(&mut self, id: ObjectId) -> Result<(), ContainerError> {
        let generation = self.check_deregistrable(id, None)?;
        self.queue.enqueue(id, generation);
        tracing::debug!(%id, "deregistered object by id");
        Ok(())
    }

    fn check_deregistrable(
        &self,
        id: ObjectId,
        generation: Option<u32>,
    ) -> Result<u32, ContainerError> {
        let live = self
            .arena
            .generation(id)
            .ok_or(ContainerError::NotRegistered { id })?;
        if generation.is_some_and(|g| g != live) {
            return Err(ContainerError::NotRegistered { id });
        }
        if self.queue.is_pending(id) || self.working.contains_key(&id) {
            return Err(ContainerError::AlreadyDeregistered { id });
        }
        Ok(live)
    }

    // ── Deferred deletion ───────────────────────────────────────

    /// Destroy every deregistered object, including those deregistered
    /// while this call runs.
    ///
    /// Each pass takes the whole pending queue. For each id it scrubs the
    /// container's indices, notifies `listener`, erases the slot and
    /// drops the object; strong references the object owned are released
    /// by that drop and join the next pass. Returns the number of objects
    /// destroyed.
    ///
    /// With `check_for_leaks`, registration counters are compared with
    /// arena occupancy afterwards and any mismatch is logged with a slot
    /// dump.
    pub fn release_deregistered_objects(
        &mut self,
        check_for_leaks: bool,
        listener: &mut dyn RemovalListener,
    ) -> Result<usize, ContainerError> {
        let mut destroyed = 0;
        let mut passes = 0;
        loop {
            self.queue.swap_into(&mut self.working);
            if self.working.is_empty() {
                break;
            }
            if passes == self.max_flush_passes {
                let pending = self.working.len();
                self.queue.restore(self.working.drain(..));
                tracing::error!(passes, pending, "deferred deletion is not settling");
                return Err(ContainerError::FlushRunaway { passes, pending });
            }
            passes += 1;

            for i in 0..self.working.len() {
                let Some((&id, &generation)) = self.working.get_index(i) else {
                    break;
                };
                if self.destroy(id, generation, listener) {
                    destroyed += 1;
                }
            }
            self.working.clear();
        }

        if destroyed > 0 {
            tracing::debug!(destroyed, passes, "released deregistered objects");
        }
        if check_for_leaks {
            let leak = self.check_for_leaks().err();
            if let Some(report) = &leak {
                tracing::error!(%report, "object bookkeeping mismatch after flush");
            }
            debug_assert!(leak.is_none(), "{leak:?}");
        }
        Ok(destroyed)
    }

    fn destroy(
        &mut self,
        id: ObjectId,
        generation: u32,
        listener: &mut dyn RemovalListener,
    ) -> bool {
        if self.arena.generation(id) != Some(generation) {
            // Already destroyed earlier in this flush, or the slot was reused.
            tracing::debug!(%id, generation, "skipping stale deregistration");
            return false;
        }
        self.by_kind.scrub(id);
        self.dummies.scrub(id);
        if let Some(object) = self.arena.get(id) {
            listener.on_object_removed(id, &**object, &self.queue);
        }

        let surviving = self.memberships.forget(id);
        if surviving != 0 {
            tracing::error!(%id, surviving, "object destroyed while still indexed");
            debug_assert!(surviving == 0, "object {id} destroyed with {surviving} index entries");
        }

        let object = self.arena.erase(id);
        self.deregistered += 1;
        tracing::trace!(%id, "destroying object");
        drop(object);
        true
    }

    /// Compare registration counters with arena occupancy.
    pub fn check_for_leaks(&self) -> Result<(), LeakReport> {
        let expected = self.registered.saturating_sub(self.deregistered);
        let actual = self.arena.len() as u64;
        if expected == actual {
            return Ok(());
        }
        Err(LeakReport {
            registered: self.registered,
            deregistered: self.deregistered,
            expected,
            actual,
            dump: self.dump_slots(),
        })
    }

    /// Drop every object and reservation and start over.
    ///
    /// Live objects are deregistered and flushed through `listener` first,
    /// then the registration counters are checked against the arena as
    /// after a checked flush.
    /// Strong references still held elsewhere become inert: they point at
    /// a retired queue and their generations never match again.
    pub fn reset(&mut self, listener: &mut dyn RemovalListener) -> Result<(), ContainerError> {
        for id in self.arena.ids() {
            if !self.queue.is_pending(id) {
                if let Some(generation) = self.arena.generation(id) {
                    self.queue.enqueue(id, generation);
                }
            }
        }
        self.release_deregistered_objects(false, listener)?;
        let leak = self.check_for_leaks().err();
        if let Some(report) = &leak {
            tracing::error!(%report, "object bookkeeping mismatch at reset");
        }
        debug_assert!(leak.is_none(), "leak at reset: {leak:?}");
        self.queue.clear();
        self.queue = DeregisterQueue::new();
        self.arena.clear();
        self.by_kind.clear();
        self.dummies.clear();
        self.load_claims.clear();
        self.registered = 0;
        self.deregistered = 0;
        tracing::debug!("object container reset");
        Ok(())
    }

    // ── Reservation ─────────────────────────────────────────────

    /// Reserve `id` so the free list never hands it out.
    pub fn reserve_id(&mut self, id: ObjectId) -> Result<(), ContainerError> {
        self.arena.reserve(id)?;
        tracing::trace!(%id, "reserved id");
        Ok(())
    }

    /// Reserve the next free id.
    pub fn reserve_fresh_id(&mut self) -> Result<ObjectId, ContainerError> {
        let id = self.arena.reserve_fresh()?;
        tracing::trace!(%id, "reserved fresh id");
        Ok(id)
    }

    /// Drop the reservation on `id`. Fails if the slot is occupied.
    pub fn unreserve_id(&mut self, id: ObjectId) -> Result<(), ContainerError> {
        self.arena.unreserve(id)?;
        self.load_claims.remove(&id);
        tracing::trace!(%id, "unreserved id");
        Ok(())
    }

    /// Whether `id` is reserved.
    pub fn is_reserved(&self, id: ObjectId) -> bool {
        self.arena.is_reserved(id)
    }

    /// Reserved ids in ascending order.
    pub fn reserved_ids(&self) -> Vec<ObjectId> {
        self.arena.reserved_ids().collect()
    }

    // ── Lookup ──────────────────────────────────────────────────

    /// Whether `id` names a live object.
    pub fn validate(&self, id: ObjectId) -> bool {
        self.arena.validate(id)
    }

    /// State of the slot behind `id`.
    pub fn slot_state(&self, id: ObjectId) -> SlotState {
        self.arena.state(id)
    }

    /// The live object at `id`.
    pub fn get(&self, id: ObjectId) -> Option<&dyn AiObject> {
        self.arena.get(id).map(|b| &**b)
    }

    /// The live object at `id`, mutably.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut (dyn AiObject + 'static)> {
        self.arena.get_mut(id).map(|b| &mut **b)
    }

    /// A weak reference to the live object at `id`, or nil.
    pub fn weak_ref(&self, id: ObjectId) -> WeakRef {
        match self.arena.generation(id) {
            Some(generation) => WeakRef::bound(id, generation),
            None => WeakRef::nil(),
        }
    }

    /// Resolve `weak` to its target if it is still live and is a `T`.
    pub fn resolve<T: ObjectType + ?Sized>(&self, weak: &WeakRef<T>) -> Option<&T> {
        if weak.is_nil() || self.arena.generation(weak.id()) != Some(weak.generation()) {
            return None;
        }
        T::cast(&**self.arena.get(weak.id())?)
    }

    /// Resolve `weak` mutably.
    pub fn resolve_mut<T: ObjectType + ?Sized>(&mut self, weak: &WeakRef<T>) -> Option<&mut T> {
        if weak.is_nil() || self.arena.generation(weak.id()) != Some(weak.generation()) {
            return None;
        }
        T::cast_mut(&mut **self.arena.get_mut(weak.id())?)
    }

    /// Live objects in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &dyn AiObject)> + '_ {
        self.arena.iter().map(|(id, b)| (id, &**b as &dyn AiObject))
    }

    /// Ids of live objects in ascending order.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.arena.ids()
    }

    /// Ids and generations of every live object.
    pub fn live_ids(&self) -> LiveIds {
        LiveIds::from_pairs(
            self.arena
                .ids()
                .into_iter()
                .filter_map(|id| Some((id, self.arena.generation(id)?))),
        )
    }

    /// Objects of `kind`, in registration order.
    pub fn objects_of_kind(&self, kind: ObjectKind) -> &[CountedRef] {
        self.by_kind.get(kind)
    }

    /// Dummy objects of `kind`, in registration order.
    pub fn dummies_of_kind(&self, kind: ObjectKind) -> &[CountedRef] {
        self.dummies.get(kind)
    }

    // ── Bookkeeping ─────────────────────────────────────────────

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether no object is live.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Configured id ceiling.
    pub fn capacity(&self) -> u32 {
        self.arena.capacity()
    }

    /// Number of ids waiting for the next flush.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Whether `id` is waiting for the next flush.
    pub fn is_pending(&self, id: ObjectId) -> bool {
        self.queue.is_pending(id)
    }

    /// Registrations since the last reset.
    pub fn registered_count(&self) -> u64 {
        self.registered
    }

    /// Destructions since the last reset.
    pub fn deregistered_count(&self) -> u64 {
        self.deregistered
    }

    /// Handle to the pending-deletion queue.
    pub fn queue(&self) -> &DeregisterQueue {
        &self.queue
    }

    /// Membership ledger for building indices that the container checks
    /// at destruction.
    pub fn memberships(&self) -> Memberships {
        self.memberships.clone()
    }

    /// Refile every live object in the container's own indices.
    pub fn rebuild_object_maps(&mut self) {
        self.by_kind.clear();
        self.dummies.clear();
        for (id, object) in self.arena.iter() {
            let Some(generation) = self.arena.generation(id) else {
                continue;
            };
            let member = CountedRef::new(WeakRef::bound(id, generation));
            self.by_kind.insert(object.kind(), member);
            if object.is_dummy() {
                self.dummies.insert(object.kind(), member);
            }
        }
    }

    /// One line per touched slot: id, state, generation and occupant.
    pub fn dump_slots(&self) -> String {
        let mut out = String::new();
        for raw in 1..=self.arena.high_water() {
            let id = ObjectId(raw);
            let state = self.arena.state(id);
            let reserved = if self.arena.is_reserved(id) { " reserved" } else { "" };
            match self.arena.get(id) {
                Some(object) => {
                    let generation = self.arena.generation(id).unwrap_or(0);
                    let _ = writeln!(
                        out,
                        "{raw:>6} {state:?}@{generation}{reserved} {} '{}'",
                        object.kind(),
                        object.core().name
                    );
                }
                None => {
                    let _ = writeln!(out, "{raw:>6} {state:?}{reserved}");
                }
            }
        }
        out
    }
}

impl Drop for ObjectContainer {
    fn drop(&mut self) {
        if !self.arena.is_empty() {
            tracing::debug!(live = self.arena.len(), "dropping container with live objects");
        }
    }
}

impl std::fmt::Debug for ObjectContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectContainer")
            .field("live", &self.arena.len())
            .field("pending", &self.queue.len())
            .field("reserved", &self.arena.reserved_count())
            .field("registered", &self.registered)
            .field("deregistered", &self.deregistered)
            .finish()
    }
}
