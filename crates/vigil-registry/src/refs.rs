//! Weak, strong and counted object references.
//!
//! All three carry the target's [`ObjectId`] plus the slot generation
//! observed when the reference was taken. Resolution goes through the
//! [`ObjectContainer`] and succeeds only while both still match, so a
//! reference to a destroyed object never reaches whatever later reuses
//! its id.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use vigil_core::ObjectId;
use vigil_stream::{Primitive, StreamValue};

use crate::container::ObjectContainer;
use crate::object::{AiObject, LiveIds, ObjectType};
use crate::queue::DeregisterQueue;

// ── WeakRef ─────────────────────────────────────────────────────

/// Non-owning reference to an object of type `T`.
///
/// Copyable. Resolving re-validates against the container every time and
/// yields `None` once the target is gone or is not a `T`.
///
/// A weak reference read from a stream is *unbound*: it knows the id but
/// not the generation, and resolves to nothing until
/// [`rebind`](WeakRef::rebind) is called against the live id set after
/// loading completes.
pub struct WeakRef<T: ?Sized = dyn AiObject> {
    id: ObjectId,
    generation: u32,
    _target: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized> WeakRef<T> {
    /// The nil reference.
    pub const fn nil() -> Self {
        Self {
            id: ObjectId::INVALID,
            generation: 0,
            _target: PhantomData,
        }
    }

    pub(crate) const fn bound(id: ObjectId, generation: u32) -> Self {
        Self {
            id,
            generation,
            _target: PhantomData,
        }
    }

    /// A reference to `id` that still needs [`rebind`](WeakRef::rebind).
    pub const fn unbound(id: ObjectId) -> Self {
        Self::bound(id, 0)
    }

    /// Target id, or [`ObjectId::INVALID`] for nil.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Slot generation captured with the id; 0 when nil or unbound.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Whether this is the nil reference.
    pub fn is_nil(&self) -> bool {
        !self.id.is_valid()
    }

    /// Whether this names an id but has no generation yet.
    pub fn is_unbound(&self) -> bool {
        self.id.is_valid() && self.generation == 0
    }

    /// Reset to nil.
    pub fn reset(&mut self) {
        *self = Self::nil();
    }

    /// Attach the generation of the live object at this id.
    ///
    /// Unbound references pick up the current generation; references
    /// whose id is no longer live become nil. Bound references are left
    /// alone.
    pub fn rebind(&mut self, live: &LiveIds) {
        if !self.is_unbound() {
            return;
        }
        match live.generation(self.id) {
            Some(generation) => self.generation = generation,
            None => {
                tracing::debug!(id = %self.id, "dropping reference to object missing after load");
                self.reset();
            }
        }
    }

    /// Forget the static target type.
    pub fn untyped(self) -> WeakRef {
        WeakRef::bound(self.id, self.generation)
    }

    /// Retarget to `U` without checking; resolution still checks.
    pub fn cast<U: ?Sized>(self) -> WeakRef<U> {
        WeakRef::bound(self.id, self.generation)
    }

    /// Whether the target is alive and is a `T`.
    pub fn is_valid(&self, container: &ObjectContainer) -> bool
    where
        T: ObjectType,
    {
        self.get(container).is_some()
    }

    /// Resolve against `container`.
    pub fn get<'c>(&self, container: &'c ObjectContainer) -> Option<&'c T>
    where
        T: ObjectType,
    {
        container.resolve(self)
    }

    /// Resolve mutably against `container`.
    pub fn get_mut<'c>(&self, container: &'c mut ObjectContainer) -> Option<&'c mut T>
    where
        T: ObjectType,
    {
        container.resolve_mut(self)
    }
}

impl<T: ?Sized> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for WeakRef<T> {}

impl<T: ?Sized> Default for WeakRef<T> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<T: ?Sized> PartialEq for WeakRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.generation == other.generation
    }
}

impl<T: ?Sized> Eq for WeakRef<T> {}

impl<T: ?Sized> Hash for WeakRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.generation.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            f.write_str("WeakRef(nil)")
        } else {
            write!(f, "WeakRef({}@{})", self.id, self.generation)
        }
    }
}

/// Persisted as the bare id; reads back unbound.
impl<T: ?Sized> StreamValue for WeakRef<T> {
    const EXPECTED: &'static str = <ObjectId as StreamValue>::EXPECTED;

    fn to_primitive(&self) -> Primitive {
        self.id.to_primitive()
    }

    fn from_primitive(p: Primitive) -> Option<Self> {
        let id = ObjectId::from_primitive(p)?;
        Some(if id.is_valid() {
            Self::unbound(id)
        } else {
            Self::nil()
        })
    }
}

// ── StrongRef ───────────────────────────────────────────────────

/// The unique owning reference to a registered object.
///
/// Exactly one is minted per registration and it cannot be cloned.
/// Releasing it (explicitly or by dropping it) deregisters the target:
/// the id is queued and the object is destroyed at the container's next
/// flush. A released reference is nil.
pub struct StrongRef<T: ?Sized = dyn AiObject> {
    weak: WeakRef<T>,
    queue: Option<DeregisterQueue>,
}

impl<T: ?Sized> StrongRef<T> {
    /// The nil reference. Releasing it does nothing.
    pub fn nil() -> Self {
        Self {
            weak: WeakRef::nil(),
            queue: None,
        }
    }

    pub(crate) fn mint(weak: WeakRef<T>, queue: DeregisterQueue) -> Self {
        Self {
            weak,
            queue: Some(queue),
        }
    }

    /// Target id, or [`ObjectId::INVALID`] for nil.
    pub fn id(&self) -> ObjectId {
        self.weak.id()
    }

    /// Whether this is nil.
    pub fn is_nil(&self) -> bool {
        self.weak.is_nil()
    }

    /// Whether this owner releases into `queue`.
    pub(crate) fn minted_by(&self, queue: &DeregisterQueue) -> bool {
        self.queue.as_ref().is_some_and(|own| own.same_queue(queue))
    }

    /// A non-owning reference to the same target.
    pub fn weak(&self) -> WeakRef<T> {
        self.weak
    }

    /// Deregister the target and become nil. No-op when already nil.
    pub fn release(&mut self) {
        let weak = std::mem::take(&mut self.weak);
        if let Some(queue) = self.queue.take() {
            if !weak.is_nil() {
                queue.enqueue_ref(weak);
            }
        }
    }

    /// Release the current target, then take ownership of `other`'s.
    pub fn assign(&mut self, mut other: StrongRef<T>) {
        self.release();
        self.weak = std::mem::take(&mut other.weak);
        self.queue = other.queue.take();
    }

    /// Become nil without deregistering, returning the old target.
    ///
    /// For owners whose target is already queued or already destroyed.
    pub fn disown(&mut self) -> WeakRef<T> {
        self.queue = None;
        std::mem::take(&mut self.weak)
    }

    /// Forget the static target type, keeping ownership.
    pub fn into_untyped(self) -> StrongRef {
        self.cast()
    }

    /// Retarget to `U` without checking, keeping ownership.
    pub fn cast<U: ?Sized>(mut self) -> StrongRef<U> {
        let queue = self.queue.take();
        let weak = std::mem::take(&mut self.weak);
        StrongRef {
            weak: weak.cast(),
            queue,
        }
    }

    /// Resolve against `container`.
    pub fn get<'c>(&self, container: &'c ObjectContainer) -> Option<&'c T>
    where
        T: ObjectType,
    {
        self.weak.get(container)
    }

    /// Resolve mutably against `container`.
    pub fn get_mut<'c>(&self, container: &'c mut ObjectContainer) -> Option<&'c mut T>
    where
        T: ObjectType,
    {
        self.weak.get_mut(container)
    }
}

impl<T: ?Sized> Default for StrongRef<T> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<T: ?Sized> Drop for StrongRef<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: ?Sized> fmt::Debug for StrongRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nil() {
            f.write_str("StrongRef(nil)")
        } else {
            write!(f, "StrongRef({}@{})", self.weak.id, self.weak.generation)
        }
    }
}

// ── CountedRef ──────────────────────────────────────────────────

/// Non-owning reference held by an [`ObjectIndex`](crate::ObjectIndex).
///
/// Behaves like a [`WeakRef`]; the index that stores it reports each
/// insertion and removal to the container's membership ledger, which
/// must read zero for an object by the time it is destroyed.
pub struct CountedRef<T: ?Sized = dyn AiObject> {
    weak: WeakRef<T>,
}

impl<T: ?Sized> CountedRef<T> {
    /// Wrap a weak reference.
    pub fn new(weak: WeakRef<T>) -> Self {
        Self { weak }
    }

    /// Target id.
    pub fn id(&self) -> ObjectId {
        self.weak.id()
    }

    /// The underlying weak reference.
    pub fn weak(&self) -> WeakRef<T> {
        self.weak
    }

    /// Resolve against `container`.
    pub fn get<'c>(&self, container: &'c ObjectContainer) -> Option<&'c T>
    where
        T: ObjectType,
    {
        self.weak.get(container)
    }
}

impl<T: ?Sized> Clone for CountedRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for CountedRef<T> {}

impl<T: ?Sized> PartialEq for CountedRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.weak == other.weak
    }
}

impl<T: ?Sized> Eq for CountedRef<T> {}

impl<T: ?Sized> fmt::Debug for CountedRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CountedRef({}@{})", self.weak.id, self.weak.generation)
    }
}

impl<T: ?Sized> From<WeakRef<T>> for CountedRef<T> {
    fn from(weak: WeakRef<T>) -> Self {
        Self::new(weak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_stream::{MemoryStream, Serializer};

    #[test]
    fn nil_and_unbound() {
        let nil = WeakRef::<dyn AiObject>::nil();
        assert!(nil.is_nil());
        assert!(!nil.is_unbound());
        let unbound = WeakRef::<dyn AiObject>::unbound(ObjectId(4));
        assert!(unbound.is_unbound());
        assert_eq!(unbound.generation(), 0);
    }

    #[test]
    fn rebind_binds_or_nils() {
        let live = LiveIds::from_pairs([(ObjectId(4), 7)]);
        let mut present = WeakRef::<dyn AiObject>::unbound(ObjectId(4));
        present.rebind(&live);
        assert_eq!(present.generation(), 7);

        let mut gone = WeakRef::<dyn AiObject>::unbound(ObjectId(5));
        gone.rebind(&live);
        assert!(gone.is_nil());

        let mut bound = WeakRef::<dyn AiObject>::bound(ObjectId(4), 2);
        bound.rebind(&live);
        assert_eq!(bound.generation(), 2, "bound references are left alone");
    }

    #[test]
    fn weak_ref_persists_as_bare_id() {
        let mut stream = MemoryStream::new();
        let mut ser = Serializer::new(&mut stream);
        let mut weak = WeakRef::<dyn AiObject>::bound(ObjectId(8), 3);
        let mut nil = WeakRef::<dyn AiObject>::nil();
        ser.value("target", &mut weak).unwrap();
        ser.value("none", &mut nil).unwrap();

        stream.rewind();
        let mut ser = Serializer::new(&mut stream);
        let mut loaded = WeakRef::<dyn AiObject>::nil();
        ser.value("target", &mut loaded).unwrap();
        assert_eq!(loaded.id(), ObjectId(8));
        assert!(loaded.is_unbound());
        ser.value("none", &mut loaded).unwrap();
        assert!(loaded.is_nil());
    }

    #[test]
    fn release_enqueues_exactly_once() {
        let queue = DeregisterQueue::new();
        let mut strong: StrongRef = StrongRef::mint(WeakRef::bound(ObjectId(2), 1), queue.clone());
        strong.release();
        strong.release();
        drop(strong);
        assert_eq!(queue.len(), 1);
        assert!(queue.is_pending(ObjectId(2)));
    }

    #[test]
    fn cast_keeps_ownership() {
        let queue = DeregisterQueue::new();
        let strong: StrongRef = StrongRef::mint(WeakRef::bound(ObjectId(3), 1), queue.clone());
        let typed: StrongRef<crate::testing::Fixture> = strong.cast();
        assert!(queue.is_empty());
        assert_eq!(typed.id(), ObjectId(3));
        drop(typed);
        assert!(queue.is_pending(ObjectId(3)));
    }

    #[test]
    fn nil_strong_ref_is_inert() {
        let mut strong = StrongRef::<dyn AiObject>::default();
        strong.release();
        assert!(strong.is_nil());
        assert_eq!(format!("{strong:?}"), "StrongRef(nil)");
    }
}
