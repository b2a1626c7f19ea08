//! The AI object trait and the state every object carries.

use std::any::Any;
use std::collections::BTreeMap;

use vigil_core::{EntityId, FactionId, ObjectId, ObjectKind};
use vigil_stream::{Serializer, StreamError};

use crate::refs::WeakRef;

/// State common to every AI object.
///
/// The self-reference is installed by the container at registration and
/// is nil before that; an object whose self-reference is set cannot be
/// registered again.
#[derive(Clone, Debug)]
pub struct ObjectCore {
    pub(crate) self_ref: WeakRef,
    /// Runtime type tag.
    pub kind: ObjectKind,
    /// Display name.
    pub name: String,
    /// Owning game entity, if any.
    pub entity: Option<EntityId>,
    /// Faction membership.
    pub faction: FactionId,
    /// World position.
    pub position: [f32; 3],
    /// Whether the object takes part in perception and updates.
    pub enabled: bool,
}

impl ObjectCore {
    /// Unregistered core of the given kind.
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            self_ref: WeakRef::nil(),
            kind,
            name: name.into(),
            entity: None,
            faction: FactionId::NONE,
            position: [0.0; 3],
            enabled: true,
        }
    }

    /// Registered id, or [`ObjectId::INVALID`] before registration.
    pub fn id(&self) -> ObjectId {
        self.self_ref.id()
    }

    /// Weak reference to this object; nil before registration.
    pub fn self_ref(&self) -> WeakRef {
        self.self_ref
    }

    /// Whether the container has registered this object.
    pub fn is_registered(&self) -> bool {
        !self.self_ref.is_nil()
    }

    /// Write or read the persisted fields.
    ///
    /// Id and kind are written by the container ahead of the payload and
    /// are not repeated here.
    pub fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), StreamError> {
        ser.begin_group("Core")?;
        ser.value("name", &mut self.name)?;
        let mut has_entity = self.entity.is_some();
        ser.value("hasEntity", &mut has_entity)?;
        if has_entity {
            let mut entity = self.entity.unwrap_or_default();
            ser.value("entity", &mut entity)?;
            self.entity = Some(entity);
        } else {
            self.entity = None;
        }
        ser.value("faction", &mut self.faction)?;
        ser.value("position", &mut self.position)?;
        ser.value("enabled", &mut self.enabled)?;
        ser.end_group()
    }
}

/// An object managed by the AI system.
///
/// Implementors embed an [`ObjectCore`] and expose it through
/// [`core`](AiObject::core). The remaining methods have defaults suited to
/// a plain object.
pub trait AiObject: Any {
    /// Shared state.
    fn core(&self) -> &ObjectCore;

    /// Shared state, mutably.
    fn core_mut(&mut self) -> &mut ObjectCore;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for downcasting to the concrete type, mutably.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Registered id.
    fn id(&self) -> ObjectId {
        self.core().id()
    }

    /// Runtime type tag.
    fn kind(&self) -> ObjectKind {
        self.core().kind
    }

    /// Whether this is a helper object with no behaviour of its own.
    fn is_dummy(&self) -> bool {
        self.kind() == ObjectKind::Dummy
    }

    /// Whether a full save should include this object.
    fn should_serialize(&self) -> bool {
        true
    }

    /// Write or read the object's persisted state.
    fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), StreamError> {
        self.core_mut().serialize(ser)
    }

    /// Rebind references after every object has been loaded.
    fn post_serialize(&mut self, _live: &LiveIds) {}

    /// Called once the object has its id and self-reference.
    fn on_registered(&mut self) {}
}

/// Downcast seam used by typed references.
///
/// Implemented for `dyn AiObject` (always succeeds) and for each
/// concrete object type (succeeds when the runtime type matches).
pub trait ObjectType: 'static {
    /// View `object` as `Self`.
    fn cast<'a>(object: &'a (dyn AiObject + 'static)) -> Option<&'a Self>;

    /// View `object` as `Self`, mutably.
    fn cast_mut<'a>(object: &'a mut (dyn AiObject + 'static)) -> Option<&'a mut Self>;
}

impl ObjectType for dyn AiObject {
    fn cast<'a>(object: &'a (dyn AiObject + 'static)) -> Option<&'a Self> {
        Some(object)
    }

    fn cast_mut<'a>(object: &'a mut (dyn AiObject + 'static)) -> Option<&'a mut Self> {
        Some(object)
    }
}

/// Implement [`ObjectType`] for concrete [`AiObject`] types.
#[macro_export]
macro_rules! impl_object_type {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::ObjectType for $ty {
            fn cast<'a>(object: &'a (dyn $crate::AiObject + 'static)) -> Option<&'a Self> {
                object.as_any().downcast_ref::<Self>()
            }

            fn cast_mut<'a>(
                object: &'a mut (dyn $crate::AiObject + 'static),
            ) -> Option<&'a mut Self> {
                object.as_any_mut().downcast_mut::<Self>()
            }
        }
    )+};
}

/// Snapshot of live ids and their generations, used to rebind
/// references after a load.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveIds {
    generations: BTreeMap<ObjectId, u32>,
}

impl LiveIds {
    /// Build from `(id, generation)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ObjectId, u32)>) -> Self {
        Self {
            generations: pairs.into_iter().collect(),
        }
    }

    /// Generation of the live object at `id`.
    pub fn generation(&self, id: ObjectId) -> Option<u32> {
        self.generations.get(&id).copied()
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.generations.contains_key(&id)
    }

    /// Number of live ids.
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    /// Whether nothing is live.
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// A reference to `id` bound to its live generation, or nil.
    pub fn bind<T: ?Sized>(&self, id: ObjectId) -> WeakRef<T> {
        let mut weak = WeakRef::unbound(id);
        weak.rebind(self);
        weak
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_stream::MemoryStream;

    #[test]
    fn new_core_is_unregistered() {
        let core = ObjectCore::new(ObjectKind::Actor, "grunt");
        assert!(!core.is_registered());
        assert_eq!(core.id(), ObjectId::INVALID);
        assert_eq!(core.faction, FactionId::NONE);
        assert!(core.enabled);
    }

    #[test]
    fn core_round_trips_without_identity() {
        let mut core = ObjectCore::new(ObjectKind::Vehicle, "truck");
        core.entity = Some(EntityId(40));
        core.faction = FactionId(3);
        core.position = [4.0, 5.0, 6.0];
        core.enabled = false;

        let mut stream = MemoryStream::new();
        let mut ser = Serializer::new(&mut stream);
        core.serialize(&mut ser).unwrap();
        ser.finish().unwrap();

        stream.rewind();
        let mut loaded = ObjectCore::new(ObjectKind::Vehicle, "");
        let mut ser = Serializer::new(&mut stream);
        loaded.serialize(&mut ser).unwrap();
        assert_eq!(loaded.name, "truck");
        assert_eq!(loaded.entity, Some(EntityId(40)));
        assert_eq!(loaded.faction, FactionId(3));
        assert_eq!(loaded.position, [4.0, 5.0, 6.0]);
        assert!(!loaded.enabled);
        assert!(!loaded.is_registered());
    }

    #[test]
    fn live_ids_bind_or_nil() {
        let live = LiveIds::from_pairs([(ObjectId(2), 5), (ObjectId(9), 1)]);
        let bound: WeakRef = live.bind(ObjectId(2));
        assert_eq!(bound.generation(), 5);
        let missing: WeakRef = live.bind(ObjectId(3));
        assert!(missing.is_nil());
        assert_eq!(live.len(), 2);
    }
}
