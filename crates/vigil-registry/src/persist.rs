//! Save and load for the object container.
//!
//! A load runs in three steps, each against the same stream position the
//! matching save step wrote:
//!
//! 1. [`serialize_object_ids`](ObjectContainer::serialize_object_ids)
//!    restores the reserved set and claims every id that held an object,
//!    so nothing created before the payload is read can take those ids.
//! 2. [`serialize`](ObjectContainer::serialize) recreates each object at
//!    its saved id through an [`ObjectFactory`] and reads its state.
//! 3. [`post_serialize`](ObjectContainer::post_serialize) rebinds weak
//!    references, releases claims nothing filled, and rebuilds indices.

use vigil_core::{ObjectId, ObjectKind};
use vigil_stream::Serializer;

use crate::container::ObjectContainer;
use crate::error::ContainerError;
use crate::listener::ObjectFactory;
use crate::object::AiObject;

impl ObjectContainer {
    /// Write or read the reserved and occupied id sets.
    ///
    /// Reading requires a container with no live objects.
    pub fn serialize_object_ids(&mut self, ser: &mut Serializer<'_>) -> Result<(), ContainerError> {
        ser.begin_group("ObjectIds")?;
        if ser.is_reading() {
            if !self.arena.is_empty() {
                return Err(ContainerError::NotEmpty {
                    live: self.arena.len(),
                });
            }

            ser.begin_group("reservedObjects")?;
            let mut count = 0u32;
            ser.value("count", &mut count)?;
            for _ in 0..count {
                let mut id = ObjectId::INVALID;
                ser.value("id", &mut id)?;
                self.arena.reserve(id)?;
            }
            ser.end_group()?;

            ser.begin_group("existingObjects")?;
            let mut count = 0u32;
            ser.value("count", &mut count)?;
            for _ in 0..count {
                ser.begin_group("object")?;
                let mut id = ObjectId::INVALID;
                ser.value("id", &mut id)?;
                ser.end_group()?;
                if !self.arena.is_reserved(id) {
                    self.arena.claim(id)?;
                    self.load_claims.insert(id);
                }
            }
            ser.end_group()?;
            tracing::debug!(
                reserved = self.arena.reserved_count(),
                claimed = self.load_claims.len(),
                "loaded object ids"
            );
        } else {
            ser.begin_group("reservedObjects")?;
            let reserved: Vec<ObjectId> = self.arena.reserved_ids().collect();
            let mut count = reserved.len() as u32;
            ser.value("count", &mut count)?;
            for mut id in reserved {
                ser.value("id", &mut id)?;
            }
            ser.end_group()?;

            ser.begin_group("existingObjects")?;
            let existing = self.persisted_ids();
            let mut count = existing.len() as u32;
            ser.value("count", &mut count)?;
            for mut id in existing {
                ser.begin_group("object")?;
                ser.value("id", &mut id)?;
                ser.end_group()?;
            }
            ser.end_group()?;
        }
        ser.end_group()?;
        Ok(())
    }

    /// Write or read every persisted object.
    ///
    /// When reading, each object is built by `factory`, registered at its
    /// saved id, filled from the stream, told it is registered, and its
    /// owning reference handed to [`ObjectFactory::adopt`]. Unknown kind
    /// tags load as [`ObjectKind::Generic`].
    pub fn serialize(
        &mut self,
        ser: &mut Serializer<'_>,
        factory: &mut dyn ObjectFactory,
    ) -> Result<(), ContainerError> {
        ser.begin_group("ObjectContainer")?;
        if ser.is_reading() {
            let mut total = 0u32;
            ser.value("total", &mut total)?;
            for expected in 0..total {
                let mut index = 0u32;
                ser.value("index", &mut index)?;
                if index != expected {
                    return Err(ContainerError::Corrupt {
                        detail: format!("object record {index} found where {expected} was expected"),
                    });
                }
                let mut id = ObjectId::INVALID;
                ser.value("id", &mut id)?;
                let mut tag = 0u16;
                ser.value("type", &mut tag)?;
                let kind = ObjectKind::from_tag(tag).unwrap_or_else(|| {
                    tracing::warn!(%id, tag, "unknown object kind; loading as generic");
                    ObjectKind::Generic
                });

                if self.load_claims.remove(&id) {
                    self.arena.unreserve(id)?;
                }
                let owner = self.register_object(factory.create(kind), Some(id))?;
                let object = self
                    .arena
                    .get_mut(id)
                    .ok_or(ContainerError::NotRegistered { id })?;
                serialize_payload(id, &mut **object, ser)?;
                object.on_registered();
                factory.adopt(owner);
            }
            tracing::debug!(total, "loaded objects");
        } else {
            let ids = self.persisted_ids();
            let mut total = ids.len() as u32;
            ser.value("total", &mut total)?;
            for (index, id) in ids.into_iter().enumerate() {
                let mut index = index as u32;
                ser.value("index", &mut index)?;
                let mut recorded = id;
                ser.value("id", &mut recorded)?;
                let object = self
                    .arena
                    .get_mut(id)
                    .ok_or(ContainerError::NotRegistered { id })?;
                let mut tag = object.kind().tag();
                ser.value("type", &mut tag)?;
                serialize_payload(id, &mut **object, ser)?;
            }
        }
        ser.end_group()?;
        Ok(())
    }

    /// Finish a load: rebind references, release unfilled claims and
    /// rebuild the container's indices.
    pub fn post_serialize(&mut self) -> Result<(), ContainerError> {
        let live = self.live_ids();
        for (_, object) in self.arena.iter_mut() {
            object.post_serialize(&live);
        }
        for id in std::mem::take(&mut self.load_claims) {
            tracing::warn!(%id, "saved object id was never recreated; releasing it");
            self.arena.unreserve(id)?;
        }
        self.rebuild_object_maps();
        Ok(())
    }

    /// Serialize the state of a single live object, framed the same way as
    /// a full save.
    pub fn serialize_object(
        &mut self,
        id: ObjectId,
        ser: &mut Serializer<'_>,
    ) -> Result<(), ContainerError> {
        let object = self
            .arena
            .get_mut(id)
            .ok_or(ContainerError::NotRegistered { id })?;
        serialize_payload(id, &mut **object, ser)
    }

    /// Ids that a full save includes.
    fn persisted_ids(&self) -> Vec<ObjectId> {
        self.arena
            .iter()
            .filter(|(_, object)| object.should_serialize())
            .map(|(id, _)| id)
            .collect()
    }
}

/// One object's payload, prefixed by its id so a misaligned read fails
/// before any state is overwritten.
fn serialize_payload(
    id: ObjectId,
    object: &mut dyn AiObject,
    ser: &mut Serializer<'_>,
) -> Result<(), ContainerError> {
    ser.begin_group("AIObject")?;
    let mut recorded = id;
    ser.value("objectId", &mut recorded)?;
    if recorded != id {
        return Err(ContainerError::IdMismatch {
            expected: id,
            found: recorded,
        });
    }
    object.serialize(ser)?;
    ser.end_group()?;
    Ok(())
}
