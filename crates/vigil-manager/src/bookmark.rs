//! Bookmarks: the saved state of a pooled entity's AI object.
//!
//! The pool writes a bookmark when it parks an entity and reads it back
//! when the entity is reactivated. The record is an optional group:
//!
//! ```text
//! BookmarkedAIObject (present only if the entity had an object)
//!   name, classTag, objectId
//!   AIObject { objectId, <object payload> }
//! ```

use vigil_core::{EntityId, ObjectId, ObjectKind};
use vigil_registry::{ContainerError, StrongRef};
use vigil_stream::Serializer;

use crate::error::ManagerError;
use crate::manager::ObjectManager;
use crate::objects::{self, Leader};

const GROUP: &str = "BookmarkedAIObject";

impl ObjectManager {
    /// Write or read the bookmark for `entity`.
    ///
    /// When reading into a slot with no live object, the object is
    /// recreated at its bookmarked id with a pool slab block. When a live
    /// object is already there it is reused and its state overwritten.
    /// Either way the entity is bound to the object only once the whole
    /// record has been read, and a leader's formation points are rebuilt
    /// to the bookmarked size.
    ///
    /// Returns the object's id, or `None` if the bookmark holds no object.
    pub fn serialize_bookmark(
        &mut self,
        entity: EntityId,
        ser: &mut Serializer<'_>,
    ) -> Result<Option<ObjectId>, ManagerError> {
        if ser.is_reading() {
            self.read_bookmark(entity, ser)
        } else {
            self.write_bookmark(entity, ser)
        }
    }

    fn write_bookmark(
        &mut self,
        entity: EntityId,
        ser: &mut Serializer<'_>,
    ) -> Result<Option<ObjectId>, ManagerError> {
        let bound = self
            .fanout
            .entities
            .get(&entity)
            .copied()
            .filter(|&id| self.container.validate(id));
        let Some(id) = bound else {
            ser.optional_group(GROUP, false)?;
            return Ok(None);
        };
        let object = self
            .container
            .get(id)
            .ok_or(ManagerError::UnknownObject { id })?;
        let mut name = object.core().name.clone();
        let mut tag = object.kind().tag();

        ser.optional_group(GROUP, true)?;
        let mut recorded = id;
        ser.value("name", &mut name)?;
        ser.value("classTag", &mut tag)?;
        ser.value("objectId", &mut recorded)?;
        self.container.serialize_object(id, ser)?;
        ser.end_group()?;
        tracing::debug!(%entity, %id, "wrote bookmark");
        Ok(Some(id))
    }

    fn read_bookmark(
        &mut self,
        entity: EntityId,
        ser: &mut Serializer<'_>,
    ) -> Result<Option<ObjectId>, ManagerError> {
        if !ser.optional_group(GROUP, false)? {
            return Ok(None);
        }
        let mut name = String::new();
        let mut tag = 0u16;
        let mut id = ObjectId::INVALID;
        ser.value("name", &mut name)?;
        ser.value("classTag", &mut tag)?;
        ser.value("objectId", &mut id)?;
        let kind = ObjectKind::from_tag(tag).unwrap_or_else(|| {
            tracing::warn!(%id, tag, "unknown object kind in bookmark; loading as generic");
            ObjectKind::Generic
        });

        let reused = self.container.get(id).is_some() && !self.container.is_pending(id);
        // A live pooled object already holds its block; only a block taken
        // here is given back on failure.
        let fresh_block = self.fanout.slab.block_of(id).is_none();
        self.fanout.slab.alloc(id, entity, kind)?;
        let read = if reused {
            self.read_payload(id, ser)
        } else {
            self.recreate(id, kind, &name, ser).map(|owner| {
                self.fanout.owners.insert(id, owner);
            })
        };
        if let Err(err) = read {
            if fresh_block {
                self.fanout.slab.free(id);
            }
            return Err(err);
        }
        if reused {
            self.fanout.unfile(id);
        }
        ser.end_group()?;
        self.fanout.pooled.insert(id, entity);

        let live = self.container.live_ids();
        if let Some(object) = self.container.get_mut(id) {
            if !reused {
                object.on_registered();
            }
            object.post_serialize(&live);
            object.core_mut().entity = Some(entity);
        }
        if let Some(object) = self.container.get(id) {
            self.fanout.file(id, object);
        }
        let formation = self
            .get::<Leader>(id)
            .and_then(|leader| leader.formation_to_rebuild());
        if let Some(points) = formation {
            self.create_formation(id, points)?;
        }
        tracing::debug!(%entity, %id, reused, "read bookmark");
        Ok(Some(id))
    }

    /// Register a blank object at `id` and read its payload.
    ///
    /// On failure the owner is dropped, which deregisters the half-read
    /// object for the next flush.
    fn recreate(
        &mut self,
        id: ObjectId,
        kind: ObjectKind,
        name: &str,
        ser: &mut Serializer<'_>,
    ) -> Result<StrongRef, ManagerError> {
        let owner = self
            .container
            .register_object(objects::construct(kind, name), Some(id))?;
        self.read_payload(id, ser)?;
        Ok(owner)
    }

    fn read_payload(&mut self, id: ObjectId, ser: &mut Serializer<'_>) -> Result<(), ManagerError> {
        self.container
            .serialize_object(id, ser)
            .map_err(|err| match err {
                ContainerError::IdMismatch { expected, found } => {
                    ManagerError::BookmarkMismatch { expected, found }
                }
                other => other.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManagerConfig;
    use crate::objects::{Actor, DummyObject};
    use crate::params::CreateParams;
    use vigil_core::{FactionId, GroupId};
    use vigil_stream::{MemoryStream, Primitive, StreamBackend};

    fn manager() -> ObjectManager {
        let mut config = ManagerConfig::new(16);
        config.pool_slab_blocks = 2;
        ObjectManager::new(&config).unwrap()
    }

    fn write(mgr: &mut ObjectManager, entity: EntityId) -> MemoryStream {
        let mut stream = MemoryStream::new();
        let mut ser = Serializer::new(&mut stream);
        mgr.serialize_bookmark(entity, &mut ser).unwrap();
        ser.finish().unwrap();
        stream.rewind();
        stream
    }

    #[test]
    fn entity_without_object_writes_empty_bookmark() {
        let mut mgr = manager();
        let mut stream = write(&mut mgr, EntityId(3));
        let mut ser = Serializer::new(&mut stream);
        assert_eq!(mgr.serialize_bookmark(EntityId(3), &mut ser).unwrap(), None);
        assert!(mgr.is_empty());
    }

    #[test]
    fn live_object_is_reused_in_place() {
        let mut mgr = manager();
        let id = mgr
            .create_object(
                CreateParams::new(ObjectKind::Actor)
                    .with_entity(EntityId(4))
                    .in_faction(FactionId(1)),
                &(),
            )
            .unwrap()
            .id();
        mgr.get_mut::<Actor>(id).unwrap().apply_damage(40.0);
        let mut stream = write(&mut mgr, EntityId(4));

        mgr.get_mut::<Actor>(id).unwrap().apply_damage(50.0);
        let mut ser = Serializer::new(&mut stream);
        assert_eq!(mgr.serialize_bookmark(EntityId(4), &mut ser).unwrap(), Some(id));
        ser.finish().unwrap();

        assert_eq!(mgr.len(), 1);
        assert_eq!(mgr.get::<Actor>(id).unwrap().health(), 60.0);
        assert_eq!(mgr.object_for_entity(EntityId(4)), Some(id));
        assert_eq!(mgr.faction_members(FactionId(1)).len(), 1);
        assert!(mgr.is_pooled(id));
    }

    /// A bookmark whose header names `header` but whose payload was
    /// written for `payload`.
    fn mismatched(header: ObjectId, payload: ObjectId) -> MemoryStream {
        let mut stream = MemoryStream::new();
        {
            let backend: &mut dyn StreamBackend = &mut stream;
            backend.write_value(GROUP, &Primitive::Bool(true)).unwrap();
            backend.begin_group(GROUP).unwrap();
            backend.write_value("name", &Primitive::Str("x".into())).unwrap();
            backend
                .write_value("classTag", &Primitive::U16(ObjectKind::Generic.tag()))
                .unwrap();
            backend.write_value("objectId", &Primitive::U32(header.0)).unwrap();
            backend.begin_group("AIObject").unwrap();
            backend.write_value("objectId", &Primitive::U32(payload.0)).unwrap();
        }
        stream.rewind();
        stream
    }

    #[test]
    fn header_and_payload_must_agree() {
        let mut stream = mismatched(ObjectId(5), ObjectId(6));
        let mut mgr = manager();
        let mut ser = Serializer::new(&mut stream);
        let err = mgr.serialize_bookmark(EntityId(1), &mut ser).unwrap_err();
        assert!(matches!(
            err,
            ManagerError::BookmarkMismatch {
                expected: ObjectId(5),
                found: ObjectId(6)
            }
        ));
        assert_eq!(mgr.object_for_entity(EntityId(1)), None);
        assert!(mgr.slab().is_empty());
        // The half-built object goes at the next flush.
        assert_eq!(mgr.release_deregistered_objects().unwrap(), 1);
        assert!(mgr.is_empty());
    }

    #[test]
    fn failed_read_over_live_object_keeps_its_block() {
        let mut mgr = manager();
        let id = mgr
            .create_object(CreateParams::new(ObjectKind::Actor).with_entity(EntityId(4)), &())
            .unwrap()
            .id();
        // Reading its own bookmark back makes the live object pooled.
        let mut stream = write(&mut mgr, EntityId(4));
        let mut ser = Serializer::new(&mut stream);
        mgr.serialize_bookmark(EntityId(4), &mut ser).unwrap();
        ser.finish().unwrap();
        let block = mgr.slab().block_of(id);
        assert!(block.is_some());

        let mut stream = mismatched(id, ObjectId(id.0 + 1));
        let mut ser = Serializer::new(&mut stream);
        assert!(matches!(
            mgr.serialize_bookmark(EntityId(4), &mut ser),
            Err(ManagerError::BookmarkMismatch { .. })
        ));
        assert!(mgr.container().validate(id));
        assert!(mgr.is_pooled(id));
        assert_eq!(mgr.slab().block_of(id), block);
        assert_eq!(mgr.slab().len(), 1);
    }

    fn leader_with_formation(mgr: &mut ObjectManager, entity: EntityId, points: u32) -> ObjectId {
        let id = mgr
            .create_object(
                CreateParams::new(ObjectKind::Leader)
                    .named("lt")
                    .with_entity(entity)
                    .in_group(GroupId(2)),
                &(),
            )
            .unwrap()
            .id();
        mgr.create_formation(id, points).unwrap();
        id
    }

    #[test]
    fn recreated_leader_gets_its_formation_back() {
        let mut mgr = manager();
        let id = leader_with_formation(&mut mgr, EntityId(7), 3);
        let mut stream = write(&mut mgr, EntityId(7));
        assert_eq!(mgr.on_entity_returned_to_pool(EntityId(7)).unwrap(), Some(id));
        assert_eq!(mgr.release_deregistered_objects().unwrap(), 4);
        assert!(mgr.is_empty());

        let mut ser = Serializer::new(&mut stream);
        assert_eq!(mgr.serialize_bookmark(EntityId(7), &mut ser).unwrap(), Some(id));
        ser.finish().unwrap();

        let formation = mgr.get::<Leader>(id).unwrap().formation();
        assert_eq!(formation.len(), 3);
        for point in formation {
            let dummy = mgr.get::<DummyObject>(point).unwrap();
            assert_eq!(dummy.owner().id(), id);
        }
        assert_eq!(mgr.group_leader(GroupId(2)), Some(id));
        assert_eq!(mgr.len(), 4);
    }

    #[test]
    fn reused_leader_formation_follows_the_bookmark() {
        let mut mgr = manager();
        let id = leader_with_formation(&mut mgr, EntityId(7), 3);
        let kept = mgr.get::<Leader>(id).unwrap().formation();
        let mut stream = write(&mut mgr, EntityId(7));

        // Reading the bookmark straight back keeps the points it had.
        let mut ser = Serializer::new(&mut stream);
        mgr.serialize_bookmark(EntityId(7), &mut ser).unwrap();
        ser.finish().unwrap();
        assert_eq!(mgr.get::<Leader>(id).unwrap().formation(), kept);

        let mut stream = write(&mut mgr, EntityId(7));
        mgr.create_formation(id, 5).unwrap();
        let mut ser = Serializer::new(&mut stream);
        mgr.serialize_bookmark(EntityId(7), &mut ser).unwrap();
        ser.finish().unwrap();

        assert_eq!(mgr.get::<Leader>(id).unwrap().formation().len(), 3);
        // The three original points and the five interim ones.
        assert_eq!(mgr.release_deregistered_objects().unwrap(), 8);
        assert_eq!(mgr.len(), 4);
    }
}
