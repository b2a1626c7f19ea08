//! Full save and load of the manager.

use vigil_core::{EntityId, ObjectId};
use vigil_registry::ContainerError;
use vigil_stream::Serializer;

use crate::error::ManagerError;
use crate::factory::ManagerFactory;
use crate::manager::ObjectManager;
use crate::objects::Leader;

impl ObjectManager {
    /// Write or read every persisted object and the pooled-object table.
    ///
    /// Reading requires an empty manager. After the objects are read,
    /// cross-references are rebound, indices rebuilt from object state,
    /// pooled objects get their slab blocks back and leaders rebuild
    /// their formations.
    pub fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), ManagerError> {
        if ser.is_reading() {
            if !self.container.is_empty() {
                return Err(ContainerError::NotEmpty {
                    live: self.container.len(),
                }
                .into());
            }
            self.fanout.clear();
        }

        self.container.serialize_object_ids(ser)?;
        let mut factory = ManagerFactory {
            owners: &mut self.fanout.owners,
        };
        self.container.serialize(ser, &mut factory)?;
        self.serialize_pooled(ser)?;

        if ser.is_reading() {
            self.container.post_serialize()?;
            self.rebuild_indices();
            self.rebuild_formations()?;
            tracing::debug!(
                objects = self.container.len(),
                pooled = self.fanout.pooled.len(),
                "object manager loaded"
            );
        }
        Ok(())
    }

    fn serialize_pooled(&mut self, ser: &mut Serializer<'_>) -> Result<(), ManagerError> {
        ser.begin_group("PooledObjects")?;
        let mut blocks = self.fanout.slab.capacity();
        ser.value("slabBlocks", &mut blocks)?;
        if ser.is_reading() {
            if blocks > self.fanout.slab.capacity() {
                self.fanout.slab.resize(blocks)?;
            }
            let mut count = 0u32;
            ser.value("count", &mut count)?;
            for _ in 0..count {
                ser.begin_group("entry")?;
                let mut id = ObjectId::INVALID;
                let mut entity = EntityId::default();
                ser.value("object", &mut id)?;
                ser.value("entity", &mut entity)?;
                ser.end_group()?;
                let Some(kind) = self.container.get(id).map(|o| o.kind()) else {
                    tracing::warn!(%id, %entity, "pooled object missing from save; skipping");
                    continue;
                };
                self.fanout.slab.alloc(id, entity, kind)?;
                self.fanout.pooled.insert(id, entity);
            }
        } else {
            let mut pooled: Vec<(ObjectId, EntityId)> = self
                .fanout
                .pooled
                .iter()
                .map(|(&id, &entity)| (id, entity))
                .collect();
            pooled.sort_unstable();
            let mut count = pooled.len() as u32;
            ser.value("count", &mut count)?;
            for (mut id, mut entity) in pooled {
                ser.begin_group("entry")?;
                ser.value("object", &mut id)?;
                ser.value("entity", &mut entity)?;
                ser.end_group()?;
            }
        }
        ser.end_group()?;
        Ok(())
    }

    fn rebuild_formations(&mut self) -> Result<(), ManagerError> {
        let pending: Vec<(ObjectId, u32)> = self
            .container
            .iter()
            .filter_map(|(id, object)| {
                let leader = object.as_any().downcast_ref::<Leader>()?;
                Some((id, leader.formation_to_rebuild()?))
            })
            .collect();
        for (leader, points) in pending {
            self.create_formation(leader, points)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManagerConfig;
    use crate::objects::Actor;
    use crate::params::CreateParams;
    use crate::pool::PoolManager;
    use vigil_core::{FactionId, GroupId, ObjectKind};
    use vigil_stream::MemoryStream;

    struct OnePool(EntityId, ObjectId);

    impl PoolManager for OnePool {
        fn is_pool_backed(&self, entity: EntityId) -> bool {
            entity == self.0
        }

        fn reserved_object_id(&self, entity: EntityId) -> Option<ObjectId> {
            (entity == self.0).then_some(self.1)
        }
    }

    fn manager() -> ObjectManager {
        let mut config = ManagerConfig::new(64);
        config.pool_slab_blocks = 4;
        ObjectManager::new(&config).unwrap()
    }

    fn save(mgr: &mut ObjectManager) -> MemoryStream {
        let mut stream = MemoryStream::new();
        let mut ser = Serializer::new(&mut stream);
        mgr.serialize(&mut ser).unwrap();
        ser.finish().unwrap();
        stream.rewind();
        stream
    }

    #[test]
    fn load_rebuilds_indices_pool_state_and_formations() {
        let mut mgr = manager();
        let pooled_id = mgr.reserve_id_for_pooled_entity(EntityId(90)).unwrap();
        let pool = OnePool(EntityId(90), pooled_id);

        let leader = mgr
            .create_object(
                CreateParams::new(ObjectKind::Leader)
                    .named("sarge")
                    .in_group(GroupId(2)),
                &pool,
            )
            .unwrap()
            .id();
        mgr.create_formation(leader, 3).unwrap();
        let grunt = mgr
            .create_object(
                CreateParams::new(ObjectKind::Actor)
                    .with_entity(EntityId(90))
                    .in_faction(FactionId(5))
                    .in_group(GroupId(2)),
                &pool,
            )
            .unwrap()
            .id();
        assert_eq!(grunt, pooled_id);
        mgr.track_target(grunt, Some(leader)).unwrap();
        mgr.get_mut::<Actor>(grunt).unwrap().apply_damage(25.0);

        let mut stream = save(&mut mgr);
        let mut loaded = manager();
        let mut ser = Serializer::new(&mut stream);
        loaded.serialize(&mut ser).unwrap();
        ser.finish().unwrap();

        // Leader, grunt and a rebuilt formation of three.
        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded.group_leader(GroupId(2)), Some(leader));
        assert_eq!(loaded.group_members(GroupId(2))[0].id(), grunt);
        assert_eq!(loaded.faction_members(FactionId(5))[0].id(), grunt);
        assert_eq!(loaded.object_for_entity(EntityId(90)), Some(grunt));
        assert_eq!(loaded.observers_of(leader)[0].id(), grunt);
        assert!(loaded.is_pooled(grunt));
        assert!(loaded.slab().block_of(grunt).is_some());
        assert!(loaded.container().is_reserved(grunt));

        let actor = loaded.get::<Actor>(grunt).unwrap();
        assert_eq!(actor.health(), 75.0);
        assert!(actor.attention_target().is_valid(loaded.container()));
        assert_eq!(loaded.get::<Leader>(leader).unwrap().formation().len(), 3);

        // Everything is owned: removing the leader takes the formation too.
        loaded.remove_object(leader).unwrap();
        assert_eq!(loaded.release_deregistered_objects().unwrap(), 4);
        assert!(loaded.observers_of(leader).is_empty());
    }

    #[test]
    fn load_into_populated_manager_is_refused() {
        let mut mgr = manager();
        mgr.create_object(CreateParams::new(ObjectKind::Generic), &())
            .unwrap();
        let mut stream = save(&mut mgr);
        let mut ser = Serializer::new(&mut stream);
        assert!(matches!(
            mgr.serialize(&mut ser),
            Err(ManagerError::Container(ContainerError::NotEmpty { live: 1 }))
        ));
        assert_eq!(mgr.len(), 1);
    }
}
