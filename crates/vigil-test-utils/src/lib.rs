//! Test fixtures and mock collaborators for Vigil development.
//!
//! Provides a [`MockPool`] standing in for the entity pool system, a
//! [`RecordingListener`] that logs removal notifications, a minimal
//! [`FixtureObject`] for exercising the container directly, and
//! [`init_tracing`] for readable log output in tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Once;

use tracing_subscriber::EnvFilter;
use vigil_core::{EntityId, ObjectId, ObjectKind};
use vigil_manager::{ManagerConfig, ManagerError, ObjectManager, PoolManager};
use vigil_registry::{AiObject, DeregisterQueue, LiveIds, ObjectCore, RemovalListener, WeakRef};
use vigil_stream::{MemoryStream, Serializer, StreamError};

/// Install a test-friendly `tracing` subscriber once per process.
///
/// The filter comes from `RUST_LOG`, defaulting to `warn`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// A manager with `capacity` ids and `slab_blocks` pool slab blocks.
pub fn manager(capacity: u32, slab_blocks: u32) -> ObjectManager {
    init_tracing();
    let mut config = ManagerConfig::new(capacity);
    config.pool_slab_blocks = slab_blocks;
    ObjectManager::new(&config).expect("test manager config is valid")
}

// ── Pool ────────────────────────────────────────────────────────

/// Stand-in for the entity pool system.
///
/// Entities become pool-backed when [`prepare`](MockPool::prepare)d, which
/// reserves their object id with the manager the way the real pool does.
#[derive(Debug, Default)]
pub struct MockPool {
    reserved: HashMap<EntityId, ObjectId>,
    bookmarks: HashMap<EntityId, MemoryStream>,
}

impl MockPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare `entity`, reserving an object id for it.
    pub fn prepare(
        &mut self,
        manager: &mut ObjectManager,
        entity: EntityId,
    ) -> Result<ObjectId, ManagerError> {
        let id = manager.reserve_id_for_pooled_entity(entity)?;
        self.reserved.insert(entity, id);
        Ok(id)
    }

    /// Park `entity`: write its bookmark, then tell the manager.
    pub fn park(
        &mut self,
        manager: &mut ObjectManager,
        entity: EntityId,
    ) -> Result<Option<ObjectId>, ManagerError> {
        let mut stream = MemoryStream::new();
        let mut ser = Serializer::new(&mut stream);
        manager.serialize_bookmark(entity, &mut ser)?;
        ser.finish()?;
        stream.rewind();
        self.bookmarks.insert(entity, stream);
        manager.on_entity_returned_to_pool(entity)
    }

    /// Reactivate `entity` from its bookmark.
    pub fn reactivate(
        &mut self,
        manager: &mut ObjectManager,
        entity: EntityId,
    ) -> Result<Option<ObjectId>, ManagerError> {
        let Some(mut stream) = self.bookmarks.remove(&entity) else {
            return Ok(None);
        };
        let mut ser = Serializer::new(&mut stream);
        let id = manager.serialize_bookmark(entity, &mut ser)?;
        ser.finish()?;
        Ok(id)
    }

    pub fn has_bookmark(&self, entity: EntityId) -> bool {
        self.bookmarks.contains_key(&entity)
    }
}

impl PoolManager for MockPool {
    fn is_pool_backed(&self, entity: EntityId) -> bool {
        self.reserved.contains_key(&entity)
    }

    fn reserved_object_id(&self, entity: EntityId) -> Option<ObjectId> {
        self.reserved.get(&entity).copied()
    }
}

// ── Listeners ───────────────────────────────────────────────────

/// Shared log of removal notifications, in order.
pub type RemovalLog = Rc<RefCell<Vec<(ObjectId, ObjectKind)>>>;

/// Records every removal it is told about.
///
/// Optionally deregisters a follow-up object when a given one is removed,
/// to drive reentrant flushes.
#[derive(Default)]
pub struct RecordingListener {
    log: RemovalLog,
    chain: Vec<(ObjectId, WeakRef)>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to the log that outlives the boxed listener.
    pub fn log(&self) -> RemovalLog {
        self.log.clone()
    }

    /// When `trigger` is removed, deregister `follow`.
    pub fn chain(mut self, trigger: ObjectId, follow: WeakRef) -> Self {
        self.chain.push((trigger, follow));
        self
    }
}

impl RemovalListener for RecordingListener {
    fn on_object_removed(&mut self, id: ObjectId, object: &dyn AiObject, queue: &DeregisterQueue) {
        self.log.borrow_mut().push((id, object.kind()));
        for (_, follow) in self.chain.iter().filter(|(trigger, _)| *trigger == id) {
            queue.enqueue_ref(*follow);
        }
    }
}

// ── Objects ─────────────────────────────────────────────────────

/// A minimal object with a counter and one outgoing reference.
#[derive(Debug)]
pub struct FixtureObject {
    pub core: ObjectCore,
    pub counter: u32,
    pub target: WeakRef,
}

impl FixtureObject {
    pub fn new(name: &str) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Generic, name),
            counter: 0,
            target: WeakRef::nil(),
        }
    }

    pub fn targeting(name: &str, target: WeakRef) -> Self {
        Self {
            target,
            ..Self::new(name)
        }
    }
}

impl AiObject for FixtureObject {
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
        ser.value("counter", &mut self.counter)?;
        ser.value("target", &mut self.target)
    }

    fn post_serialize(&mut self, live: &LiveIds) {
        self.target.rebind(live);
    }
}

vigil_registry::impl_object_type!(FixtureObject);
