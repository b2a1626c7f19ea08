//! Test objects and listeners shared by this crate's unit tests.

use std::any::Any;

use vigil_core::{ObjectId, ObjectKind};
use vigil_stream::{Serializer, StreamError};

use crate::listener::{ObjectFactory, RemovalListener};
use crate::object::{AiObject, LiveIds, ObjectCore};
use crate::queue::DeregisterQueue;
use crate::refs::{StrongRef, WeakRef};
use crate::ObjectContainer;
use crate::ContainerConfig;

/// An object that can own children and point at a target.
pub(crate) struct Fixture {
    pub core: ObjectCore,
    pub value: u32,
    pub target: WeakRef,
    pub children: Vec<StrongRef>,
    pub registered_calls: u32,
}

impl Fixture {
    pub fn new(kind: ObjectKind, name: &str) -> Self {
        Self {
            core: ObjectCore::new(kind, name),
            value: 0,
            target: WeakRef::nil(),
            children: Vec::new(),
            registered_calls: 0,
        }
    }

    pub fn generic(name: &str) -> Self {
        Self::new(ObjectKind::Generic, name)
    }
}

impl AiObject for Fixture {
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
        ser.value("value", &mut self.value)?;
        ser.value("target", &mut self.target)
    }

    fn post_serialize(&mut self, live: &LiveIds) {
        self.target.rebind(live);
    }

    fn on_registered(&mut self) {
        self.registered_calls += 1;
    }
}

/// A second concrete type, for downcast tests.
pub(crate) struct Marker {
    pub core: ObjectCore,
}

impl Marker {
    pub fn new() -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Dummy, "marker"),
        }
    }
}

impl AiObject for Marker {
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

    fn should_serialize(&self) -> bool {
        false
    }
}

crate::impl_object_type!(Fixture, Marker);

/// Records removals and optionally deregisters a follow-up per removal.
#[derive(Default)]
pub(crate) struct Recorder {
    pub removed: Vec<ObjectId>,
    pub chain: Vec<(ObjectId, ObjectId, u32)>,
}

impl RemovalListener for Recorder {
    fn on_object_removed(&mut self, id: ObjectId, _object: &dyn AiObject, queue: &DeregisterQueue) {
        self.removed.push(id);
        if let Some(&(_, next, generation)) = self.chain.iter().find(|(from, _, _)| *from == id) {
            queue.enqueue(next, generation);
        }
    }
}

/// Builds fixtures and keeps their owners.
#[derive(Default)]
pub(crate) struct FixtureFactory {
    pub owners: Vec<StrongRef>,
}

impl ObjectFactory for FixtureFactory {
    fn create(&mut self, kind: ObjectKind) -> Box<dyn AiObject> {
        Box::new(Fixture::new(kind, ""))
    }

    fn adopt(&mut self, owner: StrongRef) {
        self.owners.push(owner);
    }
}

pub(crate) fn container(capacity: u32) -> ObjectContainer {
    ObjectContainer::new(&ContainerConfig::new(capacity)).unwrap()
}
