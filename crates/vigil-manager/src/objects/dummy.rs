use std::any::Any;

use vigil_core::ObjectKind;
use vigil_registry::{AiObject, ObjectCore, WeakRef};

/// A helper object with no behaviour: a formation point or an anchor.
///
/// Dummies owned by a leader are rebuilt by the leader after a load and
/// are not saved themselves; free-standing dummies are.
#[derive(Debug)]
pub struct DummyObject {
    core: ObjectCore,
    owner: WeakRef,
}

impl DummyObject {
    /// An unregistered, free-standing dummy.
    pub fn new(name: &str) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Dummy, name),
            owner: WeakRef::nil(),
        }
    }

    pub(crate) fn owned_by(name: &str, owner: WeakRef) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Dummy, name),
            owner,
        }
    }

    /// The object this dummy belongs to; nil when free-standing.
    pub fn owner(&self) -> WeakRef {
        self.owner
    }
}

impl AiObject for DummyObject {
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
        self.owner.is_nil()
    }

    fn on_registered(&mut self) {
        super::name_if_unnamed(&mut self.core);
    }
}
