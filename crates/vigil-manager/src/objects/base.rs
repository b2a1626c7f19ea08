use std::any::Any;

use vigil_core::ObjectKind;
use vigil_registry::{AiObject, ObjectCore};

/// A plain object with no behaviour of its own.
///
/// Also the fallback for kind tags this build does not recognise.
#[derive(Debug)]
pub struct BaseObject {
    core: ObjectCore,
}

impl BaseObject {
    /// An unregistered generic object.
    pub fn new(name: &str) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Generic, name),
        }
    }
}

impl AiObject for BaseObject {
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

    fn on_registered(&mut self) {
        super::name_if_unnamed(&mut self.core);
    }
}
