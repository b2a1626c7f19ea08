//! Object construction while loading.

use indexmap::IndexMap;
use vigil_core::{ObjectId, ObjectKind};
use vigil_registry::{AiObject, ObjectFactory, StrongRef};

use crate::objects;

/// Builds built-in kinds for the container and hands their owning
/// references to the manager.
pub(crate) struct ManagerFactory<'a> {
    pub owners: &'a mut IndexMap<ObjectId, StrongRef>,
}

impl ObjectFactory for ManagerFactory<'_> {
    fn create(&mut self, kind: ObjectKind) -> Box<dyn AiObject> {
        objects::construct(kind, "")
    }

    fn adopt(&mut self, owner: StrongRef) {
        if let Some(mut stale) = self.owners.insert(owner.id(), owner) {
            tracing::error!(id = %stale.id(), "loaded object replaced an existing owner");
            stale.disown();
        }
    }
}
