//! Callbacks the container makes into the layer above it.

use vigil_core::{ObjectId, ObjectKind};

use crate::object::AiObject;
use crate::queue::DeregisterQueue;
use crate::refs::StrongRef;

/// Notified once for every object the flush destroys, before it is
/// destroyed.
///
/// The object is still intact. Listeners must drop every [`CountedRef`]
/// they hold to it and may deregister further objects through `queue`;
/// those are destroyed later in the same flush.
///
/// [`CountedRef`]: crate::CountedRef
pub trait RemovalListener {
    /// `object` (registered as `id`) is about to be destroyed.
    fn on_object_removed(&mut self, id: ObjectId, object: &dyn AiObject, queue: &DeregisterQueue);
}

/// A listener that does nothing.
impl RemovalListener for () {
    fn on_object_removed(&mut self, _id: ObjectId, _object: &dyn AiObject, _queue: &DeregisterQueue) {}
}

/// Builds objects while loading and takes ownership of them afterwards.
pub trait ObjectFactory {
    /// A blank, unregistered object of `kind`, ready to have its state read.
    fn create(&mut self, kind: ObjectKind) -> Box<dyn AiObject>;

    /// Take the owning reference of an object that was just loaded.
    fn adopt(&mut self, owner: StrongRef);
}
