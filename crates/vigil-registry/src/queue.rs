//! The pending-deletion queue shared by a container and its strong refs.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use vigil_core::ObjectId;

use crate::refs::WeakRef;

/// Ids waiting for the next flush, in deregistration order.
///
/// Every [`StrongRef`](crate::StrongRef) minted by a container holds a
/// handle to that container's queue, so releasing a reference never needs
/// a borrow of the container. Each entry records the generation that was
/// live when it was enqueued; the flush skips entries whose slot has
/// since been recycled.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Debug, Default)]
pub struct DeregisterQueue {
    pending: Rc<RefCell<IndexMap<ObjectId, u32>>>,
}

impl DeregisterQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `id` (at `generation`) for destruction.
    ///
    /// Returns `false` if the id was already pending. That is a double
    /// deregistration; it is logged and the original entry kept.
    pub fn enqueue(&self, id: ObjectId, generation: u32) -> bool {
        let mut pending = self.pending.borrow_mut();
        if pending.contains_key(&id) {
            tracing::error!(%id, generation, "object deregistered twice before a flush");
            return false;
        }
        pending.insert(id, generation);
        tracing::trace!(%id, generation, "queued for deferred deletion");
        true
    }

    /// Queue the object a weak reference points at.
    pub fn enqueue_ref<T: ?Sized>(&self, weak: WeakRef<T>) -> bool {
        if weak.is_nil() {
            return false;
        }
        self.enqueue(weak.id(), weak.generation())
    }

    /// Whether `id` is waiting for the next flush.
    pub fn is_pending(&self, id: ObjectId) -> bool {
        self.pending.borrow().contains_key(&id)
    }

    /// Number of pending ids.
    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Whether two handles share one queue.
    pub fn same_queue(&self, other: &DeregisterQueue) -> bool {
        Rc::ptr_eq(&self.pending, &other.pending)
    }

    /// Exchange the pending buffer with `working`.
    ///
    /// `working` must be empty; it becomes the new pending buffer so its
    /// allocation is reused.
    pub(crate) fn swap_into(&self, working: &mut IndexMap<ObjectId, u32>) {
        debug_assert!(working.is_empty());
        std::mem::swap(&mut *self.pending.borrow_mut(), working);
    }

    /// Put entries back at the front of the queue after an aborted flush.
    pub(crate) fn restore(&self, entries: impl IntoIterator<Item = (ObjectId, u32)>) {
        let mut pending = self.pending.borrow_mut();
        let later = std::mem::take(&mut *pending);
        pending.extend(entries);
        for (id, generation) in later {
            pending.entry(id).or_insert(generation);
        }
    }

    pub(crate) fn clear(&self) {
        self.pending.borrow_mut().clear();
    }
}
