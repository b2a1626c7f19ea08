//! Manager error types.

use thiserror::Error;
use vigil_core::{EntityId, ObjectId};
use vigil_registry::ContainerError;
use vigil_stream::StreamError;

/// Errors from [`ObjectManager`](crate::ObjectManager) operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The object container refused the operation.
    #[error(transparent)]
    Container(#[from] ContainerError),
    /// Reading or writing the stream failed.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
    /// Every pool slab block is in use.
    #[error("pool slab exhausted ({capacity} blocks)")]
    SlabExhausted {
        /// Block count of the slab.
        capacity: u32,
    },
    /// The pool slab can only be resized while no block is in use.
    #[error("cannot resize pool slab with {live} blocks in use")]
    SlabInUse {
        /// Blocks currently in use.
        live: usize,
    },
    /// A pool-backed entity has no id reserved for it.
    #[error("pool-backed entity {entity} has no reserved object id")]
    NoPoolReservation {
        /// The entity being created.
        entity: EntityId,
    },
    /// The entity already has an AI object.
    #[error("entity {entity} is already bound to object {id}")]
    EntityAlreadyBound {
        /// The entity.
        entity: EntityId,
        /// Its current object.
        id: ObjectId,
    },
    /// No live object has this id.
    #[error("no live object {id}")]
    UnknownObject {
        /// The offending id.
        id: ObjectId,
    },
    /// The object exists but is not of the kind the operation needs.
    #[error("object {id} is not {expected}")]
    WrongKind {
        /// The offending id.
        id: ObjectId,
        /// What the operation required.
        expected: &'static str,
    },
    /// A bookmark's header and payload name different objects.
    #[error("bookmark for object {expected} carries payload for {found}")]
    BookmarkMismatch {
        /// Id from the bookmark header.
        expected: ObjectId,
        /// Id found in the payload.
        found: ObjectId,
    },
    /// The manager configuration is invalid.
    #[error("invalid manager config: {reason}")]
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },
}
