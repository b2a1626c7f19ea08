//! Container error types.

use thiserror::Error;
use vigil_arena::ArenaError;
use vigil_core::ObjectId;
use vigil_stream::StreamError;

/// Errors from container operations.
///
/// Apart from [`Stream`](ContainerError::Stream) and
/// [`Corrupt`](ContainerError::Corrupt), every variant means a caller
/// broke the single-owner / single-registration contract. They are not
/// locally recoverable; the failing operation leaves the container
/// unchanged so the caller can report and stop.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Slot arena refused the operation.
    #[error(transparent)]
    Arena(#[from] ArenaError),
    /// Reading or writing the stream failed.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),
    /// The object already carries a self-reference from an earlier registration.
    #[error("object is already registered as {id}")]
    AlreadyRegistered {
        /// The id the object claims.
        id: ObjectId,
    },
    /// The id does not name a live object (or the handle is stale).
    #[error("object {id} is not registered")]
    NotRegistered {
        /// The offending id.
        id: ObjectId,
    },
    /// Deregistration was requested through a nil reference.
    #[error("cannot deregister through a nil reference")]
    NilReference,
    /// The owning reference was minted by another container, or by this
    /// one before a reset.
    #[error("owner of object {id} belongs to another container")]
    ForeignOwner {
        /// The id the owner names.
        id: ObjectId,
    },
    /// The object is already waiting for the next flush.
    #[error("object {id} is already deregistered")]
    AlreadyDeregistered {
        /// The offending id.
        id: ObjectId,
    },
    /// Reentrant deregistration did not settle within the pass ceiling.
    #[error("deferred deletion did not settle after {passes} passes ({pending} still pending)")]
    FlushRunaway {
        /// Passes performed.
        passes: u32,
        /// Ids still pending when the flush gave up.
        pending: usize,
    },
    /// Id metadata can only be loaded into a container with no live objects.
    #[error("cannot load object ids into a container holding {live} live objects")]
    NotEmpty {
        /// Live objects present.
        live: usize,
    },
    /// A persisted object header disagrees with its payload.
    #[error("object id mismatch: header says {expected}, payload says {found}")]
    IdMismatch {
        /// Id from the record header.
        expected: ObjectId,
        /// Id from the payload.
        found: ObjectId,
    },
    /// Persisted data is structurally wrong.
    #[error("corrupt object data: {detail}")]
    Corrupt {
        /// Human-readable description.
        detail: String,
    },
    /// The container configuration is invalid.
    #[error("invalid container config: {reason}")]
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },
}

/// Registered/deregistered counters disagree with arena occupancy.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error(
    "object leak: {registered} registered - {deregistered} deregistered \
     = {expected} expected, arena holds {actual}\n{dump}"
)]
pub struct LeakReport {
    /// Total registrations since the last reset.
    pub registered: u64,
    /// Total destructions since the last reset.
    pub deregistered: u64,
    /// `registered - deregistered`.
    pub expected: u64,
    /// Occupied slots actually present.
    pub actual: u64,
    /// Full slot listing at the time of the check.
    pub dump: String,
}
