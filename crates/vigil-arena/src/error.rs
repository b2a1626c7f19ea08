//! Arena-specific error types.

use thiserror::Error;
use vigil_core::ObjectId;

/// Errors that can occur during arena operations.
///
/// Every variant is a protocol violation or a configuration error. The
/// failing operation leaves the arena unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// Every slot up to the configured ceiling is in use.
    #[error("arena capacity exceeded: all {capacity} slots are occupied or reserved")]
    CapacityExceeded {
        /// The configured capacity.
        capacity: u32,
    },
    /// The id is the invalid sentinel or lies beyond the configured capacity.
    #[error("object id {id} is outside the arena (capacity {capacity})")]
    OutOfRange {
        /// The offending id.
        id: ObjectId,
        /// The configured capacity.
        capacity: u32,
    },
    /// An explicit insert targeted a slot that already holds an object.
    #[error("object id {id} is already occupied")]
    IdCollision {
        /// The occupied id.
        id: ObjectId,
    },
    /// Tried to unreserve an id whose slot holds a live object.
    #[error("cannot unreserve object id {id}: slot holds a live object")]
    UnreserveLive {
        /// The occupied id.
        id: ObjectId,
    },
    /// The arena configuration is invalid.
    #[error("invalid arena config: {reason}")]
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_id() {
        let err = ArenaError::IdCollision { id: ObjectId(9) };
        assert_eq!(err.to_string(), "object id 9 is already occupied");
        let err = ArenaError::CapacityExceeded { capacity: 4 };
        assert!(err.to_string().contains("4 slots"));
    }
}
