//! Core types for the Vigil object-lifetime layer.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers shared by every other Vigil crate: object handles,
//! world-entity ids, faction and group ids, and the object kind tags
//! used for factory dispatch and persisted type headers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod id;
pub mod kind;

pub use id::{EntityId, FactionId, GroupId, ObjectId};
pub use kind::ObjectKind;
