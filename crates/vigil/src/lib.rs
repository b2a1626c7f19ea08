//! Vigil: lifetime management for game AI objects.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Vigil sub-crates. For most users, adding `vigil` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use vigil::prelude::*;
//!
//! let mut mgr = ObjectManager::new(&ManagerConfig::new(64)).unwrap();
//!
//! let leader = mgr
//!     .create_object(
//!         CreateParams::new(ObjectKind::Leader).named("sarge").in_group(GroupId(1)),
//!         &(),
//!     )
//!     .unwrap();
//! let grunt = mgr
//!     .create_object(
//!         CreateParams::new(ObjectKind::Actor).named("grunt").in_group(GroupId(1)),
//!         &(),
//!     )
//!     .unwrap();
//! mgr.track_target(grunt.id(), Some(leader.id())).unwrap();
//! assert_eq!(mgr.group_leader(GroupId(1)), Some(leader.id()));
//!
//! // Removal is deferred: the object resolves until the next flush.
//! mgr.remove_object(leader.id()).unwrap();
//! assert!(leader.is_valid(mgr.container()));
//! assert_eq!(mgr.release_deregistered_objects().unwrap(), 1);
//! assert!(!leader.is_valid(mgr.container()));
//! assert!(mgr.observers_of(leader.id()).is_empty());
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `vigil-core` | Object, entity, group and faction ids; object kinds |
//! | [`arena`] | `vigil-arena` | Generational slot arena with id reservation |
//! | [`stream`] | `vigil-stream` | Named-group serializer and its memory and file backends |
//! | [`registry`] | `vigil-registry` | Object container, references, deferred deletion, indices |
//! | [`manager`] | `vigil-manager` | Typed creation, pooling, bookmarks and save/load |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Ids and object kinds (`vigil-core`).
pub use vigil_core as types;

/// Generational slot storage (`vigil-arena`).
///
/// [`arena::SlotArena`] hands out dense ids, bumps a slot's generation on
/// every erase, and supports reserving ids ahead of use.
pub use vigil_arena as arena;

/// Serialization streams (`vigil-stream`).
///
/// One [`stream::Serializer`] drives both directions over a
/// [`stream::StreamBackend`]: [`stream::MemoryStream`] for bookmarks,
/// [`stream::BinaryWriter`] and [`stream::BinaryReader`] for save files.
pub use vigil_stream as stream;

/// The object container (`vigil-registry`).
///
/// [`registry::ObjectContainer`] owns every registered object. Objects are
/// reached through [`registry::WeakRef`], owned through exactly one
/// [`registry::StrongRef`], and indexed through [`registry::CountedRef`].
pub use vigil_registry as registry;

/// The object manager (`vigil-manager`).
///
/// [`manager::ObjectManager`] builds the built-in object types, keeps the
/// group, faction and attention indices, and integrates with the entity
/// pool through [`manager::PoolManager`].
pub use vigil_manager as manager;

/// Common imports for typical Vigil usage.
///
/// ```rust
/// use vigil::prelude::*;
/// ```
pub mod prelude {
    // Ids and kinds
    pub use vigil_core::{EntityId, FactionId, GroupId, ObjectId, ObjectKind};

    // Container and references
    pub use vigil_registry::{
        AiObject, CountedRef, ObjectContainer, ObjectCore, ObjectType, RemovalListener,
        StrongRef, WeakRef,
    };

    // Streams
    pub use vigil_stream::{MemoryStream, Serializer, StreamError};

    // Errors
    pub use vigil_registry::ContainerError;

    // Manager
    pub use vigil_manager::{
        Actor, CreateParams, DummyObject, Leader, ManagerConfig, ManagerError, ObjectManager,
        PoolManager,
    };
}
