//! Typed AI object creation, pooling and persistence for Vigil.
//!
//! [`ObjectManager`] sits on top of the
//! [`ObjectContainer`](vigil_registry::ObjectContainer). It builds the
//! built-in [`objects`] from [`CreateParams`], keeps the group, faction,
//! attention and entity indices, and scrubs all of them when the
//! container destroys an object.
//!
//! # Pooled entities
//!
//! The entity pool reserves an object id per entity it prepares
//! ([`ObjectManager::reserve_id_for_pooled_entity`]). Objects backing
//! those entities are created at the reserved id and take a block of the
//! [`PoolSlab`]. When the pool parks an entity, its object is written to
//! a bookmark and removed; the slot stays reserved, so reading the
//! bookmark later recreates the object at the same id.
//!
//! ```text
//! reserve_id_for_pooled_entity ──▶ Reserved
//! create_object / bookmark read ─▶ Occupied (slab block taken)
//! on_entity_returned_to_pool ────▶ pending ──flush──▶ Reserved (block freed)
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod bookmark;
pub mod config;
pub mod error;
mod factory;
mod fanout;
pub mod manager;
pub mod objects;
pub mod params;
mod persist;
pub mod pool;

pub use config::ManagerConfig;
pub use error::ManagerError;
pub use manager::ObjectManager;
pub use objects::{Actor, BaseObject, DummyObject, Leader};
pub use params::CreateParams;
pub use pool::{PoolManager, PoolSlab, SlabBlock};
