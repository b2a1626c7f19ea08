//! Object container and reference disciplines for Vigil.
//!
//! [`ObjectContainer`] is the only way AI objects enter or leave the slot
//! arena. It mints exactly one [`StrongRef`] per registration, defers
//! destruction to a single flush point per frame, and owns the
//! reservation protocol that lets pooled and saved objects come back at
//! the id they had before.
//!
//! # Reference disciplines
//!
//! | Handle | Copy | Owns | Resolves |
//! |--------|------|------|----------|
//! | [`WeakRef`] | yes | no | re-validates id and generation on every access |
//! | [`StrongRef`] | no | yes | releasing (or dropping) it enqueues deferred deletion |
//! | [`CountedRef`] | yes | no | stored in [`ObjectIndex`]es; membership tracked by [`Memberships`] |
//!
//! # Frame lifecycle
//!
//! ```text
//! register ──▶ Occupied ──deregister──▶ pending (still resolvable)
//!                                          │
//!            release_deregistered_objects  ▼
//!   notify listeners ─▶ destroy ─▶ erase ─▶ Free | Reserved
//! ```
//!
//! Destroying an object may release further `StrongRef`s it owned, and
//! removal listeners may deregister more objects. Both land in the
//! pending queue and are drained by the same flush, up to a configured
//! number of passes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod container;
pub mod error;
pub mod index;
pub mod listener;
pub mod object;
mod persist;
pub mod queue;
pub mod refs;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ContainerConfig;
pub use container::ObjectContainer;
pub use error::{ContainerError, LeakReport};
pub use index::{Memberships, ObjectIndex};
pub use listener::{ObjectFactory, RemovalListener};
pub use object::{AiObject, LiveIds, ObjectCore, ObjectType};
pub use queue::DeregisterQueue;
pub use refs::{CountedRef, StrongRef, WeakRef};
pub use vigil_arena::SlotState;
