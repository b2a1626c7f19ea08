//! Fixed-capacity slot arena for Vigil object handles.
//!
//! Maps an [`ObjectId`](vigil_core::ObjectId) to a stored value with
//! free-list reuse and occupancy validation. Every slot is in exactly one
//! of three states:
//!
//! ```text
//!            insert / insert_at
//!   Free ─────────────────────────▶ Occupied
//!    ▲  ╲ reserve / claim             │ erase
//!    │   ╲                            ▼
//!    │    ▶ Reserved ◀──── (id ∈ ReservedIDs)
//!    │         │   ╲
//!    └─────────┘    ╲ insert_at
//!     unreserve      ▶ Occupied
//! ```
//!
//! Reserved slots hold no value but are never handed out by the free
//! list. They let pooling and save/load recreate an object at exactly the
//! id it had before.
//!
//! Slots also carry a generation counter, bumped each time the slot
//! becomes occupied, so handles minted for an older occupant can be told
//! apart from the current one even though the numeric id is reused.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod slot;

pub use arena::SlotArena;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use slot::SlotState;
