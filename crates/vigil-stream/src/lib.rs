//! Serialization stream for Vigil save data and pool bookmarks.
//!
//! Objects persist themselves through one symmetric façade,
//! [`Serializer`]: the same `value("health", &mut self.health)` call
//! writes when saving and reads when loading. The façade is agnostic to
//! where bytes go; it only requires that the backend preserve exact group
//! nesting and primitive round-trips.
//!
//! # Architecture
//!
//! - [`Serializer`] tracks the open group stack and converts typed values
//!   ([`StreamValue`], [`StreamEnum`]) to [`Primitive`]s
//! - [`BinaryWriter`] / [`BinaryReader`] back save files on any
//!   `Write` / `Read`
//! - [`MemoryStream`] backs in-memory snapshots (undo, pool bookmarks)
//!
//! # Binary format
//!
//! ```text
//! [MAGIC "VGIL"] [VERSION u8] [Record 1] [Record 2] ... [Record N]
//!
//! Record := 0x01 name:str          group begin
//!         | 0x02                   group end
//!         | 0x10..=0x18 payload    primitive value
//! ```
//!
//! All integers are little-endian; strings are `u32`-length-prefixed.
//! Value names are not stored in binary files (group names are).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod binary;
pub mod codec;
pub mod error;
pub mod memory;
pub mod serializer;
pub mod value;

pub use backend::{StreamBackend, StreamMode};
pub use binary::{BinaryReader, BinaryWriter};
pub use error::StreamError;
pub use memory::MemoryStream;
pub use serializer::Serializer;
pub use value::{Primitive, StreamEnum, StreamValue};

/// Magic bytes at the start of every binary save stream.
pub const MAGIC: [u8; 4] = *b"VGIL";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;
