//! Error types for the serialization stream.

use std::io;

use thiserror::Error;

use crate::backend::StreamMode;

/// Errors that can occur while writing or reading a stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// An I/O error occurred in the underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The stream does not start with the expected `b"VGIL"` magic bytes.
    #[error("invalid magic bytes (expected b\"VGIL\")")]
    InvalidMagic,
    /// The format version is not supported by this build.
    #[error("unsupported format version {found}")]
    UnsupportedVersion {
        /// The version found in the stream.
        found: u8,
    },
    /// A value was read back as a different primitive type.
    #[error("value '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Name of the value being read.
        name: String,
        /// Primitive type the caller asked for.
        expected: &'static str,
        /// Primitive type present in the stream.
        found: &'static str,
    },
    /// A group was opened or closed out of order.
    #[error("group mismatch: expected '{expected}', found '{found}'")]
    GroupMismatch {
        /// Group the caller asked for.
        expected: String,
        /// Group marker present in the stream.
        found: String,
    },
    /// A named value was read in a different order than it was written.
    #[error("value name mismatch: expected '{expected}', found '{found}'")]
    NameMismatch {
        /// Name the caller asked for.
        expected: String,
        /// Name present in the stream.
        found: String,
    },
    /// `end_group` without a matching `begin_group`, or groups left open.
    #[error("unbalanced groups: {open} still open")]
    UnbalancedGroups {
        /// Number of groups open at the time of the error.
        open: usize,
    },
    /// The stream ran out of records.
    #[error("unexpected end of stream")]
    UnexpectedEnd,
    /// An enum tag is not known to this build.
    #[error("value '{name}': unknown enum tag {tag}")]
    UnknownEnumTag {
        /// Name of the value being read.
        name: String,
        /// The unrecognised tag.
        tag: u16,
    },
    /// The stream is structurally corrupt.
    #[error("malformed stream: {detail}")]
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A read was attempted on a writing stream or vice versa.
    #[error("operation requires a {expected:?} stream")]
    WrongMode {
        /// The mode the operation needs.
        expected: StreamMode,
    },
}
