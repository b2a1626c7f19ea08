//! The backend trait behind [`Serializer`](crate::Serializer).

use crate::error::StreamError;
use crate::value::Primitive;

/// Direction of a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamMode {
    /// Values flow from objects into the stream.
    Write,
    /// Values flow from the stream into objects.
    Read,
}

/// Storage behind a [`Serializer`](crate::Serializer).
///
/// Backends see group markers and primitives in call order. A reading
/// backend must hand back exactly what the writing backend was given,
/// failing with a [`StreamError`] as soon as the sequence diverges.
pub trait StreamBackend {
    /// Whether this backend writes or reads.
    fn mode(&self) -> StreamMode;

    /// Open a named group.
    fn begin_group(&mut self, name: &str) -> Result<(), StreamError>;

    /// Close the innermost group, which the caller names.
    fn end_group(&mut self, name: &str) -> Result<(), StreamError>;

    /// Append one value. Only valid in [`StreamMode::Write`].
    fn write_value(&mut self, name: &str, value: &Primitive) -> Result<(), StreamError>;

    /// Consume the next value. Only valid in [`StreamMode::Read`].
    fn read_value(&mut self, name: &str) -> Result<Primitive, StreamError>;
}
