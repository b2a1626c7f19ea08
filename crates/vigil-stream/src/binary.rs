//! Binary file backends.
//!
//! [`BinaryWriter`] streams records to any `Write` sink and writes the
//! header on construction. [`BinaryReader`] validates the header on open
//! and verifies group names and record types as they are consumed.

use std::io::{Read, Write};

use crate::backend::{StreamBackend, StreamMode};
use crate::codec::{
    decode_header, decode_primitive, encode_header, encode_primitive, read_length_prefixed_str,
    read_u8, write_length_prefixed_str, write_u8, TAG_GROUP_BEGIN, TAG_GROUP_END,
};
use crate::error::StreamError;
use crate::value::Primitive;

/// Writes a binary save stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`.
///
/// # Examples
///
/// ```
/// use vigil_stream::{BinaryReader, BinaryWriter, Serializer};
///
/// let mut writer = BinaryWriter::new(Vec::new()).unwrap();
/// let mut ser = Serializer::new(&mut writer);
/// ser.begin_group("Actor").unwrap();
/// let mut health = 75u32;
/// ser.value("health", &mut health).unwrap();
/// ser.end_group().unwrap();
/// ser.finish().unwrap();
/// let bytes = writer.into_inner();
///
/// let mut reader = BinaryReader::open(bytes.as_slice()).unwrap();
/// let mut ser = Serializer::new(&mut reader);
/// ser.begin_group("Actor").unwrap();
/// let mut loaded = 0u32;
/// ser.value("health", &mut loaded).unwrap();
/// ser.end_group().unwrap();
/// assert_eq!(loaded, 75);
/// ```
pub struct BinaryWriter<W: Write> {
    writer: W,
    records_written: u64,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a writer, immediately writing the header.
    pub fn new(mut writer: W) -> Result<Self, StreamError> {
        encode_header(&mut writer)?;
        Ok(Self {
            writer,
            records_written: 0,
        })
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), StreamError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StreamBackend for BinaryWriter<W> {
    fn mode(&self) -> StreamMode {
        StreamMode::Write
    }

    fn begin_group(&mut self, name: &str) -> Result<(), StreamError> {
        write_u8(&mut self.writer, TAG_GROUP_BEGIN)?;
        write_length_prefixed_str(&mut self.writer, name)?;
        self.records_written += 1;
        Ok(())
    }

    fn end_group(&mut self, _name: &str) -> Result<(), StreamError> {
        write_u8(&mut self.writer, TAG_GROUP_END)?;
        self.records_written += 1;
        Ok(())
    }

    fn write_value(&mut self, _name: &str, value: &Primitive) -> Result<(), StreamError> {
        encode_primitive(&mut self.writer, value)?;
        self.records_written += 1;
        Ok(())
    }

    fn read_value(&mut self, _name: &str) -> Result<Primitive, StreamError> {
        Err(StreamError::WrongMode {
            expected: StreamMode::Read,
        })
    }
}

/// Reads a binary save stream.
///
/// Generic over `R: Read` so tests can use `&[u8]` and production code
/// can use `BufReader<File>`.
pub struct BinaryReader<R: Read> {
    reader: R,
    records_read: u64,
}

impl<R: Read> BinaryReader<R> {
    /// Open a stream, reading and validating the header.
    pub fn open(mut reader: R) -> Result<Self, StreamError> {
        decode_header(&mut reader)?;
        Ok(Self {
            reader,
            records_read: 0,
        })
    }

    /// Number of records consumed so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    fn next_tag(&mut self) -> Result<u8, StreamError> {
        let tag = read_u8(&mut self.reader).map_err(|e| match e {
            StreamError::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                StreamError::UnexpectedEnd
            }
            other => other,
        })?;
        self.records_read += 1;
        Ok(tag)
    }
}

impl<R: Read> StreamBackend for BinaryReader<R> {
    fn mode(&self) -> StreamMode {
        StreamMode::Read
    }

    fn begin_group(&mut self, name: &str) -> Result<(), StreamError> {
        let tag = self.next_tag()?;
        if tag != TAG_GROUP_BEGIN {
            return Err(StreamError::GroupMismatch {
                expected: name.to_string(),
                found: format!("record tag {tag:#04x}"),
            });
        }
        let found = read_length_prefixed_str(&mut self.reader)?;
        if found != name {
            return Err(StreamError::GroupMismatch {
                expected: name.to_string(),
                found,
            });
        }
        Ok(())
    }

    fn end_group(&mut self, name: &str) -> Result<(), StreamError> {
        let tag = self.next_tag()?;
        if tag != TAG_GROUP_END {
            return Err(StreamError::GroupMismatch {
                expected: format!("end of '{name}'"),
                found: format!("record tag {tag:#04x}"),
            });
        }
        Ok(())
    }

    fn write_value(&mut self, _name: &str, _value: &Primitive) -> Result<(), StreamError> {
        Err(StreamError::WrongMode {
            expected: StreamMode::Write,
        })
    }

    fn read_value(&mut self, _name: &str) -> Result<Primitive, StreamError> {
        let tag = self.next_tag()?;
        decode_primitive(&mut self.reader, tag)
    }
}
