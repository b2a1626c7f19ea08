//! In-memory stream backend.
//!
//! Used for undo snapshots and pool bookmarks, where the data never leaves
//! the process. Unlike the binary backend it keeps value names, so a read
//! that drifts out of step with the write is caught at the first mismatched
//! name rather than at the first mismatched type.

use crate::backend::{StreamBackend, StreamMode};
use crate::error::StreamError;
use crate::value::Primitive;

#[derive(Clone, Debug, PartialEq)]
enum Record {
    Begin(String),
    End(String),
    Value(String, Primitive),
}

/// A recorded sequence of groups and values.
///
/// Starts in write mode. [`rewind`](MemoryStream::rewind) switches to read
/// mode and replays from the first record; it can be called again to read
/// the same data more than once.
#[derive(Clone, Debug, Default)]
pub struct MemoryStream {
    records: Vec<Record>,
    cursor: usize,
    reading: bool,
}

impl MemoryStream {
    /// Create an empty stream in write mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to read mode, positioned at the first record.
    pub fn rewind(&mut self) {
        self.reading = true;
        self.cursor = 0;
    }

    /// Discard all records and return to write mode.
    pub fn clear(&mut self) {
        self.records.clear();
        self.cursor = 0;
        self.reading = false;
    }

    /// Number of recorded entries (group markers and values).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether every record has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.records.len()
    }

    fn push(&mut self, record: Record) -> Result<(), StreamError> {
        if self.reading {
            return Err(StreamError::WrongMode {
                expected: StreamMode::Write,
            });
        }
        self.records.push(record);
        Ok(())
    }

    fn next(&mut self) -> Result<&Record, StreamError> {
        if !self.reading {
            return Err(StreamError::WrongMode {
                expected: StreamMode::Read,
            });
        }
        let record = self
            .records
            .get(self.cursor)
            .ok_or(StreamError::UnexpectedEnd)?;
        self.cursor += 1;
        Ok(record)
    }
}

fn describe(record: &Record) -> String {
    match record {
        Record::Begin(name) => format!("begin '{name}'"),
        Record::End(name) => format!("end '{name}'"),
        Record::Value(name, _) => format!("value '{name}'"),
    }
}

impl StreamBackend for MemoryStream {
    fn mode(&self) -> StreamMode {
        if self.reading {
            StreamMode::Read
        } else {
            StreamMode::Write
        }
    }

    fn begin_group(&mut self, name: &str) -> Result<(), StreamError> {
        if !self.reading {
            return self.push(Record::Begin(name.to_string()));
        }
        match self.next()? {
            Record::Begin(found) if found == name => Ok(()),
            other => Err(StreamError::GroupMismatch {
                expected: name.to_string(),
                found: describe(other),
            }),
        }
    }

    fn end_group(&mut self, name: &str) -> Result<(), StreamError> {
        if !self.reading {
            return self.push(Record::End(name.to_string()));
        }
        match self.next()? {
            Record::End(found) if found == name => Ok(()),
            other => Err(StreamError::GroupMismatch {
                expected: format!("end '{name}'"),
                found: describe(other),
            }),
        }
    }

    fn write_value(&mut self, name: &str, value: &Primitive) -> Result<(), StreamError> {
        self.push(Record::Value(name.to_string(), value.clone()))
    }

    fn read_value(&mut self, name: &str) -> Result<Primitive, StreamError> {
        match self.next()? {
            Record::Value(found, value) if found == name => Ok(value.clone()),
            Record::Value(found, _) => Err(StreamError::NameMismatch {
                expected: name.to_string(),
                found: found.clone(),
            }),
            other => Err(StreamError::NameMismatch {
                expected: name.to_string(),
                found: describe(other),
            }),
        }
    }
}
