//! The symmetric serialization façade.

use crate::backend::{StreamBackend, StreamMode};
use crate::error::StreamError;
use crate::value::{StreamEnum, StreamValue};

/// Symmetric read/write façade over a [`StreamBackend`].
///
/// Every call is direction-agnostic: when writing, `value` reads from the
/// reference and emits it; when reading, it overwrites the reference with
/// what the stream holds. Objects therefore implement one `serialize`
/// method for both save and load.
///
/// The serializer keeps its own stack of open groups, so `end_group`
/// needs no name and unbalanced nesting is reported by
/// [`finish`](Serializer::finish).
pub struct Serializer<'a> {
    backend: &'a mut dyn StreamBackend,
    groups: Vec<String>,
}

impl<'a> Serializer<'a> {
    /// Wrap a backend.
    pub fn new(backend: &'a mut dyn StreamBackend) -> Self {
        Self {
            backend,
            groups: Vec::new(),
        }
    }

    /// Direction of the underlying backend.
    pub fn mode(&self) -> StreamMode {
        self.backend.mode()
    }

    /// Whether values flow from the stream into the caller.
    pub fn is_reading(&self) -> bool {
        self.mode() == StreamMode::Read
    }

    /// Number of currently open groups.
    pub fn depth(&self) -> usize {
        self.groups.len()
    }

    /// Open a named group.
    pub fn begin_group(&mut self, name: &str) -> Result<(), StreamError> {
        self.backend.begin_group(name)?;
        self.groups.push(name.to_string());
        Ok(())
    }

    /// Close the innermost open group.
    pub fn end_group(&mut self) -> Result<(), StreamError> {
        let name = self
            .groups
            .pop()
            .ok_or(StreamError::UnbalancedGroups { open: 0 })?;
        self.backend.end_group(&name)
    }

    /// Write or read one value.
    pub fn value<V: StreamValue>(&mut self, name: &str, value: &mut V) -> Result<(), StreamError> {
        match self.mode() {
            StreamMode::Write => self.backend.write_value(name, &value.to_primitive()),
            StreamMode::Read => {
                let p = self.backend.read_value(name)?;
                let found = p.type_name();
                *value = V::from_primitive(p).ok_or_else(|| StreamError::TypeMismatch {
                    name: name.to_string(),
                    expected: V::EXPECTED,
                    found,
                })?;
                Ok(())
            }
        }
    }

    /// Write or read an enum as its `u16` tag.
    ///
    /// Unknown tags fail with [`StreamError::UnknownEnumTag`]. Callers that
    /// want a fallback read the raw tag with [`value`](Serializer::value).
    pub fn enum_value<E: StreamEnum>(&mut self, name: &str, value: &mut E) -> Result<(), StreamError> {
        let mut tag = value.to_tag();
        self.value(name, &mut tag)?;
        if self.is_reading() {
            *value = E::from_tag(tag).ok_or_else(|| StreamError::UnknownEnumTag {
                name: name.to_string(),
                tag,
            })?;
        }
        Ok(())
    }

    /// Open a group only if `present` (when writing) or if the stream
    /// says it was written (when reading).
    ///
    /// Returns whether the group was opened; the caller must then close
    /// it with [`end_group`](Serializer::end_group).
    pub fn optional_group(&mut self, name: &str, present: bool) -> Result<bool, StreamError> {
        let mut flag = present;
        self.value(name, &mut flag)?;
        if flag {
            self.begin_group(name)?;
        }
        Ok(flag)
    }

    /// Finish the session, failing if any group is still open.
    pub fn finish(self) -> Result<(), StreamError> {
        if !self.groups.is_empty() {
            return Err(StreamError::UnbalancedGroups {
                open: self.groups.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{BinaryReader, BinaryWriter};
    use crate::memory::MemoryStream;
    use vigil_core::{FactionId, ObjectId, ObjectKind};

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        id: ObjectId,
        name: String,
        faction: FactionId,
        kind: Option<ObjectKind>,
        position: [f32; 3],
    }

    impl Sample {
        fn serialize(&mut self, ser: &mut Serializer<'_>) -> Result<(), StreamError> {
            ser.begin_group("Sample")?;
            ser.value("id", &mut self.id)?;
            ser.value("name", &mut self.name)?;
            ser.value("faction", &mut self.faction)?;
            let mut kind = self.kind.unwrap_or(ObjectKind::Generic);
            ser.enum_value("kind", &mut kind)?;
            self.kind = Some(kind);
            ser.value("position", &mut self.position)?;
            ser.end_group()
        }
    }

    fn sample() -> Sample {
        Sample {
            id: ObjectId(12),
            name: "scout".into(),
            faction: FactionId(2),
            kind: Some(ObjectKind::Vehicle),
            position: [1.0, -2.5, 8.0],
        }
    }

    #[test]
    fn memory_stream_round_trip() {
        let mut original = sample();
        let mut stream = MemoryStream::new();
        let mut ser = Serializer::new(&mut stream);
        original.serialize(&mut ser).unwrap();
        ser.finish().unwrap();

        stream.rewind();
        let mut loaded = Sample::default();
        let mut ser = Serializer::new(&mut stream);
        assert!(ser.is_reading());
        loaded.serialize(&mut ser).unwrap();
        ser.finish().unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn binary_stream_round_trip() {
        let mut original = sample();
        let mut writer = BinaryWriter::new(Vec::new()).unwrap();
        let mut ser = Serializer::new(&mut writer);
        original.serialize(&mut ser).unwrap();
        ser.finish().unwrap();
        let bytes = writer.into_inner();

        let mut reader = BinaryReader::open(bytes.as_slice()).unwrap();
        let mut ser = Serializer::new(&mut reader);
        let mut loaded = Sample::default();
        loaded.serialize(&mut ser).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn type_mismatch_names_the_value() {
        let mut stream = MemoryStream::new();
        let mut ser = Serializer::new(&mut stream);
        let mut small = 3u16;
        ser.value("count", &mut small).unwrap();
        stream.rewind();
        let mut ser = Serializer::new(&mut stream);
        let mut wide = 0u32;
        match ser.value("count", &mut wide) {
            Err(StreamError::TypeMismatch {
                name,
                expected,
                found,
            }) => {
                assert_eq!(name, "count");
                assert_eq!(expected, "u32");
                assert_eq!(found, "u16");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn unknown_enum_tag_is_reported() {
        let mut stream = MemoryStream::new();
        let mut ser = Serializer::new(&mut stream);
        let mut tag = 700u16;
        ser.value("kind", &mut tag).unwrap();
        stream.rewind();
        let mut ser = Serializer::new(&mut stream);
        let mut kind = ObjectKind::Actor;
        assert!(matches!(
            ser.enum_value("kind", &mut kind),
            Err(StreamError::UnknownEnumTag { tag: 700, .. })
        ));
    }

    #[test]
    fn optional_group_round_trip() {
        let mut stream = MemoryStream::new();
        let mut ser = Serializer::new(&mut stream);
        assert!(!ser.optional_group("Absent", false).unwrap());
        assert!(ser.optional_group("Present", true).unwrap());
        let mut v = 5u8;
        ser.value("v", &mut v).unwrap();
        ser.end_group().unwrap();
        ser.finish().unwrap();

        stream.rewind();
        let mut ser = Serializer::new(&mut stream);
        assert!(!ser.optional_group("Absent", true).unwrap());
        assert!(ser.optional_group("Present", false).unwrap());
        let mut v = 0u8;
        ser.value("v", &mut v).unwrap();
        ser.end_group().unwrap();
        assert_eq!(v, 5);
    }

    #[test]
    fn unbalanced_groups_are_reported() {
        let mut stream = MemoryStream::new();
        let mut ser = Serializer::new(&mut stream);
        assert!(matches!(
            ser.end_group(),
            Err(StreamError::UnbalancedGroups { open: 0 })
        ));
        ser.begin_group("a").unwrap();
        assert_eq!(ser.depth(), 1);
        assert!(matches!(
            ser.finish(),
            Err(StreamError::UnbalancedGroups { open: 1 })
        ));
    }
}
