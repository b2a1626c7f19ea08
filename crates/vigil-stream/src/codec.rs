//! Binary encode/decode for the save format.
//!
//! All integers are little-endian. Strings are length-prefixed with a
//! `u32` length. The format is intentionally simple: no compression, no
//! alignment padding, no self-describing schema beyond one tag byte per
//! record.

use std::io::{Read, Write};

use crate::error::StreamError;
use crate::value::Primitive;

/// Record tag: group begin, followed by the group name.
pub const TAG_GROUP_BEGIN: u8 = 0x01;
/// Record tag: group end.
pub const TAG_GROUP_END: u8 = 0x02;
/// Record tag: `bool` stored as one byte.
pub const TAG_BOOL: u8 = 0x10;
/// Record tag: `u8`.
pub const TAG_U8: u8 = 0x11;
/// Record tag: `u16`.
pub const TAG_U16: u8 = 0x12;
/// Record tag: `u32`.
pub const TAG_U32: u8 = 0x13;
/// Record tag: `u64`.
pub const TAG_U64: u8 = 0x14;
/// Record tag: `i32`.
pub const TAG_I32: u8 = 0x15;
/// Record tag: `f32`.
pub const TAG_F32: u8 = 0x16;
/// Record tag: three `f32`s.
pub const TAG_VEC3: u8 = 0x17;
/// Record tag: length-prefixed string.
pub const TAG_STR: u8 = 0x18;

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), StreamError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u16.
pub fn write_u16_le(w: &mut dyn Write, v: u16) -> Result<(), StreamError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), StreamError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), StreamError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian i32.
pub fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), StreamError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian f32.
pub fn write_f32_le(w: &mut dyn Write, v: f32) -> Result<(), StreamError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_length_prefixed_str(w: &mut dyn Write, s: &str) -> Result<(), StreamError> {
    write_u32_le(w, s.len() as u32)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, StreamError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u16.
pub fn read_u16_le(r: &mut dyn Read) -> Result<u16, StreamError> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, StreamError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, StreamError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a little-endian i32.
pub fn read_i32_le(r: &mut dyn Read) -> Result<i32, StreamError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

/// Read a little-endian f32.
pub fn read_f32_le(r: &mut dyn Read) -> Result<f32, StreamError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Read a length-prefixed UTF-8 string.
pub fn read_length_prefixed_str(r: &mut dyn Read) -> Result<String, StreamError> {
    let len = read_u32_le(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| StreamError::Malformed {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

// ── Header ──────────────────────────────────────────────────────

/// Write the stream header (magic and format version).
pub fn encode_header(w: &mut dyn Write) -> Result<(), StreamError> {
    w.write_all(&crate::MAGIC)?;
    write_u8(w, crate::FORMAT_VERSION)
}

/// Read and validate the stream header.
pub fn decode_header(r: &mut dyn Read) -> Result<(), StreamError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != crate::MAGIC {
        return Err(StreamError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != crate::FORMAT_VERSION {
        return Err(StreamError::UnsupportedVersion { found: version });
    }
    Ok(())
}

// ── Primitive records ───────────────────────────────────────────

/// Encode one primitive as a tagged record.
pub fn encode_primitive(w: &mut dyn Write, value: &Primitive) -> Result<(), StreamError> {
    match value {
        Primitive::Bool(v) => {
            write_u8(w, TAG_BOOL)?;
            write_u8(w, u8::from(*v))
        }
        Primitive::U8(v) => {
            write_u8(w, TAG_U8)?;
            write_u8(w, *v)
        }
        Primitive::U16(v) => {
            write_u8(w, TAG_U16)?;
            write_u16_le(w, *v)
        }
        Primitive::U32(v) => {
            write_u8(w, TAG_U32)?;
            write_u32_le(w, *v)
        }
        Primitive::U64(v) => {
            write_u8(w, TAG_U64)?;
            write_u64_le(w, *v)
        }
        Primitive::I32(v) => {
            write_u8(w, TAG_I32)?;
            write_i32_le(w, *v)
        }
        Primitive::F32(v) => {
            write_u8(w, TAG_F32)?;
            write_f32_le(w, *v)
        }
        Primitive::Vec3(v) => {
            write_u8(w, TAG_VEC3)?;
            for c in v {
                write_f32_le(w, *c)?;
            }
            Ok(())
        }
        Primitive::Str(s) => {
            write_u8(w, TAG_STR)?;
            write_length_prefixed_str(w, s)
        }
    }
}

/// Decode the payload of a primitive record whose tag has been read.
pub fn decode_primitive(r: &mut dyn Read, tag: u8) -> Result<Primitive, StreamError> {
    let value = match tag {
        TAG_BOOL => match read_u8(r)? {
            0 => Primitive::Bool(false),
            1 => Primitive::Bool(true),
            other => {
                return Err(StreamError::Malformed {
                    detail: format!("invalid bool byte {other}"),
                })
            }
        },
        TAG_U8 => Primitive::U8(read_u8(r)?),
        TAG_U16 => Primitive::U16(read_u16_le(r)?),
        TAG_U32 => Primitive::U32(read_u32_le(r)?),
        TAG_U64 => Primitive::U64(read_u64_le(r)?),
        TAG_I32 => Primitive::I32(read_i32_le(r)?),
        TAG_F32 => Primitive::F32(read_f32_le(r)?),
        TAG_VEC3 => Primitive::Vec3([read_f32_le(r)?, read_f32_le(r)?, read_f32_le(r)?]),
        TAG_STR => Primitive::Str(read_length_prefixed_str(r)?),
        TAG_GROUP_BEGIN | TAG_GROUP_END => {
            return Err(StreamError::Malformed {
                detail: format!("expected a value record, found group marker {tag:#04x}"),
            })
        }
        other => {
            return Err(StreamError::Malformed {
                detail: format!("unknown record tag {other:#04x}"),
            })
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let mut buf = Vec::new();
        encode_header(&mut buf).unwrap();
        assert_eq!(&buf[..4], b"VGIL");
        decode_header(&mut buf.as_slice()).unwrap();
    }

    #[test]
    fn bad_magic_rejected() {
        let buf = b"NOPE\x01".to_vec();
        assert!(matches!(
            decode_header(&mut buf.as_slice()),
            Err(StreamError::InvalidMagic)
        ));
    }

    #[test]
    fn future_version_rejected() {
        let mut buf = b"VGIL".to_vec();
        buf.push(99);
        assert!(matches!(
            decode_header(&mut buf.as_slice()),
            Err(StreamError::UnsupportedVersion { found: 99 })
        ));
    }

    #[test]
    fn string_record_layout() {
        let mut buf = Vec::new();
        encode_primitive(&mut buf, &Primitive::Str("ab".into())).unwrap();
        assert_eq!(buf, vec![TAG_STR, 2, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn invalid_bool_byte_is_malformed() {
        let buf = [2u8];
        assert!(matches!(
            decode_primitive(&mut buf.as_slice(), TAG_BOOL),
            Err(StreamError::Malformed { .. })
        ));
    }

    #[test]
    fn truncated_payload_is_io_error() {
        let buf = [1u8, 2];
        assert!(matches!(
            decode_primitive(&mut buf.as_slice(), TAG_U32),
            Err(StreamError::Io(_))
        ));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn primitive() -> impl Strategy<Value = Primitive> {
            prop_oneof![
                any::<bool>().prop_map(Primitive::Bool),
                any::<u16>().prop_map(Primitive::U16),
                any::<u32>().prop_map(Primitive::U32),
                any::<i32>().prop_map(Primitive::I32),
                (-1.0e6f32..1.0e6).prop_map(Primitive::F32),
                "[a-z]{0,12}".prop_map(Primitive::Str),
            ]
        }

        proptest! {
            #[test]
            fn primitive_survives_encoding(value in primitive()) {
                let mut buf = Vec::new();
                encode_primitive(&mut buf, &value).unwrap();
                let mut r = buf.as_slice();
                let tag = read_u8(&mut r).unwrap();
                prop_assert_eq!(decode_primitive(&mut r, tag).unwrap(), value);
                prop_assert!(r.is_empty());
            }
        }
    }
}
