//! Primitive values and the traits that map typed fields onto them.

use vigil_core::{EntityId, FactionId, GroupId, ObjectId, ObjectKind};

/// A single value as it travels through a stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// Boolean flag.
    Bool(bool),
    /// Unsigned byte.
    U8(u8),
    /// Unsigned 16-bit integer.
    U16(u16),
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// Signed 32-bit integer.
    I32(i32),
    /// 32-bit float.
    F32(f32),
    /// Three-component vector.
    Vec3([f32; 3]),
    /// UTF-8 string.
    Str(String),
}

impl Primitive {
    /// Name of the primitive type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::I32(_) => "i32",
            Self::F32(_) => "f32",
            Self::Vec3(_) => "vec3",
            Self::Str(_) => "str",
        }
    }
}

/// A type that can pass through a stream as one [`Primitive`].
pub trait StreamValue: Sized {
    /// Primitive type name this value is stored as.
    const EXPECTED: &'static str;

    /// Convert to the stored primitive.
    fn to_primitive(&self) -> Primitive;

    /// Convert back, returning `None` on a primitive type mismatch.
    fn from_primitive(p: Primitive) -> Option<Self>;
}

/// An enum persisted as a stable `u16` tag.
pub trait StreamEnum: Sized + Copy {
    /// The persisted tag.
    fn to_tag(self) -> u16;

    /// Decode a tag, returning `None` if this build does not know it.
    fn from_tag(tag: u16) -> Option<Self>;
}

macro_rules! primitive_value {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl StreamValue for $ty {
            const EXPECTED: &'static str = $name;

            fn to_primitive(&self) -> Primitive {
                Primitive::$variant(self.clone())
            }

            fn from_primitive(p: Primitive) -> Option<Self> {
                match p {
                    Primitive::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

primitive_value!(bool, Bool, "bool");
primitive_value!(u8, U8, "u8");
primitive_value!(u16, U16, "u16");
primitive_value!(u32, U32, "u32");
primitive_value!(u64, U64, "u64");
primitive_value!(i32, I32, "i32");
primitive_value!(f32, F32, "f32");
primitive_value!([f32; 3], Vec3, "vec3");
primitive_value!(String, Str, "str");

macro_rules! newtype_value {
    ($ty:ident, $inner:ty) => {
        impl StreamValue for $ty {
            const EXPECTED: &'static str = <$inner as StreamValue>::EXPECTED;

            fn to_primitive(&self) -> Primitive {
                self.0.to_primitive()
            }

            fn from_primitive(p: Primitive) -> Option<Self> {
                <$inner>::from_primitive(p).map($ty)
            }
        }
    };
}

newtype_value!(ObjectId, u32);
newtype_value!(EntityId, u32);
newtype_value!(GroupId, u32);
newtype_value!(FactionId, u8);

impl StreamEnum for ObjectKind {
    fn to_tag(self) -> u16 {
        self.tag()
    }

    fn from_tag(tag: u16) -> Option<Self> {
        ObjectKind::from_tag(tag)
    }
}
