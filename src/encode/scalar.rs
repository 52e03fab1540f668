//! Scalar to byte conversion
//!
//! Every primitive is laid out in native memory order first and reversed
//! when the requested order differs from the platform's.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Encoding emitted for an absent value: the 32-bit integer 0.
///
/// Callers that need to tell "absent" from "zero" must not rely on the
/// encoded bytes alone.
pub const NULL_SENTINEL: [u8; 4] = [0; 4];

/// Byte order used when serializing scalars and CRC registers
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Most significant byte first
    #[value(name = "big")]
    BigEndian,
    /// Least significant byte first
    #[value(name = "little")]
    LittleEndian,
}

impl ByteOrder {
    /// Order of the platform this crate was compiled for
    pub const NATIVE: ByteOrder = if cfg!(target_endian = "big") {
        ByteOrder::BigEndian
    } else {
        ByteOrder::LittleEndian
    };

    /// Whether bytes in native layout must be reversed for this order
    pub fn needs_swap(self) -> bool {
        self != Self::NATIVE
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::NATIVE
    }
}

/// Closed set of scalar kinds the encoder understands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// Boolean, one byte (0 or 1)
    Bool(bool),
    /// Unicode scalar value, four bytes
    Char(char),
    /// Signed 8-bit integer
    I8(i8),
    /// Unsigned 8-bit integer
    U8(u8),
    /// Signed 16-bit integer
    I16(i16),
    /// Unsigned 16-bit integer
    U16(u16),
    /// Signed 32-bit integer
    I32(i32),
    /// Unsigned 32-bit integer
    U32(u32),
    /// Signed 64-bit integer
    I64(i64),
    /// Unsigned 64-bit integer
    U64(u64),
    /// IEEE 754 single precision
    F32(f32),
    /// IEEE 754 double precision
    F64(f64),
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(value)
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool,
    char => Char,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

impl Scalar {
    /// Size of the encoded value in bytes
    pub fn size(&self) -> usize {
        match self {
            Self::Bool(_) | Self::I8(_) | Self::U8(_) => 1,
            Self::I16(_) | Self::U16(_) => 2,
            Self::Char(_) | Self::I32(_) | Self::U32(_) | Self::F32(_) => 4,
            Self::I64(_) | Self::U64(_) | Self::F64(_) => 8,
        }
    }

    /// Canonical in-memory layout on this platform
    fn native_bytes(&self) -> Vec<u8> {
        match *self {
            Self::Bool(v) => vec![u8::from(v)],
            Self::Char(v) => u32::from(v).to_ne_bytes().to_vec(),
            Self::I8(v) => v.to_ne_bytes().to_vec(),
            Self::U8(v) => vec![v],
            Self::I16(v) => v.to_ne_bytes().to_vec(),
            Self::U16(v) => v.to_ne_bytes().to_vec(),
            Self::I32(v) => v.to_ne_bytes().to_vec(),
            Self::U32(v) => v.to_ne_bytes().to_vec(),
            Self::I64(v) => v.to_ne_bytes().to_vec(),
            Self::U64(v) => v.to_ne_bytes().to_vec(),
            Self::F32(v) => v.to_ne_bytes().to_vec(),
            Self::F64(v) => v.to_ne_bytes().to_vec(),
        }
    }

    /// Encode this value in the requested byte order
    pub fn encode(&self, order: ByteOrder) -> Vec<u8> {
        let mut bytes = self.native_bytes();
        if order.needs_swap() {
            bytes.reverse();
        }
        bytes
    }
}

/// Encode a scalar in the given byte order
pub fn encode(value: impl Into<Scalar>, order: ByteOrder) -> Vec<u8> {
    value.into().encode(order)
}

/// Encode an optional scalar; `None` becomes [`NULL_SENTINEL`]
pub fn encode_option<T: Into<Scalar>>(value: Option<T>, order: ByteOrder) -> Vec<u8> {
    match value {
        Some(v) => encode(v, order),
        None => NULL_SENTINEL.to_vec(),
    }
}

/// Integral representation backing an enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntRepr {
    /// `i8`
    I8,
    /// `u8`
    U8,
    /// `i16`
    I16,
    /// `u16`
    U16,
    /// `i32`
    I32,
    /// `u32`
    U32,
    /// `i64`
    I64,
    /// `u64`
    U64,
}

/// Enumerations that can be encoded through their discriminant.
///
/// `discriminant` is truncated to the width named by `REPR`, matching an
/// `as` cast from a `#[repr(..)]` enum.
pub trait EncodeEnum {
    /// Underlying integral type
    const REPR: IntRepr;

    /// Discriminant value, sign- or zero-extended to 64 bits
    fn discriminant(&self) -> i64;
}

/// Encode an enumeration through its integral representation
pub fn encode_enum<E: EncodeEnum>(value: &E, order: ByteOrder) -> Vec<u8> {
    let d = value.discriminant();
    let scalar = match E::REPR {
        IntRepr::I8 => Scalar::I8(d as i8),
        IntRepr::U8 => Scalar::U8(d as u8),
        IntRepr::I16 => Scalar::I16(d as i16),
        IntRepr::U16 => Scalar::U16(d as u16),
        IntRepr::I32 => Scalar::I32(d as i32),
        IntRepr::U32 => Scalar::U32(d as u32),
        IntRepr::I64 => Scalar::I64(d),
        IntRepr::U64 => Scalar::U64(d as u64),
    };
    scalar.encode(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_orders() {
        assert_eq!(encode(0x0102_0304u32, ByteOrder::BigEndian), vec![1, 2, 3, 4]);
        assert_eq!(encode(0x0102_0304u32, ByteOrder::LittleEndian), vec![4, 3, 2, 1]);
        assert_eq!(encode(-2i16, ByteOrder::BigEndian), vec![0xFF, 0xFE]);
        assert_eq!(
            encode(1u64, ByteOrder::BigEndian),
            vec![0, 0, 0, 0, 0, 0, 0, 1]
        );
    }

    #[test]
    fn test_single_byte_values_ignore_order() {
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            assert_eq!(encode(true, order), vec![1]);
            assert_eq!(encode(false, order), vec![0]);
            assert_eq!(encode(-1i8, order), vec![0xFF]);
            assert_eq!(encode(0x7Fu8, order), vec![0x7F]);
        }
    }

    #[test]
    fn test_floats_and_chars() {
        assert_eq!(
            encode(1.0f64, ByteOrder::BigEndian),
            vec![0x3F, 0xF0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(encode(1.0f32, ByteOrder::LittleEndian), vec![0, 0, 0x80, 0x3F]);
        assert_eq!(encode('A', ByteOrder::BigEndian), vec![0, 0, 0, 0x41]);
        assert_eq!(Scalar::from('€').size(), 4);
    }

    #[test]
    fn test_null_sentinel_matches_zero() {
        let absent = encode_option::<i32>(None, ByteOrder::BigEndian);
        assert_eq!(absent, NULL_SENTINEL.to_vec());
        assert_eq!(absent, encode(0i32, ByteOrder::BigEndian));
        assert_eq!(encode_option(Some(7u8), ByteOrder::BigEndian), vec![7]);
    }

    #[derive(Clone, Copy)]
    #[repr(u16)]
    enum Colour {
        Red = 1,
        Blue = 0x0200,
    }

    impl EncodeEnum for Colour {
        const REPR: IntRepr = IntRepr::U16;

        fn discriminant(&self) -> i64 {
            *self as u16 as i64
        }
    }

    #[derive(Clone, Copy)]
    #[repr(i64)]
    enum Offset {
        Behind = -1,
    }

    impl EncodeEnum for Offset {
        const REPR: IntRepr = IntRepr::I64;

        fn discriminant(&self) -> i64 {
            *self as i64
        }
    }

    #[test]
    fn test_enum_uses_underlying_width() {
        assert_eq!(encode_enum(&Colour::Red, ByteOrder::BigEndian), vec![0, 1]);
        assert_eq!(encode_enum(&Colour::Blue, ByteOrder::LittleEndian), vec![0, 2]);
        assert_eq!(
            encode_enum(&Offset::Behind, ByteOrder::BigEndian),
            vec![0xFF; 8]
        );
    }
}
