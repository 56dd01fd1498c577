//! Tensor element types.

use std::fmt;

/// Element type of an exported tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ElementType {
    /// Unsigned byte.
    UInt8 = 0,
    /// Signed byte.
    Int8 = 1,
    /// Signed 16-bit integer.
    Int16 = 2,
    /// Signed 32-bit integer.
    Int32 = 3,
    /// Signed 64-bit integer.
    Int64 = 4,
    /// IEEE half-precision float.
    Float16 = 5,
    /// IEEE single-precision float.
    Float32 = 6,
}

impl ElementType {
    /// Width of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            ElementType::UInt8 | ElementType::Int8 => 1,
            ElementType::Int16 | ElementType::Float16 => 2,
            ElementType::Int32 | ElementType::Float32 => 4,
            ElementType::Int64 => 8,
        }
    }

    /// Decode the C ABI discriminant.
    pub fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            0 => ElementType::UInt8,
            1 => ElementType::Int8,
            2 => ElementType::Int16,
            3 => ElementType::Int32,
            4 => ElementType::Int64,
            5 => ElementType::Float16,
            6 => ElementType::Float32,
            _ => return None,
        })
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::UInt8 => "u8",
            ElementType::Int8 => "i8",
            ElementType::Int16 => "i16",
            ElementType::Int32 => "i32",
            ElementType::Int64 => "i64",
            ElementType::Float16 => "f16",
            ElementType::Float32 => "f32",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(ElementType::UInt8.size_of(), 1);
        assert_eq!(ElementType::Float16.size_of(), 2);
        assert_eq!(ElementType::Int32.size_of(), 4);
        assert_eq!(ElementType::Float32.size_of(), 4);
        assert_eq!(ElementType::Int64.size_of(), 8);
    }

    #[test]
    fn raw_round_trip() {
        for raw in 0..7 {
            let ty = ElementType::from_raw(raw).unwrap();
            assert_eq!(ty as i32, raw);
        }
        assert_eq!(ElementType::from_raw(7), None);
        assert_eq!(ElementType::from_raw(-1), None);
    }
}
