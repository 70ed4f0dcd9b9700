//! MAT Level 5 type codes.
//!
//! A Level 5 file tags every data element with a storage type (`mi*`) and
//! every array with a MATLAB class (`mx*`). The two are independent: MATLAB
//! routinely stores a `double` array using `miUINT8` elements when all
//! values fit.

use std::fmt;

/// Storage type of a data element (the `mi*` constants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DataType {
    /// 8-bit signed integer
    Int8 = 1,
    /// 8-bit unsigned integer
    UInt8 = 2,
    /// 16-bit signed integer
    Int16 = 3,
    /// 16-bit unsigned integer
    UInt16 = 4,
    /// 32-bit signed integer
    Int32 = 5,
    /// 32-bit unsigned integer
    UInt32 = 6,
    /// IEEE 754 single precision
    Single = 7,
    /// IEEE 754 double precision
    Double = 9,
    /// 64-bit signed integer
    Int64 = 12,
    /// 64-bit unsigned integer
    UInt64 = 13,
    /// Nested array (`miMATRIX`)
    Matrix = 14,
    /// zlib-compressed element (`miCOMPRESSED`)
    Compressed = 15,
    /// UTF-8 encoded text
    Utf8 = 16,
    /// UTF-16 encoded text
    Utf16 = 17,
    /// UTF-32 encoded text
    Utf32 = 18,
}

impl DataType {
    /// Create a DataType from the raw tag value.
    ///
    /// Returns `None` for reserved or unknown codes.
    pub fn from_raw(value: u32) -> Option<Self> {
        Some(match value {
            1 => DataType::Int8,
            2 => DataType::UInt8,
            3 => DataType::Int16,
            4 => DataType::UInt16,
            5 => DataType::Int32,
            6 => DataType::UInt32,
            7 => DataType::Single,
            9 => DataType::Double,
            12 => DataType::Int64,
            13 => DataType::UInt64,
            14 => DataType::Matrix,
            15 => DataType::Compressed,
            16 => DataType::Utf8,
            17 => DataType::Utf16,
            18 => DataType::Utf32,
            _ => return None,
        })
    }

    /// Get the size in bytes of a single element of this type.
    ///
    /// Returns 0 for `Matrix` and `Compressed`, which have no fixed width.
    pub const fn size_bytes(&self) -> usize {
        match self {
            DataType::Int8 | DataType::UInt8 | DataType::Utf8 => 1,
            DataType::Int16 | DataType::UInt16 | DataType::Utf16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Single | DataType::Utf32 => 4,
            DataType::Double | DataType::Int64 | DataType::UInt64 => 8,
            DataType::Matrix | DataType::Compressed => 0,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int8 => "miINT8",
            DataType::UInt8 => "miUINT8",
            DataType::Int16 => "miINT16",
            DataType::UInt16 => "miUINT16",
            DataType::Int32 => "miINT32",
            DataType::UInt32 => "miUINT32",
            DataType::Single => "miSINGLE",
            DataType::Double => "miDOUBLE",
            DataType::Int64 => "miINT64",
            DataType::UInt64 => "miUINT64",
            DataType::Matrix => "miMATRIX",
            DataType::Compressed => "miCOMPRESSED",
            DataType::Utf8 => "miUTF8",
            DataType::Utf16 => "miUTF16",
            DataType::Utf32 => "miUTF32",
        };
        f.write_str(name)
    }
}

/// MATLAB array class (the `mx*` constants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MatClass {
    /// Cell array
    Cell = 1,
    /// Struct array
    Struct = 2,
    /// MATLAB object
    Object = 3,
    /// Character array
    Char = 4,
    /// Sparse matrix
    Sparse = 5,
    /// Double precision array
    Double = 6,
    /// Single precision array
    Single = 7,
    /// int8 array
    Int8 = 8,
    /// uint8 array
    UInt8 = 9,
    /// int16 array
    Int16 = 10,
    /// uint16 array
    UInt16 = 11,
    /// int32 array
    Int32 = 12,
    /// uint32 array
    UInt32 = 13,
    /// int64 array
    Int64 = 14,
    /// uint64 array
    UInt64 = 15,
    /// Function handle
    Function = 16,
    /// Opaque class (e.g. `string`, `table`)
    Opaque = 17,
}

impl MatClass {
    /// Create a MatClass from the low byte of the array flags.
    pub fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            1 => MatClass::Cell,
            2 => MatClass::Struct,
            3 => MatClass::Object,
            4 => MatClass::Char,
            5 => MatClass::Sparse,
            6 => MatClass::Double,
            7 => MatClass::Single,
            8 => MatClass::Int8,
            9 => MatClass::UInt8,
            10 => MatClass::Int16,
            11 => MatClass::UInt16,
            12 => MatClass::Int32,
            13 => MatClass::UInt32,
            14 => MatClass::Int64,
            15 => MatClass::UInt64,
            16 => MatClass::Function,
            17 => MatClass::Opaque,
            _ => return None,
        })
    }

    /// Check if this class holds plain numeric data.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            MatClass::Double
                | MatClass::Single
                | MatClass::Int8
                | MatClass::UInt8
                | MatClass::Int16
                | MatClass::UInt16
                | MatClass::Int32
                | MatClass::UInt32
                | MatClass::Int64
                | MatClass::UInt64
        )
    }

    /// Check if this class is a floating-point class.
    pub const fn is_float(&self) -> bool {
        matches!(self, MatClass::Double | MatClass::Single)
    }

    /// MATLAB's name for the class, as printed by `class()`.
    pub const fn name(&self) -> &'static str {
        match self {
            MatClass::Cell => "cell",
            MatClass::Struct => "struct",
            MatClass::Object => "object",
            MatClass::Char => "char",
            MatClass::Sparse => "sparse",
            MatClass::Double => "double",
            MatClass::Single => "single",
            MatClass::Int8 => "int8",
            MatClass::UInt8 => "uint8",
            MatClass::Int16 => "int16",
            MatClass::UInt16 => "uint16",
            MatClass::Int32 => "int32",
            MatClass::UInt32 => "uint32",
            MatClass::Int64 => "int64",
            MatClass::UInt64 => "uint64",
            MatClass::Function => "function_handle",
            MatClass::Opaque => "opaque",
        }
    }
}

impl fmt::Display for MatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
