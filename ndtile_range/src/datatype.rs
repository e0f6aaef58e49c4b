//! Dimension datatypes.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The unit of a date-time dimension.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum TimeUnit {
    #[display("Y")]
    Year,
    #[display("M")]
    Month,
    #[display("W")]
    Week,
    #[display("D")]
    Day,
    #[display("h")]
    Hour,
    #[display("m")]
    Minute,
    #[display("s")]
    Second,
    #[display("ms")]
    Millisecond,
    #[display("us")]
    Microsecond,
    #[display("ns")]
    Nanosecond,
    #[display("ps")]
    Picosecond,
    #[display("fs")]
    Femtosecond,
    #[display("as")]
    Attosecond,
}

/// The logical datatype of a dimension.
///
/// Each datatype is stored as one of the [`PhysicalType`]s.
/// Date-time dimensions are stored as `i64` counts of their [`TimeUnit`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Datatype {
    #[display("int8")]
    Int8,
    #[display("uint8")]
    #[serde(rename = "uint8")]
    UInt8,
    #[display("int16")]
    Int16,
    #[display("uint16")]
    #[serde(rename = "uint16")]
    UInt16,
    #[display("int32")]
    Int32,
    #[display("uint32")]
    #[serde(rename = "uint32")]
    UInt32,
    #[display("int64")]
    Int64,
    #[display("uint64")]
    #[serde(rename = "uint64")]
    UInt64,
    #[display("float32")]
    Float32,
    #[display("float64")]
    Float64,
    #[display("datetime[{_0}]")]
    #[serde(rename = "datetime")]
    DateTime(TimeUnit),
}

impl Datatype {
    /// Return the physical type used to store coordinates of this datatype.
    #[must_use]
    pub const fn physical_type(&self) -> PhysicalType {
        match self {
            Self::Int8 => PhysicalType::Int8,
            Self::UInt8 => PhysicalType::UInt8,
            Self::Int16 => PhysicalType::Int16,
            Self::UInt16 => PhysicalType::UInt16,
            Self::Int32 => PhysicalType::Int32,
            Self::UInt32 => PhysicalType::UInt32,
            Self::Int64 | Self::DateTime(_) => PhysicalType::Int64,
            Self::UInt64 => PhysicalType::UInt64,
            Self::Float32 => PhysicalType::Float32,
            Self::Float64 => PhysicalType::Float64,
        }
    }

    /// Returns true if coordinates of this datatype are integers.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        !matches!(self, Self::Float32 | Self::Float64)
    }

    /// The size of a coordinate in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.physical_type().size()
    }
}

/// The in-memory representation of a coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[allow(missing_docs)]
pub enum PhysicalType {
    #[display("i8")]
    Int8,
    #[display("u8")]
    UInt8,
    #[display("i16")]
    Int16,
    #[display("u16")]
    UInt16,
    #[display("i32")]
    Int32,
    #[display("u32")]
    UInt32,
    #[display("i64")]
    Int64,
    #[display("u64")]
    UInt64,
    #[display("f32")]
    Float32,
    #[display("f64")]
    Float64,
}

impl PhysicalType {
    /// The size of the physical type in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }
}

/// Evaluate an expression with a type alias bound to the Rust type of a [`PhysicalType`].
///
/// ```
/// # use ndtile_range::{with_physical_type, PhysicalType, Coordinate};
/// let physical_type = PhysicalType::UInt16;
/// let is_integer = with_physical_type!(physical_type, T => T::IS_INTEGER);
/// assert!(is_integer);
/// ```
#[macro_export]
macro_rules! with_physical_type {
    ($physical_type:expr, $t:ident => $body:expr) => {
        match $physical_type {
            $crate::PhysicalType::Int8 => {
                type $t = i8;
                $body
            }
            $crate::PhysicalType::UInt8 => {
                type $t = u8;
                $body
            }
            $crate::PhysicalType::Int16 => {
                type $t = i16;
                $body
            }
            $crate::PhysicalType::UInt16 => {
                type $t = u16;
                $body
            }
            $crate::PhysicalType::Int32 => {
                type $t = i32;
                $body
            }
            $crate::PhysicalType::UInt32 => {
                type $t = u32;
                $body
            }
            $crate::PhysicalType::Int64 => {
                type $t = i64;
                $body
            }
            $crate::PhysicalType::UInt64 => {
                type $t = u64;
                $body
            }
            $crate::PhysicalType::Float32 => {
                type $t = f32;
                $body
            }
            $crate::PhysicalType::Float64 => {
                type $t = f64;
                $body
            }
        }
    };
}
