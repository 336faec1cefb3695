//! Declared property kinds and typed property values.

use std::fmt;

use crate::dispatch::ResultValue;

/// Kind a host property declares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Bool,
    Int,
    Float,
    String,
    Float2,
    Float3,
    Float4,
    Int2,
    Int3,
    Int4,
    /// RGB color; stored by the host as a float3.
    ColorRgb,
    ColorRgba,
    /// Integer-backed enumeration identified by its host type id.
    Enum { type_id: String },
}

impl PropertyKind {
    /// Host type identifier for this kind.
    pub fn type_id(&self) -> &str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Float2 => "float2",
            Self::Float3 => "float3",
            Self::Float4 => "float4",
            Self::Int2 => "int2",
            Self::Int3 => "int3",
            Self::Int4 => "int4",
            Self::ColorRgb => "colorrgb",
            Self::ColorRgba => "colorrgba",
            Self::Enum { type_id } => type_id,
        }
    }

    /// Returns true when `value` may be stored in a property of this kind.
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        matches!(
            (self, value),
            (Self::Bool, PropertyValue::Bool(_))
                | (Self::Int, PropertyValue::Int(_))
                | (Self::Float, PropertyValue::Float(_))
                | (Self::String, PropertyValue::String(_))
                | (Self::Float2, PropertyValue::Float2(_))
                | (Self::Float3 | Self::ColorRgb, PropertyValue::Float3(_))
                | (Self::Float4, PropertyValue::Float4(_))
                | (Self::Int2, PropertyValue::Int2(_))
                | (Self::Int3, PropertyValue::Int3(_))
                | (Self::Int4, PropertyValue::Int4(_))
                | (Self::ColorRgba, PropertyValue::ColorRgba(_))
                | (Self::Enum { .. }, PropertyValue::Enum(_))
        )
    }

    /// Zero value for a freshly created property of this kind.
    pub fn default_value(&self) -> PropertyValue {
        match self {
            Self::Bool => PropertyValue::Bool(false),
            Self::Int => PropertyValue::Int(0),
            Self::Float => PropertyValue::Float(0.0),
            Self::String => PropertyValue::String(String::new()),
            Self::Float2 => PropertyValue::Float2([0.0; 2]),
            Self::Float3 | Self::ColorRgb => PropertyValue::Float3([0.0; 3]),
            Self::Float4 => PropertyValue::Float4([0.0; 4]),
            Self::Int2 => PropertyValue::Int2([0; 2]),
            Self::Int3 => PropertyValue::Int3([0; 3]),
            Self::Int4 => PropertyValue::Int4([0; 4]),
            Self::ColorRgba => PropertyValue::ColorRgba([0.0, 0.0, 0.0, 1.0]),
            Self::Enum { .. } => PropertyValue::Enum(0),
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.type_id())
    }
}

/// Value ready to be applied to a host property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Float(f64),
    String(String),
    Float2([f64; 2]),
    Float3([f64; 3]),
    Float4([f64; 4]),
    Int2([i32; 2]),
    Int3([i32; 3]),
    Int4([i32; 4]),
    ColorRgba([f64; 4]),
    Enum(i32),
}

const VECTOR_KEYS: [&str; 4] = ["x", "y", "z", "w"];
const COLOR_KEYS: [&str; 4] = ["r", "g", "b", "a"];

impl PropertyValue {
    /// Result form: vectors as `{x, y, z, w}`, colors as `{r, g, b, a}`.
    pub fn to_result(&self) -> ResultValue {
        match self {
            Self::Bool(flag) => ResultValue::Bool(*flag),
            Self::Int(number) | Self::Enum(number) => ResultValue::from(*number),
            Self::Float(number) => ResultValue::Float(*number),
            Self::String(text) => ResultValue::from(text.as_str()),
            Self::Float2(items) => keyed(&VECTOR_KEYS, items.iter().copied()),
            Self::Float3(items) => keyed(&VECTOR_KEYS, items.iter().copied()),
            Self::Float4(items) => keyed(&VECTOR_KEYS, items.iter().copied()),
            Self::Int2(items) => keyed(&VECTOR_KEYS, items.iter().copied()),
            Self::Int3(items) => keyed(&VECTOR_KEYS, items.iter().copied()),
            Self::Int4(items) => keyed(&VECTOR_KEYS, items.iter().copied()),
            Self::ColorRgba(items) => keyed(&COLOR_KEYS, items.iter().copied()),
        }
    }
}

fn keyed<T: Into<ResultValue>>(keys: &[&str], items: impl Iterator<Item = T>) -> ResultValue {
    ResultValue::object(keys.iter().copied().zip(items))
}
