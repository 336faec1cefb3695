//! Conversion of raw JSON values to declared property kinds.

use serde_json::{Map, Value};

use super::kind::{PropertyKind, PropertyValue};
use super::{CoercionError, PropertyIntrospection, PropertyRef};

const VECTOR_KEYS: [&str; 4] = ["x", "y", "z", "w"];
const COLOR_KEYS: [&str; 4] = ["r", "g", "b", "a"];

/// Converts `raw` to the kind `property` declares right now.
///
/// # Errors
///
/// Returns the introspection error when the property does not exist, or
/// [`CoercionError::TypeMismatch`] when no lossless conversion exists.
pub fn coerce<I>(host: &I, property: &PropertyRef, raw: &Value) -> Result<PropertyValue, CoercionError>
where
    I: PropertyIntrospection + ?Sized,
{
    let descriptor = host.describe(property)?;
    coerce_to_kind(&descriptor.declared_kind, raw).map_err(|reason| CoercionError::TypeMismatch {
        property: property.clone(),
        declared: descriptor.declared_kind,
        reason,
    })
}

/// Converts `raw` to `kind`, returning a human-readable reason on failure.
///
/// # Errors
///
/// Returns the reason the value cannot be represented as `kind`.
pub fn coerce_to_kind(kind: &PropertyKind, raw: &Value) -> Result<PropertyValue, String> {
    match kind {
        PropertyKind::Bool => raw
            .as_bool()
            .map(PropertyValue::Bool)
            .ok_or_else(|| expected("a boolean", raw)),
        PropertyKind::Int => integer(raw).map(PropertyValue::Int),
        PropertyKind::Enum { .. } => integer(raw).map(PropertyValue::Enum),
        PropertyKind::Float => float(raw).map(PropertyValue::Float),
        PropertyKind::String => raw
            .as_str()
            .map(|text| PropertyValue::String(text.to_owned()))
            .ok_or_else(|| expected("a string", raw)),
        PropertyKind::Float2 => components(raw, &VECTOR_KEYS, float).map(PropertyValue::Float2),
        PropertyKind::Float3 => components(raw, &VECTOR_KEYS, float).map(PropertyValue::Float3),
        PropertyKind::Float4 => components(raw, &VECTOR_KEYS, float).map(PropertyValue::Float4),
        PropertyKind::Int2 => components(raw, &VECTOR_KEYS, integer).map(PropertyValue::Int2),
        PropertyKind::Int3 => components(raw, &VECTOR_KEYS, integer).map(PropertyValue::Int3),
        PropertyKind::Int4 => components(raw, &VECTOR_KEYS, integer).map(PropertyValue::Int4),
        PropertyKind::ColorRgb => components(raw, &COLOR_KEYS, float).map(PropertyValue::Float3),
        PropertyKind::ColorRgba => rgba(raw).map(PropertyValue::ColorRgba),
    }
}

fn float(raw: &Value) -> Result<f64, String> {
    raw.as_f64().ok_or_else(|| expected("a number", raw))
}

fn integer(raw: &Value) -> Result<i32, String> {
    let Value::Number(number) = raw else {
        return Err(expected("an integer", raw));
    };
    if let Some(wide) = number.as_i64() {
        return i32::try_from(wide).map_err(|_| format!("integer {wide} is outside the 32-bit range"));
    }
    if number.is_u64() {
        return Err(format!("integer {number} is outside the 32-bit range"));
    }
    Err(format!("float-shaped number {number} is not an integer"))
}

/// Reads exactly `N` components from an array or from an object keyed by the
/// first `N` names in `keys`.
fn components<T, const N: usize>(
    raw: &Value,
    keys: &[&str; 4],
    scalar: fn(&Value) -> Result<T, String>,
) -> Result<[T; N], String>
where
    T: Copy + Default,
{
    let items: Vec<&Value> = match raw {
        Value::Array(items) if items.len() == N => items.iter().collect(),
        Value::Array(items) => {
            return Err(format!("expected {N} components, got {}", items.len()));
        }
        Value::Object(map) => keyed_components(map, &keys[..N])?,
        other => return Err(expected(&format!("an array of {N} numbers"), other)),
    };
    let mut out = [T::default(); N];
    for (index, (slot, item)) in out.iter_mut().zip(items).enumerate() {
        *slot = scalar(item).map_err(|reason| format!("component {index}: {reason}"))?;
    }
    Ok(out)
}

fn keyed_components<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Result<Vec<&'a Value>, String> {
    if let Some(extra) = map.keys().find(|key| !keys.contains(&key.as_str())) {
        return Err(format!(
            "unexpected component '{extra}'; expected {}",
            keys.join(", ")
        ));
    }
    keys.iter()
        .map(|key| {
            map.get(*key)
                .ok_or_else(|| format!("missing component '{key}'"))
        })
        .collect()
}

/// RGBA also accepts three components, with alpha defaulting to opaque.
fn rgba(raw: &Value) -> Result<[f64; 4], String> {
    let has_alpha = match raw {
        Value::Array(items) => items.len() != 3,
        Value::Object(map) => map.contains_key("a"),
        _ => true,
    };
    if has_alpha {
        return components(raw, &COLOR_KEYS, float);
    }
    let [r, g, b] = components::<f64, 3>(raw, &COLOR_KEYS, float)?;
    Ok([r, g, b, 1.0])
}

fn expected(what: &str, raw: &Value) -> String {
    format!("expected {what}, got {}", describe(raw))
}

fn describe(raw: &Value) -> String {
    match raw {
        Value::Null => "null".to_owned(),
        Value::Bool(flag) => format!("boolean {flag}"),
        Value::Number(number) => format!("number {number}"),
        Value::String(_) => "a string".to_owned(),
        Value::Array(items) => format!("an array of {} elements", items.len()),
        Value::Object(_) => "an object".to_owned(),
    }
}
