//! Conversion of handler results into wire-safe JSON.
//!
//! Two rules apply. An absent top-level result becomes an empty object, so
//! clients can always treat a success reply as a JSON object or value. Floats
//! that JSON cannot represent are replaced: NaN becomes `null`, and positive
//! or negative infinity become `±1e308`. Finite values pass through unchanged.

use serde_json::{Map, Number, Value};

use super::value::ResultValue;

/// Substitute for positive or negative infinity.
pub const INFINITY_SENTINEL: f64 = 1e308;

/// Sanitizes a handler result for transmission.
pub fn sanitize(result: ResultValue) -> Value {
    match result {
        ResultValue::Null => Value::Object(Map::new()),
        other => sanitize_value(other),
    }
}

fn sanitize_value(value: ResultValue) -> Value {
    match value {
        ResultValue::Null => Value::Null,
        ResultValue::Bool(flag) => Value::Bool(flag),
        ResultValue::Integer(number) => Value::Number(number.into()),
        ResultValue::Float(number) => sanitize_float(number),
        ResultValue::String(text) => Value::String(text),
        ResultValue::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        ResultValue::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, sanitize_value(value)))
                .collect(),
        ),
    }
}

fn sanitize_float(number: f64) -> Value {
    if number.is_nan() {
        return Value::Null;
    }
    let finite = if number.is_infinite() {
        INFINITY_SENTINEL.copysign(number)
    } else {
        number
    };
    Number::from_f64(finite).map_or(Value::Null, Value::Number)
}
