//! JSON rendering of ordered key/value sequences
//!
//! Values that JSON can represent directly (null, bool, numbers, strings,
//! lists, tuples and mappings) are rendered as-is; anything else goes through
//! the caller's transform callback and the result is rendered in turn.
//! Text output uses `", "` and `": "` separators.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Number};

use super::errors::{ConversionError, SchemaError, SchemaResult};
use super::value::Value;

/// Callback turning a value JSON cannot represent into one closer to JSON.
pub type Transform<'a> = &'a dyn Fn(&Value) -> SchemaResult<Value>;

const MAX_DEPTH: usize = 128;

/// Renders `value` as JSON, calling `default` for non-JSON values.
pub fn to_json(value: &Value, default: Transform<'_>) -> SchemaResult<serde_json::Value> {
    render(value, default, 0)
}

/// Renders an ordered key/value sequence as a JSON object.
pub fn to_json_object<'v>(
    items: impl IntoIterator<Item = (&'v str, &'v Value)>,
    default: Transform<'_>,
) -> SchemaResult<serde_json::Value> {
    let mut map = Map::new();
    for (key, value) in items {
        map.insert(key.to_string(), render(value, default, 0)?);
    }
    Ok(serde_json::Value::Object(map))
}

/// Renders an ordered key/value sequence straight to JSON text.
pub fn dumps<'v>(
    items: impl IntoIterator<Item = (&'v str, &'v Value)>,
    default: Transform<'_>,
) -> SchemaResult<String> {
    to_text(&to_json_object(items, default)?)
}

/// Writes a JSON value as text with spaced separators.
pub fn to_text(json: &serde_json::Value) -> SchemaResult<String> {
    let text_error = |e: &dyn std::fmt::Display| {
        SchemaError::encode_failed("json", &ConversionError::Custom(e.to_string()))
    };
    let mut buf = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    json.serialize(&mut ser).map_err(|e| text_error(&e))?;
    String::from_utf8(buf).map_err(|e| text_error(&e))
}

fn render(value: &Value, default: Transform<'_>, depth: usize) -> SchemaResult<serde_json::Value> {
    if depth > MAX_DEPTH {
        return Err(SchemaError::encode_failed(
            &value.type_name(),
            &ConversionError::Custom("encoding recursion limit exceeded".into()),
        ));
    }

    let json = match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number(Number::from(*i)),
        Value::Float(f) => Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::List(items) | Value::Tuple(items) => serde_json::Value::Array(
            items
                .iter()
                .map(|item| render(item, default, depth + 1))
                .collect::<SchemaResult<Vec<_>>>()?,
        ),
        Value::Dict(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k.clone(), render(v, default, depth + 1)?);
            }
            serde_json::Value::Object(out)
        }
        other => render(&default(other)?, default, depth + 1)?,
    };
    Ok(json)
}

/// Compact JSON with a space after `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
