// utils/move_decode.rs
//! Decode strategies for Move values as the JSON-RPC node renders them.
//!
//! The same logical value reaches us in several shapes depending on where it
//! sits in the object (top level, inside a vector, inside an `Option`). None of
//! these helpers fail: an unrecognized shape degrades to `None`, an empty
//! collection, or a stringified copy of the JSON.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::utils::address::normalize_address;

/// How many wrapper layers (`Option`, `{bytes}`) a string may hide behind.
/// A `{fields}` envelope is part of the struct it wraps and is not a layer.
pub const MAX_STRING_WRAP_DEPTH: usize = 2;

static NULL: Value = Value::Null;

/// Field lookup that yields `null` for a missing key.
pub fn field<'a>(fields: &'a Map<String, Value>, name: &str) -> &'a Value {
    fields.get(name).unwrap_or(&NULL)
}

/// Move `Option<T>`: `null`, `{fields: {vec: [v]}}` or `{vec: [v]}`.
/// `fields.vec` is checked before `vec`; an empty vector is "no value".
pub fn decode_option(value: &Value) -> Option<&Value> {
    let vec = value
        .get("fields")
        .and_then(|f| f.get("vec"))
        .or_else(|| value.get("vec"))?;

    vec.as_array()?.first()
}

fn is_option_shape(map: &Map<String, Value>) -> bool {
    map.contains_key("vec")
        || map
            .get("fields")
            .and_then(Value::as_object)
            .map_or(false, |f| f.contains_key("vec"))
}

/// A logical string: raw string, `vector<u8>` bytes, `{bytes}` struct, or any of
/// those inside an `Option`, up to `MAX_STRING_WRAP_DEPTH` layers deep.
pub fn decode_wrapped_string(value: &Value) -> Option<String> {
    unwrap_string(value, 0)
}

fn unwrap_string(value: &Value, depth: usize) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(bytes_to_string(items).unwrap_or_else(|| value.to_string())),
        Value::Object(map) => {
            if depth >= MAX_STRING_WRAP_DEPTH {
                return Some(value.to_string());
            }
            if let Some(bytes) = map.get("bytes") {
                return unwrap_string(bytes, depth + 1);
            }
            if is_option_shape(map) {
                return decode_option(value).and_then(|inner| unwrap_string(inner, depth + 1));
            }
            if let Some(fields) = map.get("fields") {
                return unwrap_string(fields, depth);
            }
            Some(value.to_string())
        }
    }
}

fn bytes_to_string(items: &[Value]) -> Option<String> {
    let bytes = items
        .iter()
        .map(|b| b.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect::<Option<Vec<u8>>>()?;

    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Arrays of nested structs: each item may be `{fields: {...}}` or the bare field object.
pub fn decode_struct_array(value: &Value) -> Vec<&Map<String, Value>> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| item.get("fields").unwrap_or(item).as_object())
        .collect()
}

/// Unwraps a top-level struct, including the `{name, value}` envelope a dynamic
/// field object puts around its payload.
pub fn struct_fields(value: &Value) -> Option<&Map<String, Value>> {
    let map = value.get("fields").unwrap_or(value).as_object()?;

    if map.contains_key("name") {
        if let Some(inner) = map.get("value").filter(|v| v.is_object()) {
            if let Some(inner_fields) = inner.get("fields").and_then(Value::as_object) {
                return Some(inner_fields);
            }
        }
    }

    Some(map)
}

/// u64 values are rendered as decimal strings; accept plain numbers too.
pub fn decode_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn decode_u64_or_zero(value: &Value) -> u64 {
    decode_u64(value).unwrap_or(0)
}

pub fn decode_optional_u64(value: &Value) -> Option<u64> {
    decode_option(value).and_then(decode_u64)
}

pub fn decode_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
        Value::Number(n) => n.as_u64() == Some(1),
        _ => false,
    }
}

/// Millisecond timestamps (`Clock::timestamp_ms`).
pub fn decode_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let millis = i64::try_from(decode_u64(value)?).ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

pub fn decode_address(value: &Value) -> Option<String> {
    decode_wrapped_string(value).map(|s| normalize_address(&s))
}

pub fn decode_string_or_empty(value: &Value) -> String {
    decode_wrapped_string(value).unwrap_or_default()
}

/// `vector<String>` or a `VecSet<String>` (`{contents: [...]}`, optionally under `fields`).
pub fn decode_string_list(value: &Value) -> Vec<String> {
    let items = value
        .as_array()
        .or_else(|| {
            value
                .get("fields")
                .unwrap_or(value)
                .get("contents")
                .and_then(Value::as_array)
        });

    items
        .map(|items| items.iter().filter_map(decode_wrapped_string).collect())
        .unwrap_or_default()
}

/// Like `decode_string_list` but drops repeats, keeping first-seen order.
pub fn decode_string_set(value: &Value) -> Vec<String> {
    let mut seen = Vec::new();
    for item in decode_string_list(value) {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

/// Move `VecMap<String, u64>`: `{fields: {contents: [{fields: {key, value}}]}}`.
pub fn decode_vec_map_u64(value: &Value) -> HashMap<String, u64> {
    let contents = value.get("fields").unwrap_or(value).get("contents").unwrap_or(&NULL);

    decode_struct_array(contents)
        .into_iter()
        .filter_map(|entry| {
            let key = decode_wrapped_string(field(entry, "key"))?;
            let value = decode_u64(field(entry, "value"))?;
            Some((key, value))
        })
        .collect()
}

/// A Move enum as the node renders it: a `u8` discriminant, a variant name,
/// or `{variant: "Name", fields: {...}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumTag {
    Index(u64),
    Name(String),
}

pub fn decode_enum_tag(value: &Value) -> Option<EnumTag> {
    match value {
        Value::Number(n) => n.as_u64().map(EnumTag::Index),
        Value::String(s) => Some(
            s.parse::<u64>()
                .map(EnumTag::Index)
                .unwrap_or_else(|_| EnumTag::Name(s.clone())),
        ),
        Value::Object(map) => match map.get("variant") {
            Some(variant) => decode_enum_tag(variant),
            None => map.get("fields").and_then(decode_enum_tag),
        },
        _ => None,
    }
}
