use indexmap::IndexMap;
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::handle::{Handle, REF_KEY};

/// A value crossing the kernel boundary.
///
/// The wire universe is closed: a value is a primitive, a string, an
/// ordered sequence, a string-keyed map (insertion order preserved), or a
/// [`Handle`]. Map keys are opaque strings and are never transformed.
///
/// JSON mapping: a JSON object whose only member is a `$ref` string is a
/// `Handle`; every other object is a `Map`.
#[derive(Clone, Debug, PartialEq)]
pub enum WireValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Sequence(Vec<WireValue>),
    Map(IndexMap<String, WireValue>),
    Handle(Handle),
}

impl WireValue {
    /// Shape name used in diagnostics and mismatch errors.
    pub fn shape(&self) -> &'static str {
        match self {
            WireValue::Null => "null",
            WireValue::Bool(_) => "boolean",
            WireValue::Number(_) => "number",
            WireValue::String(_) => "string",
            WireValue::Sequence(_) => "sequence",
            WireValue::Map(_) => "map",
            WireValue::Handle(_) => "handle",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WireValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            WireValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            WireValue::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WireValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, WireValue>> {
        match self {
            WireValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            WireValue::Handle(h) => Some(h),
            _ => None,
        }
    }
}

impl From<bool> for WireValue {
    fn from(b: bool) -> Self {
        WireValue::Bool(b)
    }
}

impl From<i32> for WireValue {
    fn from(i: i32) -> Self {
        WireValue::Number(i.into())
    }
}

impl From<i64> for WireValue {
    fn from(i: i64) -> Self {
        WireValue::Number(i.into())
    }
}

impl From<u64> for WireValue {
    fn from(i: u64) -> Self {
        WireValue::Number(i.into())
    }
}

impl From<f64> for WireValue {
    fn from(f: f64) -> Self {
        // Non-finite floats have no JSON representation
        serde_json::Number::from_f64(f).map_or(WireValue::Null, WireValue::Number)
    }
}

impl From<&str> for WireValue {
    fn from(s: &str) -> Self {
        WireValue::String(s.to_string())
    }
}

impl From<String> for WireValue {
    fn from(s: String) -> Self {
        WireValue::String(s)
    }
}

impl From<Handle> for WireValue {
    fn from(h: Handle) -> Self {
        WireValue::Handle(h)
    }
}

impl From<Vec<WireValue>> for WireValue {
    fn from(items: Vec<WireValue>) -> Self {
        WireValue::Sequence(items)
    }
}

impl From<IndexMap<String, WireValue>> for WireValue {
    fn from(entries: IndexMap<String, WireValue>) -> Self {
        WireValue::Map(entries)
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireValue::Null => serializer.serialize_unit(),
            WireValue::Bool(b) => serializer.serialize_bool(*b),
            WireValue::Number(n) => n.serialize(serializer),
            WireValue::String(s) => serializer.serialize_str(s),
            WireValue::Sequence(items) => items.serialize(serializer),
            WireValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            WireValue::Handle(h) => h.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WireValueVisitor)
    }
}

struct WireValueVisitor;

impl<'de> Visitor<'de> for WireValueVisitor {
    type Value = WireValue;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a wire value (primitive, string, sequence, map, or handle)")
    }

    fn visit_bool<E: serde::de::Error>(self, b: bool) -> Result<Self::Value, E> {
        Ok(WireValue::Bool(b))
    }

    fn visit_i64<E: serde::de::Error>(self, i: i64) -> Result<Self::Value, E> {
        Ok(WireValue::Number(i.into()))
    }

    fn visit_u64<E: serde::de::Error>(self, u: u64) -> Result<Self::Value, E> {
        Ok(WireValue::Number(u.into()))
    }

    fn visit_f64<E: serde::de::Error>(self, f: f64) -> Result<Self::Value, E> {
        Ok(WireValue::from(f))
    }

    fn visit_str<E: serde::de::Error>(self, s: &str) -> Result<Self::Value, E> {
        Ok(WireValue::String(s.to_string()))
    }

    fn visit_string<E: serde::de::Error>(self, s: String) -> Result<Self::Value, E> {
        Ok(WireValue::String(s))
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(WireValue::Null)
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(WireValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(WireValue::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries: IndexMap<String, WireValue> =
            IndexMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, WireValue>()? {
            entries.insert(key, value);
        }

        // An object whose only member is a `$ref` string is a handle.
        if entries.len() == 1
            && let Some(WireValue::String(id)) = entries.get(REF_KEY)
        {
            return Ok(WireValue::Handle(Handle::new(id.clone())));
        }

        Ok(WireValue::Map(entries))
    }
}
