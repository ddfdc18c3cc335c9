//! Ordered record model for tile rendering.
//!
//! A [`Record`] is an insertion-ordered map of string keys to [`Value`]s. Key
//! order is significant: it is preserved through deserialization, merging and
//! rendering, so a tile always lists fields in the order the producing
//! service emitted them.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reserved key holding presentation metadata (tile title and creator).
///
/// Entries under this key are consumed by the tile builder and are never
/// rendered as generic fields.
pub const METADATA_KEY: &str = "_metadata";

/// A renderable leaf value.
///
/// The textual forms are fixed: `Null` renders as the literal `null`, bools
/// as `true`/`false`, numbers in their JSON display form and strings
/// verbatim, without quotes.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// A record entry value: either a renderable leaf or a nested record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Nested(Record),
}

impl Value {
    /// A null leaf.
    pub fn null() -> Self {
        Value::Scalar(Scalar::Null)
    }

    /// A text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Text(text.into()))
    }

    /// An integer leaf.
    pub fn integer(n: i64) -> Self {
        Value::Scalar(Scalar::Number(serde_json::Number::from(n)))
    }

    /// A floating-point leaf. Non-finite inputs degrade to a null leaf, since
    /// they have no JSON representation.
    pub fn number(n: f64) -> Self {
        match serde_json::Number::from_f64(n) {
            Some(n) => Value::Scalar(Scalar::Number(n)),
            None => Value::null(),
        }
    }

    /// A boolean leaf.
    pub fn bool(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }

    /// Returns the nested record, if this value is one.
    pub fn as_nested(&self) -> Option<&Record> {
        match self {
            Value::Nested(record) => Some(record),
            Value::Scalar(_) => None,
        }
    }

    /// Returns the scalar, if this value is one.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            Value::Nested(_) => None,
        }
    }
}

/// An insertion-ordered key/value record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: IndexMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry. An existing key keeps its original position and gets
    /// the new value; a new key is appended at the end.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Looks up an entry by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Merges every entry of `other` into this record, overwriting values of
    /// keys already present (which keep their position) and appending new
    /// keys in `other`'s order.
    pub fn merge(&mut self, other: Record) {
        for (key, value) in other {
            self.insert(key, value);
        }
    }

    /// Returns the nested metadata record, if present.
    pub fn metadata(&self) -> Option<&Record> {
        self.get(METADATA_KEY).and_then(Value::as_nested)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Scalar(Scalar::Null) => serializer.serialize_unit(),
            Value::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Value::Scalar(Scalar::Number(n)) => n.serialize(serializer),
            Value::Scalar(Scalar::Text(s)) => serializer.serialize_str(s),
            Value::Nested(record) => record.serialize(serializer),
        }
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = Record;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a key/value record")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Record, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut record = Record::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            record.insert(key, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a scalar, sequence, or key/value record")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Scalar(Scalar::Bool(v)))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Scalar(Scalar::Number(serde_json::Number::from(v))))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Scalar(Scalar::Number(serde_json::Number::from(v))))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E>
    where
        E: serde::de::Error,
    {
        match serde_json::Number::from_f64(v) {
            Some(n) => Ok(Value::Scalar(Scalar::Number(n))),
            None => Err(E::custom("non-finite numbers are not representable")),
        }
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::text(v))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::Scalar(Scalar::Text(v)))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::null())
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::null())
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer)
    }

    fn visit_map<A>(self, access: A) -> Result<Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        RecordVisitor.visit_map(access).map(Value::Nested)
    }

    // Sequences become records keyed by decimal index, which renders them as
    // enumerated nested entries.
    fn visit_seq<A>(self, mut access: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut record = Record::new();
        let mut index = 0usize;
        while let Some(element) = access.next_element::<Value>()? {
            record.insert(index.to_string(), element);
            index += 1;
        }
        Ok(Value::Nested(record))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}
