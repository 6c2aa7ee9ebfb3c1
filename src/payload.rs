//! Canonical in-memory representation of caller-supplied payloads.
//!
//! Callers attach arbitrary structured data to a notification for use in
//! channel-specific rendering (templated email bodies, realtime event
//! payloads). The data arrives as a generic JSON tree; this module converts
//! it into a tagged value type with a stable traversal API so downstream
//! rendering never has to know the wire encoding.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// A normalized payload value.
///
/// Numbers prefer an integer representation when the source value is
/// integral and fits a signed 64-bit range, and fall back to floating
/// point otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    /// Absence of a value. Nested JSON `null` normalizes to this.
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<PayloadValue>),
    Object(BTreeMap<String, PayloadValue>),
}

impl Default for PayloadValue {
    /// An empty addressable record, so templates referencing unset fields
    /// resolve to "no value" instead of failing.
    fn default() -> Self {
        PayloadValue::Object(BTreeMap::new())
    }
}

impl PayloadValue {
    /// Normalizes a caller-supplied payload into its canonical form.
    ///
    /// Absence of payload and a top-level JSON `null` are equivalent: both
    /// yield an empty record. Total over every JSON shape; never fails.
    pub fn normalize(payload: Option<&Value>) -> PayloadValue {
        match payload {
            None | Some(Value::Null) => PayloadValue::default(),
            Some(value) => Self::from_json(value),
        }
    }

    fn from_json(value: &Value) -> PayloadValue {
        match value {
            Value::Null => PayloadValue::None,
            Value::Bool(b) => PayloadValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => PayloadValue::Int(i),
                // Integral values beyond i64 and all fractional values
                // carry over as floating point.
                None => PayloadValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => PayloadValue::String(s.clone()),
            Value::Array(items) => {
                PayloadValue::Array(items.iter().map(Self::from_json).collect())
            }
            Value::Object(fields) => PayloadValue::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), Self::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Looks up a field by name. Returns `None` for non-object values and
    /// unset fields alike.
    pub fn get(&self, field: &str) -> Option<&PayloadValue> {
        match self {
            PayloadValue::Object(fields) => fields.get(field),
            _ => None,
        }
    }

    /// Returns the elements of an array value.
    pub fn items(&self) -> Option<&[PayloadValue]> {
        match self {
            PayloadValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PayloadValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PayloadValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PayloadValue::Float(f) => Some(*f),
            PayloadValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PayloadValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// True for the empty record produced by normalizing an absent payload.
    pub fn is_empty_record(&self) -> bool {
        matches!(self, PayloadValue::Object(fields) if fields.is_empty())
    }
}

impl Serialize for PayloadValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PayloadValue::None => serializer.serialize_unit(),
            PayloadValue::Bool(b) => serializer.serialize_bool(*b),
            PayloadValue::Int(i) => serializer.serialize_i64(*i),
            PayloadValue::Float(f) => serializer.serialize_f64(*f),
            PayloadValue::String(s) => serializer.serialize_str(s),
            PayloadValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            PayloadValue::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}
