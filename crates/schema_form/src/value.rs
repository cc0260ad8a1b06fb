//! Structured values recovered from a live editor tree.
//!
//! `Value` is what every extractor returns. It mirrors the shape of the
//! originating type: scalars for primitive editors, `List` / `Map` for the
//! repeatable containers and `Record` for nested forms.
//!
//! Notes:
//! - Equality and hashing are structural. Floats compare by a canonical bit
//!   pattern (`-0.0 == 0.0`, every NaN equals every other NaN) so that any
//!   hashable value can serve as a mapping key.
//! - `List`, `Map` and `Record` are *unhashable*: a mapping editor refuses them
//!   as keys (see `EntryWarning::UnhashableKey`).
//! - `Display` renders the canonical string form (strings unquoted). It keys
//!   the literal display map, so two literals with the same canonical form are
//!   indistinguishable on screen.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    List(Vec<Value>),
    Map(IndexMap<Value, Value>),
    Record(IndexMap<String, Value>),
}

impl Value {
    /// Whether the value may be used as a mapping key.
    pub fn is_hashable(&self) -> bool {
        !matches!(self, Value::List(_) | Value::Map(_) | Value::Record(_))
    }

    /// Short name of the value's shape, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Map(_) => "dict",
            Value::Record(_) => "record",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Field lookup on a record value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Display form used by the collection editors: like `Display`, but strings
    /// are quoted so `"1"` and `1` stay apart in a list.
    pub fn render(&self) -> String {
        match self {
            Value::Str(s) => format!("{s:?}"),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::render).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Map(entries) => {
                let inner: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.render(), v.render()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Value::Record(fields) => {
                let inner: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{k}={}", v.render()))
                    .collect();
                format!("({})", inner.join(", "))
            }
            other => other.to_string(),
        }
    }

    /// JSON view of the value. Mapping keys become their canonical strings.
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

fn float_key(f: f64) -> u64 {
    if f == 0.0 {
        0.0f64.to_bits()
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_key(*a) == float_key(*b),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => float_key(*f).hash(state),
            Value::Str(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Time(t) => t.hash(state),
            Value::DateTime(dt) => dt.hash(state),
            Value::List(items) => items.hash(state),
            // Map equality ignores order, so only the length may feed the hash.
            Value::Map(entries) => entries.len().hash(state),
            Value::Record(fields) => fields.len().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Value::List(_) | Value::Map(_) | Value::Record(_) => f.write_str(&self.render()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Date(_) | Value::Time(_) | Value::DateTime(_) => {
                serializer.serialize_str(&self.to_string())
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(&k.to_string(), v)?;
                }
                map.end()
            }
            Value::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<&JsonValue> for Value {
    fn from(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            JsonValue::String(s) => Value::Str(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            JsonValue::Object(fields) => Value::Record(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn floats_hash_by_canonical_bits() {
        assert_eq!(Value::Float(0.0), Value::Float(-0.0));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        let mut map = IndexMap::new();
        map.insert(Value::Float(-0.0), Value::Int(1));
        assert!(map.contains_key(&Value::Float(0.0)));
    }

    #[test]
    fn int_and_float_stay_distinct() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn containers_are_not_hashable() {
        assert!(Value::Str("a".into()).is_hashable());
        assert!(Value::Null.is_hashable());
        assert!(!Value::List(vec![]).is_hashable());
        assert!(!Value::Map(IndexMap::new()).is_hashable());
        assert!(!Value::Record(IndexMap::new()).is_hashable());
    }

    #[test]
    fn canonical_display_collides_for_str_and_int() {
        assert_eq!(Value::Str("1".into()).to_string(), Value::Int(1).to_string());
        assert_ne!(Value::Str("1".into()).render(), Value::Int(1).render());
    }

    #[test]
    fn json_uses_iso_dates_and_string_keys() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let mut map = IndexMap::new();
        map.insert(Value::Int(7), Value::Date(date));
        let mut rec = IndexMap::new();
        rec.insert("m".to_string(), Value::Map(map));
        rec.insert("xs".to_string(), Value::List(vec![Value::Null, 1.5.into()]));
        assert_eq!(
            Value::Record(rec).to_json(),
            json!({"m": {"7": "2024-03-09"}, "xs": [null, 1.5]})
        );
    }

    #[test]
    fn from_json_prefers_integers() {
        assert_eq!(Value::from(&json!(3)), Value::Int(3));
        assert_eq!(Value::from(&json!(3.5)), Value::Float(3.5));
        assert_eq!(
            Value::from(&json!({"a": [true]})).field("a"),
            Some(&Value::List(vec![Value::Bool(true)]))
        );
    }
}
