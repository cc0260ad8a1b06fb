//! JSON schema documents.
//!
//! A document declares named records and enums plus the record a form starts
//! from:
//!
//! ```json
//! {
//!   "root": "Person",
//!   "types": {
//!     "Person": { "kind": "record", "fields": [
//!       { "name": "name", "type": "str", "help": "Full name" },
//!       { "name": "age", "type": "int", "default": 30, "min": 0 },
//!       { "name": "color", "type": "Optional[Color]" }
//!     ] },
//!     "Color": { "kind": "enum", "members": [ { "name": "Red", "value": "red" } ] }
//!   }
//! }
//! ```
//!
//! Field annotations are parsed while loading, so syntax errors show up here.
//! Names inside them are *not* resolved until the form is built; a typo in a
//! type name is reported by the dispatcher with the path of the field.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::annotation;
use crate::dispatch::Dispatcher;
use crate::error::{FormError, Result};
use crate::schema::{EnumMember, EnumType, FieldSchema, RecordType, TypeNamespace};
use crate::settings::FormSettings;
use crate::value::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    root: Option<String>,
    #[serde(default)]
    types: IndexMap<String, RawType>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RawType {
    Record {
        #[serde(default)]
        fields: Vec<RawField>,
    },
    Enum {
        members: Vec<RawMember>,
    },
}

#[derive(Debug, Deserialize)]
struct RawField {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    // An explicit `null` is a real default (the `None` branch of an optional).
    #[serde(default, deserialize_with = "present")]
    default: Option<JsonValue>,
    min: Option<f64>,
    max: Option<f64>,
    help: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    name: String,
    #[serde(default, deserialize_with = "present")]
    value: Option<JsonValue>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<JsonValue>, D::Error> {
    JsonValue::deserialize(deserializer).map(Some)
}

/// A loaded document: its namespace and the name of the root record.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    root: String,
    namespace: TypeNamespace,
}

impl SchemaDocument {
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawDocument = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading schema document");
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn from_raw(raw: RawDocument) -> Result<Self> {
        let mut namespace = TypeNamespace::new();
        let mut first_record = None;
        for (name, ty) in raw.types {
            match ty {
                RawType::Record { fields } => {
                    let fields = fields
                        .into_iter()
                        .map(field_schema)
                        .collect::<Result<Vec<_>>>()?;
                    first_record.get_or_insert_with(|| name.clone());
                    namespace.define_record(RecordType::new(name, fields));
                }
                RawType::Enum { members } => {
                    let members = members
                        .into_iter()
                        .map(|m| EnumMember {
                            value: m
                                .value
                                .as_ref()
                                .map(Value::from)
                                .unwrap_or_else(|| Value::Str(m.name.clone())),
                            name: m.name,
                        })
                        .collect();
                    namespace.define_enum(EnumType::new(name, members));
                }
            }
        }
        let root = raw
            .root
            .or(first_record)
            .ok_or_else(|| FormError::Schema("document declares no record".to_string()))?;
        let doc = Self { root, namespace };
        doc.root_record()?;
        Ok(doc)
    }

    /// Start forms from another record of the same document.
    pub fn with_root(mut self, root: impl Into<String>) -> Result<Self> {
        self.root = root.into();
        self.root_record()?;
        Ok(self)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn namespace(&self) -> &TypeNamespace {
        &self.namespace
    }

    pub fn root_record(&self) -> Result<Arc<RecordType>> {
        self.namespace
            .record(&self.root)
            .ok_or_else(|| FormError::Schema(format!("root `{}` is not a record in this document", self.root)))
    }

    pub fn dispatcher(&self, settings: FormSettings) -> Dispatcher {
        Dispatcher::new(self.namespace.clone()).with_settings(settings)
    }
}

fn field_schema(raw: RawField) -> Result<FieldSchema> {
    let ty = annotation::parse(&raw.ty)?;
    Ok(FieldSchema {
        name: raw.name,
        ty,
        default: raw.default.as_ref().map(Value::from),
        min: raw.min,
        max: raw.max,
        help: raw.help,
    })
}
