//! Declarative schema model consumed by the dispatcher.
//!
//! The schema layer hands us *raw* type expressions (`TypeExpr`), much like the
//! annotations a data-modeling library stores on its fields. They are not
//! classified yet; `classify` turns one of them into a `TypeDescriptor` at the
//! moment its editor is built. Named references (`TypeExpr::Named`) are resolved
//! through a `TypeNamespace` at that same moment, which is what allows a record
//! to mention itself.
//!
//! Typical usage:
//! ```ignore
//! let person = RecordType::new("Person", vec![
//!     FieldSchema::new("name", TypeExpr::primitive(PrimitiveKind::Str)),
//!     FieldSchema::new("age", TypeExpr::primitive(PrimitiveKind::Int)).min(0.0),
//!     FieldSchema::new("tags", TypeExpr::list(TypeExpr::primitive(PrimitiveKind::Str))),
//! ]);
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use strum::{Display, EnumIter, EnumString};

use crate::value::Value;

/// The fixed set of unparametrized scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum PrimitiveKind {
    #[strum(to_string = "int")]
    Int,
    #[strum(to_string = "float")]
    Float,
    #[strum(to_string = "decimal", serialize = "Decimal")]
    Decimal,
    #[strum(to_string = "str")]
    Str,
    #[strum(to_string = "bool")]
    Bool,
    #[strum(to_string = "date")]
    Date,
    #[strum(to_string = "time")]
    Time,
    #[strum(to_string = "datetime")]
    DateTime,
    #[strum(to_string = "None", serialize = "NoneType", serialize = "null")]
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: Value,
}

/// A closed enumeration. Editors display member names; extractors yield member values.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<EnumMember>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, members: Vec<EnumMember>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// Enum whose member names double as their values.
    pub fn from_names<I, S>(name: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members = names
            .into_iter()
            .map(|n| {
                let n = n.into();
                EnumMember {
                    value: Value::Str(n.clone()),
                    name: n,
                }
            })
            .collect();
        Self::new(name, members)
    }

    /// Index of the member whose value (or, failing that, name) matches `value`.
    pub fn position_of(&self, value: &Value) -> Option<usize> {
        self.members
            .iter()
            .position(|m| &m.value == value)
            .or_else(|| {
                let name = value.as_str()?;
                self.members.iter().position(|m| m.name == name)
            })
    }
}

/// A structured record: an ordered list of named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl RecordType {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One named field of a record (or the synthetic field a container builds its
/// children from).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub ty: TypeExpr,
    pub default: Option<Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub help: Option<String>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            min: None,
            max: None,
            help: None,
        }
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// The generic "origin" of a parametrized type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    List,
    Dict,
    Union,
    Optional,
    /// Any other generic (`set`, `tuple`, ...). Parses, never classifies.
    Other(String),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::List => f.write_str("list"),
            Origin::Dict => f.write_str("dict"),
            Origin::Union => f.write_str("Union"),
            Origin::Optional => f.write_str("Optional"),
            Origin::Other(name) => f.write_str(name),
        }
    }
}

/// A raw, not yet classified type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A bare name: a primitive (`int`, `None`), a reference into the
    /// namespace (`Person`), or something nobody knows how to edit (`list`).
    Named(String),
    Enum(Arc<EnumType>),
    Record(Arc<RecordType>),
    Literal(Vec<Value>),
    Apply { origin: Origin, args: Vec<TypeExpr> },
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeExpr::Named(kind.to_string())
    }

    pub fn null() -> Self {
        Self::primitive(PrimitiveKind::Null)
    }

    pub fn enumeration(ty: EnumType) -> Self {
        TypeExpr::Enum(Arc::new(ty))
    }

    pub fn record(ty: RecordType) -> Self {
        TypeExpr::Record(Arc::new(ty))
    }

    pub fn literal(values: Vec<Value>) -> Self {
        TypeExpr::Literal(values)
    }

    pub fn list(item: TypeExpr) -> Self {
        TypeExpr::Apply {
            origin: Origin::List,
            args: vec![item],
        }
    }

    pub fn dict(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Apply {
            origin: Origin::Dict,
            args: vec![key, value],
        }
    }

    pub fn union(branches: Vec<TypeExpr>) -> Self {
        TypeExpr::Apply {
            origin: Origin::Union,
            args: branches,
        }
    }

    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Apply {
            origin: Origin::Optional,
            args: vec![inner],
        }
    }

    /// The type's own name, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeExpr::Named(name) => Some(name),
            TypeExpr::Enum(ty) => Some(&ty.name),
            TypeExpr::Record(ty) => Some(&ty.name),
            TypeExpr::Literal(_) | TypeExpr::Apply { .. } => None,
        }
    }

    /// Label shown for a union branch: the name, else the annotation form.
    pub fn label(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => self.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TypeExpr::Named(n) if n.parse::<PrimitiveKind>() == Ok(PrimitiveKind::Null))
    }
}

fn literal_repr(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("'{}'", s.replace('\'', "\\'")),
        other => other.to_string(),
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::Enum(ty) => f.write_str(&ty.name),
            TypeExpr::Record(ty) => f.write_str(&ty.name),
            TypeExpr::Literal(values) => {
                let parts: Vec<String> = values.iter().map(literal_repr).collect();
                write!(f, "Literal[{}]", parts.join(", "))
            }
            TypeExpr::Apply { origin, args } => {
                let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{origin}[{}]", parts.join(", "))
            }
        }
    }
}

/// A named definition that `TypeExpr::Named` may refer to.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    Record(Arc<RecordType>),
    Enum(Arc<EnumType>),
}

/// Named records and enums, resolved on demand during dispatch.
#[derive(Debug, Clone, Default)]
pub struct TypeNamespace {
    defs: IndexMap<String, TypeDef>,
}

impl TypeNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_record(&mut self, ty: RecordType) -> Arc<RecordType> {
        let ty = Arc::new(ty);
        self.defs
            .insert(ty.name.clone(), TypeDef::Record(Arc::clone(&ty)));
        ty
    }

    pub fn define_enum(&mut self, ty: EnumType) -> Arc<EnumType> {
        let ty = Arc::new(ty);
        self.defs.insert(ty.name.clone(), TypeDef::Enum(Arc::clone(&ty)));
        ty
    }

    pub fn resolve(&self, name: &str) -> Option<&TypeDef> {
        self.defs.get(name)
    }

    pub fn record(&self, name: &str) -> Option<Arc<RecordType>> {
        match self.defs.get(name)? {
            TypeDef::Record(ty) => Some(Arc::clone(ty)),
            TypeDef::Enum(_) => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
