//! Type classification: raw `TypeExpr` -> closed `TypeDescriptor`.
//!
//! Resolution order (first match wins, nothing is retried afterwards):
//! 1. unparametrized primitive name (`int`, `float`, `decimal`, `str`, `bool`,
//!    `date`, `time`, `datetime`, `None`)
//! 2. enumeration
//! 3. record (named sub-fields; the fields themselves stay unresolved)
//! 4. literal value set
//! 5. `list[T]`
//! 6. `dict[K, V]`
//! 7. `Union[...]` / `Optional[T]` (optional is `Union[T, None]`)
//!
//! Anything else is unsupported. Named references are looked up in the
//! namespace here, i.e. only when the node is actually dispatched.

use std::sync::Arc;

use strum::{Display, EnumIter};

use crate::schema::{EnumType, Origin, PrimitiveKind, RecordType, TypeDef, TypeExpr, TypeNamespace};
use crate::value::Value;

/// Fieldless key into the handler registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum TypeTag {
    Int,
    Float,
    Decimal,
    Str,
    Bool,
    Date,
    Time,
    DateTime,
    Null,
    Enum,
    Literal,
    List,
    Mapping,
    Union,
    Record,
}

impl From<PrimitiveKind> for TypeTag {
    fn from(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Int => TypeTag::Int,
            PrimitiveKind::Float => TypeTag::Float,
            PrimitiveKind::Decimal => TypeTag::Decimal,
            PrimitiveKind::Str => TypeTag::Str,
            PrimitiveKind::Bool => TypeTag::Bool,
            PrimitiveKind::Date => TypeTag::Date,
            PrimitiveKind::Time => TypeTag::Time,
            PrimitiveKind::DateTime => TypeTag::DateTime,
            PrimitiveKind::Null => TypeTag::Null,
        }
    }
}

/// A classified type with its tag-specific payload. Child types stay raw.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    Enum(Arc<EnumType>),
    Literal(Vec<Value>),
    List(TypeExpr),
    Mapping(TypeExpr, TypeExpr),
    Union(Vec<TypeExpr>),
    Record(Arc<RecordType>),
}

impl TypeDescriptor {
    pub fn tag(&self) -> TypeTag {
        match self {
            TypeDescriptor::Primitive(kind) => (*kind).into(),
            TypeDescriptor::Enum(_) => TypeTag::Enum,
            TypeDescriptor::Literal(_) => TypeTag::Literal,
            TypeDescriptor::List(_) => TypeTag::List,
            TypeDescriptor::Mapping(..) => TypeTag::Mapping,
            TypeDescriptor::Union(_) => TypeTag::Union,
            TypeDescriptor::Record(_) => TypeTag::Record,
        }
    }

    /// Shallow check whether `value` has the shape this type produces. Used to
    /// route a union default to a branch.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeDescriptor::Primitive(kind), v) => match kind {
                PrimitiveKind::Int => matches!(v, Value::Int(_)),
                PrimitiveKind::Float | PrimitiveKind::Decimal => {
                    matches!(v, Value::Float(_) | Value::Int(_))
                }
                PrimitiveKind::Str => matches!(v, Value::Str(_)),
                PrimitiveKind::Bool => matches!(v, Value::Bool(_)),
                PrimitiveKind::Date => matches!(v, Value::Date(_)),
                PrimitiveKind::Time => matches!(v, Value::Time(_)),
                PrimitiveKind::DateTime => matches!(v, Value::DateTime(_)),
                PrimitiveKind::Null => matches!(v, Value::Null),
            },
            (TypeDescriptor::Enum(ty), v) => ty.position_of(v).is_some(),
            (TypeDescriptor::Literal(values), v) => values.contains(v),
            (TypeDescriptor::List(_), Value::List(_)) => true,
            (TypeDescriptor::Mapping(..), Value::Map(_) | Value::Record(_)) => true,
            (TypeDescriptor::Union(_), _) => true,
            (TypeDescriptor::Record(_), Value::Record(_)) => true,
            _ => false,
        }
    }
}

/// Classify one raw type expression. `None` means unsupported.
pub fn classify(expr: &TypeExpr, namespace: &TypeNamespace) -> Option<TypeDescriptor> {
    match expr {
        TypeExpr::Named(name) => {
            if let Ok(kind) = name.parse::<PrimitiveKind>() {
                return Some(TypeDescriptor::Primitive(kind));
            }
            match namespace.resolve(name)? {
                TypeDef::Enum(ty) => classify_enum(ty),
                TypeDef::Record(ty) => Some(TypeDescriptor::Record(Arc::clone(ty))),
            }
        }
        TypeExpr::Enum(ty) => classify_enum(ty),
        TypeExpr::Record(ty) => Some(TypeDescriptor::Record(Arc::clone(ty))),
        TypeExpr::Literal(values) if !values.is_empty() => {
            Some(TypeDescriptor::Literal(values.clone()))
        }
        TypeExpr::Literal(_) => None,
        TypeExpr::Apply { origin, args } => match (origin, args.as_slice()) {
            (Origin::List, [item]) => Some(TypeDescriptor::List(item.clone())),
            (Origin::Dict, [key, value]) => {
                Some(TypeDescriptor::Mapping(key.clone(), value.clone()))
            }
            (Origin::Union, branches) if !branches.is_empty() => {
                Some(TypeDescriptor::Union(flatten_union(branches)))
            }
            (Origin::Optional, [inner]) => Some(TypeDescriptor::Union(flatten_union(&[
                inner.clone(),
                TypeExpr::null(),
            ]))),
            _ => None,
        },
    }
}

fn classify_enum(ty: &Arc<EnumType>) -> Option<TypeDescriptor> {
    (!ty.members.is_empty()).then(|| TypeDescriptor::Enum(Arc::clone(ty)))
}

/// Inline nested unions/optionals and drop repeated branches, keeping first
/// occurrence order.
fn flatten_union(branches: &[TypeExpr]) -> Vec<TypeExpr> {
    let mut out: Vec<TypeExpr> = Vec::new();
    for branch in branches {
        let nested: Vec<TypeExpr> = match branch {
            TypeExpr::Apply {
                origin: Origin::Union,
                args,
            } if !args.is_empty() => flatten_union(args),
            TypeExpr::Apply {
                origin: Origin::Optional,
                args,
            } if args.len() == 1 => flatten_union(&[args[0].clone(), TypeExpr::null()]),
            other => vec![other.clone()],
        };
        for ty in nested {
            let duplicate = out
                .iter()
                .any(|seen| seen == &ty || (seen.is_null() && ty.is_null()));
            if !duplicate {
                out.push(ty);
            }
        }
    }
    out
}
