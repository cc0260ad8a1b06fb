//! Tag -> builder table.
//!
//! The standard table is filled from one exhaustive `match` over `TypeTag`, so
//! adding a tag without a builder is a compile error rather than a runtime
//! "not implemented". Callers may still override or remove single entries;
//! a removed entry surfaces as `FormError::UnsupportedType` at dispatch.

use std::collections::HashMap;

use strum::IntoEnumIterator;

use crate::binding::Binding;
use crate::builders::{container, primitive};
use crate::classify::{TypeDescriptor, TypeTag};
use crate::dispatch::BuildContext;
use crate::error::Result;
use crate::schema::FieldSchema;

/// A construction strategy: field + classified type -> binding.
pub type BuilderFn = fn(&mut BuildContext<'_>, &FieldSchema, TypeDescriptor) -> Result<Binding>;

#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<TypeTag, BuilderFn>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        tags.sort();
        f.debug_struct("HandlerRegistry").field("tags", &tags).finish()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl HandlerRegistry {
    /// A registry with no handlers at all.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with the built-in builder for every tag.
    pub fn standard() -> Self {
        let handlers = TypeTag::iter().map(|tag| (tag, standard_builder(tag))).collect();
        Self { handlers }
    }

    /// Install (or replace) the builder for `tag`; returns the previous one.
    pub fn register(&mut self, tag: TypeTag, builder: BuilderFn) -> Option<BuilderFn> {
        self.handlers.insert(tag, builder)
    }

    pub fn unregister(&mut self, tag: TypeTag) -> Option<BuilderFn> {
        self.handlers.remove(&tag)
    }

    pub fn get(&self, tag: TypeTag) -> Option<BuilderFn> {
        self.handlers.get(&tag).copied()
    }

    pub fn contains(&self, tag: TypeTag) -> bool {
        self.handlers.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

fn standard_builder(tag: TypeTag) -> BuilderFn {
    match tag {
        TypeTag::Int => primitive::build_int,
        TypeTag::Float | TypeTag::Decimal => primitive::build_float,
        TypeTag::Str => primitive::build_str,
        TypeTag::Bool => primitive::build_bool,
        TypeTag::Date => primitive::build_date,
        TypeTag::Time => primitive::build_time,
        TypeTag::DateTime => primitive::build_datetime,
        TypeTag::Null => primitive::build_null,
        TypeTag::Enum => primitive::build_enum,
        TypeTag::Literal => primitive::build_literal,
        TypeTag::List => container::build_list,
        TypeTag::Mapping => container::build_mapping,
        TypeTag::Union => container::build_union,
        TypeTag::Record => container::build_record,
    }
}
