//! Bindings: an editor node paired with the way to read a value back out of it.
//!
//! A `Binding` owns the handle of its editor node plus the bindings of every
//! child it hosts. Extraction is a read-only walk over that tree:
//! - each parent visits its live children exactly once, in construction order,
//! - and assembles the results for its container kind (sequence, mapping,
//!   selected branch, named record).
//!
//! Nothing here mutates toolkit state while extracting, so calling `extract`
//! twice without interaction in between yields equal values.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::builders::primitive::{epoch_date, midnight};
use crate::entries::{ListEntries, MapEntries};
use crate::error::EntryWarning;
use crate::schema::{EnumType, PrimitiveKind};
use crate::toolkit::{Action, NodeId, Scalar, Toolkit};
use crate::value::Value;

/// How a scalar editor's raw state is coerced into the declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarReader {
    Primitive(PrimitiveKind),
    /// Selected index -> member value.
    Enum(Arc<EnumType>),
    /// Selected index -> original literal, keyed by its display string.
    Literal(IndexMap<String, Value>),
}

impl ScalarReader {
    fn read(&self, raw: Option<Scalar>) -> Value {
        match self {
            ScalarReader::Primitive(kind) => coerce(*kind, raw),
            ScalarReader::Enum(ty) => match raw {
                Some(Scalar::Index(i)) => ty
                    .members
                    .get(i)
                    .map(|m| m.value.clone())
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            },
            ScalarReader::Literal(by_display) => match raw {
                Some(Scalar::Index(i)) => by_display
                    .get_index(i)
                    .map(|(_, v)| v.clone())
                    .unwrap_or(Value::Null),
                _ => Value::Null,
            },
        }
    }
}

/// Coerce raw editor state to the declared primitive; untouched or mismatched
/// editors fall back to the kind's zero value.
fn coerce(kind: PrimitiveKind, raw: Option<Scalar>) -> Value {
    match (kind, raw) {
        (PrimitiveKind::Int, Some(Scalar::Int(i))) => Value::Int(i),
        (PrimitiveKind::Int, Some(Scalar::Float(f))) => Value::Int(f as i64),
        (PrimitiveKind::Int, _) => Value::Int(0),
        (PrimitiveKind::Float | PrimitiveKind::Decimal, Some(Scalar::Float(f))) => Value::Float(f),
        (PrimitiveKind::Float | PrimitiveKind::Decimal, Some(Scalar::Int(i))) => {
            Value::Float(i as f64)
        }
        (PrimitiveKind::Float | PrimitiveKind::Decimal, _) => Value::Float(0.0),
        (PrimitiveKind::Str, Some(Scalar::Text(s))) => Value::Str(s),
        (PrimitiveKind::Str, _) => Value::Str(String::new()),
        (PrimitiveKind::Bool, Some(Scalar::Bool(b))) => Value::Bool(b),
        (PrimitiveKind::Bool, _) => Value::Bool(false),
        (PrimitiveKind::Date, Some(Scalar::Date(d))) => Value::Date(d),
        (PrimitiveKind::Date, _) => Value::Date(epoch_date()),
        (PrimitiveKind::Time, Some(Scalar::Time(t))) => Value::Time(t),
        (PrimitiveKind::Time, _) => Value::Time(midnight()),
        (PrimitiveKind::DateTime, Some(Scalar::DateTime(dt))) => Value::DateTime(dt),
        (PrimitiveKind::DateTime, _) => Value::DateTime(epoch_date().and_time(midnight())),
        (PrimitiveKind::Null, _) => Value::Null,
    }
}

/// A user-supplied extractor for bindings built by custom handlers.
pub type CustomExtractor = Box<dyn Fn(&dyn Toolkit) -> Value>;

pub enum BindingKind {
    Scalar(ScalarReader),
    List {
        staging: Box<Binding>,
        entries: ListEntries,
    },
    Mapping {
        key: Box<Binding>,
        value: Box<Binding>,
        entries: MapEntries,
    },
    Union {
        selector: NodeId,
        branches: Vec<Binding>,
    },
    Record {
        fields: Vec<(String, Binding)>,
    },
    Custom(CustomExtractor),
}

impl fmt::Debug for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Scalar(reader) => f.debug_tuple("Scalar").field(reader).finish(),
            BindingKind::List { staging, entries } => f
                .debug_struct("List")
                .field("staging", staging)
                .field("entries", entries)
                .finish(),
            BindingKind::Mapping {
                key,
                value,
                entries,
            } => f
                .debug_struct("Mapping")
                .field("key", key)
                .field("value", value)
                .field("entries", entries)
                .finish(),
            BindingKind::Union { selector, branches } => f
                .debug_struct("Union")
                .field("selector", selector)
                .field("branches", branches)
                .finish(),
            BindingKind::Record { fields } => {
                f.debug_struct("Record").field("fields", fields).finish()
            }
            BindingKind::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// What happened to a trigger routed into the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Applied,
    /// Recoverable refusal; the form is unchanged.
    Rejected(EntryWarning),
    /// The action does not apply to this node (or its index is out of range).
    Ignored,
}

#[derive(Debug)]
pub struct Binding {
    node: NodeId,
    kind: BindingKind,
}

impl Binding {
    pub fn new(node: NodeId, kind: BindingKind) -> Self {
        Self { node, kind }
    }

    pub fn custom(node: NodeId, extract: impl Fn(&dyn Toolkit) -> Value + 'static) -> Self {
        Self::new(node, BindingKind::Custom(Box::new(extract)))
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> &BindingKind {
        &self.kind
    }

    /// Read the current value out of the live editor state.
    pub fn extract(&self, tk: &dyn Toolkit) -> Value {
        match &self.kind {
            BindingKind::Scalar(reader) => reader.read(tk.read(self.node)),
            BindingKind::List { entries, .. } => Value::List(entries.committed().to_vec()),
            BindingKind::Mapping { entries, .. } => Value::Map(entries.committed().clone()),
            BindingKind::Union { selector, branches } => {
                let index = match tk.read(*selector) {
                    Some(Scalar::Index(i)) => i,
                    _ => 0,
                };
                branches
                    .get(index)
                    .map(|b| b.extract(tk))
                    .unwrap_or(Value::Null)
            }
            BindingKind::Record { fields } => Value::Record(
                fields
                    .iter()
                    .map(|(name, child)| (name.clone(), child.extract(tk)))
                    .collect(),
            ),
            BindingKind::Custom(extract) => extract(tk),
        }
    }

    /// Destroy this binding's editor subtree. Consumes the binding so it can
    /// never be extracted from afterwards.
    pub fn dispose(self, tk: &mut dyn Toolkit) {
        // Children of a not-yet-attached parent must be destroyed one by one.
        for child in self.children() {
            tk.destroy(child);
        }
        tk.destroy(self.node);
    }

    fn children(&self) -> Vec<NodeId> {
        match &self.kind {
            BindingKind::Scalar(_) | BindingKind::Custom(_) => Vec::new(),
            BindingKind::List { staging, .. } => vec![staging.node],
            BindingKind::Mapping { key, value, .. } => vec![key.node, value.node],
            BindingKind::Union { selector, branches } => std::iter::once(*selector)
                .chain(branches.iter().map(|b| b.node))
                .collect(),
            BindingKind::Record { fields } => fields.iter().map(|(_, b)| b.node).collect(),
        }
    }

    /// Locate the binding that owns `node`.
    pub fn find_mut(&mut self, node: NodeId) -> Option<&mut Binding> {
        if self.node == node {
            return Some(self);
        }
        match &mut self.kind {
            BindingKind::Scalar(_) | BindingKind::Custom(_) => None,
            BindingKind::List { staging, .. } => staging.find_mut(node),
            BindingKind::Mapping { key, value, .. } => {
                if key.contains(node) {
                    key.find_mut(node)
                } else {
                    value.find_mut(node)
                }
            }
            BindingKind::Union { branches, .. } => {
                branches.iter_mut().find_map(|b| b.find_mut(node))
            }
            BindingKind::Record { fields } => {
                fields.iter_mut().find_map(|(_, b)| b.find_mut(node))
            }
        }
    }

    fn contains(&self, node: NodeId) -> bool {
        if self.node == node {
            return true;
        }
        match &self.kind {
            BindingKind::Scalar(_) | BindingKind::Custom(_) => false,
            BindingKind::List { staging, .. } => staging.contains(node),
            BindingKind::Mapping { key, value, .. } => key.contains(node) || value.contains(node),
            BindingKind::Union { selector, branches } => {
                *selector == node || branches.iter().any(|b| b.contains(node))
            }
            BindingKind::Record { fields } => fields.iter().any(|(_, b)| b.contains(node)),
        }
    }

    /// Apply a trigger fired on this binding's shell.
    ///
    /// `Add` reads the staging editor(s) as they are right now and commits the
    /// result. The staging editors are reused and are *not* reset afterwards:
    /// pressing add twice commits the same value twice.
    pub fn trigger(&mut self, action: Action, tk: &mut dyn Toolkit) -> TriggerOutcome {
        let node = self.node;
        match (&mut self.kind, action) {
            (BindingKind::List { staging, entries }, Action::Add) => {
                entries.stage(staging.extract(tk));
                if entries.commit().is_none() {
                    return TriggerOutcome::Ignored;
                }
                tk.show_entries(node, &entries.display());
                debug!(node = %node, len = entries.committed().len(), "list entry added");
                TriggerOutcome::Applied
            }
            (BindingKind::List { entries, .. }, Action::Remove(index)) => {
                if entries.remove_at(index).is_none() {
                    return TriggerOutcome::Ignored;
                }
                tk.show_entries(node, &entries.display());
                TriggerOutcome::Applied
            }
            (
                BindingKind::Mapping {
                    key,
                    value,
                    entries,
                },
                Action::Add,
            ) => {
                entries.stage(key.extract(tk), value.extract(tk));
                match entries.commit() {
                    Ok(Some(_)) => {
                        tk.show_entries(node, &entries.display());
                        TriggerOutcome::Applied
                    }
                    Ok(None) => TriggerOutcome::Ignored,
                    Err(warning) => {
                        warn!(node = %node, "{warning}");
                        TriggerOutcome::Rejected(warning)
                    }
                }
            }
            (BindingKind::Mapping { entries, .. }, Action::Remove(index)) => {
                if entries.remove_at(index).is_none() {
                    return TriggerOutcome::Ignored;
                }
                tk.show_entries(node, &entries.display());
                TriggerOutcome::Applied
            }
            (BindingKind::Union { selector, branches }, Action::Select(index)) => {
                if index >= branches.len() || !tk.write(*selector, Scalar::Index(index)) {
                    return TriggerOutcome::Ignored;
                }
                tk.show_branch(node, index);
                TriggerOutcome::Applied
            }
            _ => TriggerOutcome::Ignored,
        }
    }
}
