//! Schema-driven input forms.
//!
//! Given a structured schema (records of typed fields), build a tree of
//! interactive editors, one per field and recursively for nested and container
//! types, and on confirmation read the user's input back out as a structured
//! `Value` of the same shape.
//!
//! The pieces, bottom-up:
//! - `schema` / `annotation` / `document`: the raw type model and two ways to
//!   produce it (Rust builders, annotation strings in a JSON document)
//! - `classify`: raw `TypeExpr` -> closed `TypeDescriptor` + `TypeTag`
//! - `registry`: `TypeTag` -> builder function
//! - `dispatch`: classify + look up + build, with recursion guards
//! - `builders`: the primitive and container construction strategies
//! - `binding`: editor node + how to extract its value; container triggers
//! - `entries`: the list / mapping state machines behind those triggers
//! - `form`: the session loop that ends in confirm (values) or cancel (empty)
//!
//! Rendering is behind the `Toolkit` trait. `MemoryToolkit` is a headless
//! implementation.
//!
//! ```ignore
//! use schema_form::*;
//!
//! let mut ns = TypeNamespace::new();
//! ns.define_record(RecordType::new("Person", vec![
//!     FieldSchema::new("name", "str".parse()?),
//!     FieldSchema::new("tags", "list[str]".parse()?),
//! ]));
//! let values = input(ns, "Person", MemoryToolkit::new(), &mut my_session)?;
//! ```

pub mod annotation;
pub mod binding;
pub mod builders;
pub mod classify;
pub mod dispatch;
pub mod document;
pub mod entries;
pub mod error;
pub mod form;
pub mod memory;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod toolkit;
pub mod value;

use indexmap::IndexMap;

pub use binding::{Binding, BindingKind, ScalarReader, TriggerOutcome};
pub use classify::{classify, TypeDescriptor, TypeTag};
pub use dispatch::{BuildContext, Dispatcher};
pub use document::SchemaDocument;
pub use entries::{ListEntries, MapEntries, Phase};
pub use error::{EntryWarning, FormError, Result};
pub use form::{drive, Form, FormDriver, Outcome, Session, UiEvent};
pub use memory::MemoryToolkit;
pub use registry::{BuilderFn, HandlerRegistry};
pub use schema::{
    EnumMember, EnumType, FieldSchema, Origin, PrimitiveKind, RecordType, TypeDef, TypeExpr,
    TypeNamespace,
};
pub use settings::FormSettings;
pub use toolkit::{Action, EditorSpec, NodeId, Scalar, ShellKind, Slot, Toolkit};
pub use value::Value;

/// Run one form for the record `root` with default settings.
///
/// Returns the field values on confirm and an empty mapping on cancel.
pub fn input<T, S>(
    namespace: TypeNamespace,
    root: &str,
    toolkit: T,
    session: &mut S,
) -> Result<IndexMap<String, Value>>
where
    T: Toolkit,
    S: Session<T>,
{
    let driver = FormDriver::new(Dispatcher::new(namespace));
    Ok(driver.run(toolkit, root, session)?.into_values())
}
