//! Rendering boundary.
//!
//! The core never touches a concrete widget library. Everything it needs from
//! one is this small capability contract:
//! - construct a primitive editor of some kind (with optional bounds),
//! - construct a container shell that hosts children and a fixed set of
//!   action triggers (add / remove / select),
//! - read (and, for defaults and selection, write) a primitive editor's value,
//! - reflect container state back (committed entries, active branch).
//!
//! User interaction reaches the core the other way round, as `UiEvent`s
//! produced by a `Session` (see `form.rs`).

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use strum::Display;

/// Opaque handle to one editor node owned by a toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Description of a primitive editor, including its initial state.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorSpec {
    Int { value: i64, min: i64, max: i64 },
    Float { value: f64, min: f64, max: f64 },
    Text { value: String },
    Toggle { checked: bool },
    Date { value: NaiveDate },
    Time { value: NaiveTime },
    DateTime { value: NaiveDateTime },
    /// A drop-down over display strings; reads back as `Scalar::Index`.
    Choice { options: Vec<String>, selected: usize },
    /// Holds nothing. Used for the `None` type.
    Blank,
}

/// Current state of a primitive editor as read through the toolkit.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Index(usize),
    Empty,
}

/// The kinds of container shells the core asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ShellKind {
    Record,
    List,
    Mapping,
    Union,
}

impl ShellKind {
    /// The triggers a shell of this kind exposes.
    pub fn accepts(self, action: &Action) -> bool {
        match (self, action) {
            (ShellKind::List | ShellKind::Mapping, Action::Add | Action::Remove(_)) => true,
            (ShellKind::Union, Action::Select(_)) => true,
            _ => false,
        }
    }
}

/// Position of a child inside its parent shell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    /// A named record field.
    Field(String),
    /// The reused item editor of a list.
    Staging,
    /// The reused key editor of a mapping.
    Key,
    /// The reused value editor of a mapping.
    Value,
    /// The branch selector of a union.
    Selector,
    /// One union branch, labelled for the selector.
    Branch(String),
}

/// A trigger fired on a container shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Action {
    /// Commit the staged entry of a list or mapping.
    Add,
    /// Drop the committed entry at the given position.
    Remove(usize),
    /// Activate the union branch at the given position.
    Select(usize),
}

/// The capability contract a concrete editor toolkit satisfies.
pub trait Toolkit {
    fn create_editor(&mut self, spec: EditorSpec) -> NodeId;

    fn create_shell(&mut self, kind: ShellKind) -> NodeId;

    /// Host `child` inside `parent`. Children are never reparented afterwards.
    fn attach(&mut self, parent: NodeId, child: NodeId, slot: Slot);

    /// Current value of a primitive editor; `None` for shells and unknown nodes.
    fn read(&self, node: NodeId) -> Option<Scalar>;

    /// Overwrite a primitive editor's value. Returns false when the value does
    /// not fit the editor (wrong kind, choice index out of range).
    fn write(&mut self, node: NodeId, value: Scalar) -> bool;

    /// Reflect the committed entries of a list or mapping shell.
    fn show_entries(&mut self, shell: NodeId, entries: &[String]);

    /// Reflect the active branch of a union shell.
    fn show_branch(&mut self, shell: NodeId, index: usize);

    /// Destroy a node and everything it hosts.
    fn destroy(&mut self, node: NodeId);

    /// Attach help text to a node. Toolkits without tooltips ignore it.
    fn describe(&mut self, _node: NodeId, _help: &str) {}
}
