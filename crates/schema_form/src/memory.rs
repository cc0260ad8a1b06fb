//! Headless, arena-backed toolkit.
//!
//! `MemoryToolkit` keeps the whole editor tree in memory and implements the
//! `Toolkit` contract without any rendering. Tests use it to drive forms
//! directly, and the terminal front-end renders it.
//!
//! Write semantics follow what a spin box / combo box would do:
//! - numeric writes are clamped into the editor's bounds,
//! - an int written to a float editor widens,
//! - choice indices past the last option and kind mismatches are rejected.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::toolkit::{EditorSpec, NodeId, Scalar, ShellKind, Slot, Toolkit};

/// State of a single primitive editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    Int { value: i64, min: i64, max: i64 },
    Float { value: f64, min: f64, max: f64 },
    Text(String),
    Toggle(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Choice { options: Vec<String>, selected: usize },
    Blank,
}

impl From<EditorSpec> for EditorState {
    fn from(spec: EditorSpec) -> Self {
        match spec {
            EditorSpec::Int { value, min, max } => EditorState::Int {
                value: value.clamp(min, max.max(min)),
                min,
                max: max.max(min),
            },
            EditorSpec::Float { value, min, max } => EditorState::Float {
                value: value.clamp(min, max.max(min)),
                min,
                max: max.max(min),
            },
            EditorSpec::Text { value } => EditorState::Text(value),
            EditorSpec::Toggle { checked } => EditorState::Toggle(checked),
            EditorSpec::Date { value } => EditorState::Date(value),
            EditorSpec::Time { value } => EditorState::Time(value),
            EditorSpec::DateTime { value } => EditorState::DateTime(value),
            EditorSpec::Choice { options, selected } => {
                let selected = selected.min(options.len().saturating_sub(1));
                EditorState::Choice { options, selected }
            }
            EditorSpec::Blank => EditorState::Blank,
        }
    }
}

impl EditorState {
    fn read(&self) -> Scalar {
        match self {
            EditorState::Int { value, .. } => Scalar::Int(*value),
            EditorState::Float { value, .. } => Scalar::Float(*value),
            EditorState::Text(s) => Scalar::Text(s.clone()),
            EditorState::Toggle(b) => Scalar::Bool(*b),
            EditorState::Date(d) => Scalar::Date(*d),
            EditorState::Time(t) => Scalar::Time(*t),
            EditorState::DateTime(dt) => Scalar::DateTime(*dt),
            EditorState::Choice { selected, .. } => Scalar::Index(*selected),
            EditorState::Blank => Scalar::Empty,
        }
    }

    fn write(&mut self, value: Scalar) -> bool {
        match (self, value) {
            (EditorState::Int { value, min, max }, Scalar::Int(v)) => {
                *value = v.clamp(*min, *max);
            }
            (EditorState::Float { value, min, max }, Scalar::Float(v)) => {
                if v.is_nan() {
                    return false;
                }
                *value = v.clamp(*min, *max);
            }
            (EditorState::Float { value, min, max }, Scalar::Int(v)) => {
                *value = (v as f64).clamp(*min, *max);
            }
            (EditorState::Text(s), Scalar::Text(v)) => *s = v,
            (EditorState::Toggle(b), Scalar::Bool(v)) => *b = v,
            (EditorState::Date(d), Scalar::Date(v)) => *d = v,
            (EditorState::Time(t), Scalar::Time(v)) => *t = v,
            (EditorState::DateTime(dt), Scalar::DateTime(v)) => *dt = v,
            (EditorState::Choice { options, selected }, Scalar::Index(i)) => {
                if i >= options.len() {
                    return false;
                }
                *selected = i;
            }
            (EditorState::Blank, Scalar::Empty) => {}
            _ => return false,
        }
        true
    }
}

/// Either an editor or a container shell.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    Editor(EditorState),
    Shell {
        kind: ShellKind,
        entries: Vec<String>,
        active_branch: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Widget {
    pub kind: WidgetKind,
    pub parent: Option<NodeId>,
    pub slot: Option<Slot>,
    pub children: Vec<NodeId>,
    pub help: Option<String>,
}

#[derive(Debug, Default)]
pub struct MemoryToolkit {
    nodes: Vec<Option<Widget>>,
}

impl MemoryToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently alive.
    pub fn live_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn widget(&self, node: NodeId) -> Option<&Widget> {
        self.nodes.get(node.0 as usize)?.as_ref()
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.widget(node).map(|w| w.children.as_slice()).unwrap_or(&[])
    }

    pub fn slot(&self, node: NodeId) -> Option<&Slot> {
        self.widget(node)?.slot.as_ref()
    }

    pub fn editor(&self, node: NodeId) -> Option<&EditorState> {
        match &self.widget(node)?.kind {
            WidgetKind::Editor(state) => Some(state),
            WidgetKind::Shell { .. } => None,
        }
    }

    pub fn entries(&self, node: NodeId) -> &[String] {
        match self.widget(node).map(|w| &w.kind) {
            Some(WidgetKind::Shell { entries, .. }) => entries,
            _ => &[],
        }
    }

    pub fn active_branch(&self, node: NodeId) -> Option<usize> {
        match self.widget(node).map(|w| &w.kind) {
            Some(WidgetKind::Shell {
                kind: ShellKind::Union,
                active_branch,
                ..
            }) => Some(*active_branch),
            _ => None,
        }
    }

    pub fn help(&self, node: NodeId) -> Option<&str> {
        self.widget(node)?.help.as_deref()
    }

    /// First child of `parent` sitting in `slot`.
    pub fn find_child(&self, parent: NodeId, slot: &Slot) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.slot(*c) == Some(slot))
    }

    /// Follow a path of record field names from `root`.
    pub fn field_path(&self, root: NodeId, path: &[&str]) -> Option<NodeId> {
        path.iter().try_fold(root, |node, name| {
            self.find_child(node, &Slot::Field((*name).to_string()))
        })
    }

    fn widget_mut(&mut self, node: NodeId) -> Option<&mut Widget> {
        self.nodes.get_mut(node.0 as usize)?.as_mut()
    }

    fn insert(&mut self, kind: WidgetKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Widget {
            kind,
            parent: None,
            slot: None,
            children: Vec::new(),
            help: None,
        }));
        id
    }
}

impl Toolkit for MemoryToolkit {
    fn create_editor(&mut self, spec: EditorSpec) -> NodeId {
        self.insert(WidgetKind::Editor(spec.into()))
    }

    fn create_shell(&mut self, kind: ShellKind) -> NodeId {
        self.insert(WidgetKind::Shell {
            kind,
            entries: Vec::new(),
            active_branch: 0,
        })
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, slot: Slot) {
        if self.widget(parent).is_none() {
            return;
        }
        let Some(widget) = self.widget_mut(child) else {
            return;
        };
        if widget.parent.is_some() {
            return;
        }
        widget.parent = Some(parent);
        widget.slot = Some(slot);
        if let Some(p) = self.widget_mut(parent) {
            p.children.push(child);
        }
    }

    fn read(&self, node: NodeId) -> Option<Scalar> {
        self.editor(node).map(EditorState::read)
    }

    fn write(&mut self, node: NodeId, value: Scalar) -> bool {
        match self.widget_mut(node).map(|w| &mut w.kind) {
            Some(WidgetKind::Editor(state)) => state.write(value),
            _ => false,
        }
    }

    fn show_entries(&mut self, shell: NodeId, shown: &[String]) {
        if let Some(WidgetKind::Shell { entries, .. }) = self.widget_mut(shell).map(|w| &mut w.kind)
        {
            *entries = shown.to_vec();
        }
    }

    fn show_branch(&mut self, shell: NodeId, index: usize) {
        if let Some(WidgetKind::Shell { active_branch, .. }) =
            self.widget_mut(shell).map(|w| &mut w.kind)
        {
            *active_branch = index;
        }
    }

    fn destroy(&mut self, node: NodeId) {
        let Some(widget) = self.nodes.get_mut(node.0 as usize).and_then(Option::take) else {
            return;
        };
        if let Some(parent) = widget.parent.and_then(|p| self.widget_mut(p)) {
            parent.children.retain(|c| *c != node);
        }
        for child in widget.children {
            // Detach first so the recursive call does not touch our (gone) entry.
            if let Some(w) = self.widget_mut(child) {
                w.parent = None;
            }
            self.destroy(child);
        }
    }

    fn describe(&mut self, node: NodeId, help: &str) {
        if let Some(widget) = self.widget_mut(node) {
            widget.help = Some(help.to_string());
        }
    }
}
