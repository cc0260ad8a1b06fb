//! Flatten the editor tree into the lines the dialog shows.

use schema_form::memory::{EditorState, WidgetKind};
use schema_form::{MemoryToolkit, NodeId, ShellKind, Slot};

#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    Editor,
    Shell(ShellKind),
    /// A committed list / mapping entry, removable by position.
    Entry { shell: NodeId, index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub node: NodeId,
    pub depth: usize,
    pub label: String,
    pub value: String,
    pub kind: RowKind,
}

/// All visible rows below `root`, depth first. Only the active branch of a
/// union is listed.
pub fn rows(tk: &MemoryToolkit, root: NodeId, title: &str) -> Vec<Row> {
    let mut out = Vec::new();
    visit(tk, root, 0, title.to_string(), &mut out);
    out
}

fn visit(tk: &MemoryToolkit, node: NodeId, depth: usize, label: String, out: &mut Vec<Row>) {
    let Some(widget) = tk.widget(node) else {
        return;
    };
    match &widget.kind {
        WidgetKind::Editor(state) => out.push(Row {
            node,
            depth,
            label,
            value: display(state),
            kind: RowKind::Editor,
        }),
        WidgetKind::Shell {
            kind,
            entries,
            active_branch,
        } => {
            let value = match kind {
                ShellKind::List | ShellKind::Mapping => match entries.len() {
                    1 => "1 entry".to_string(),
                    n => format!("{n} entries"),
                },
                ShellKind::Record | ShellKind::Union => String::new(),
            };
            out.push(Row {
                node,
                depth,
                label,
                value,
                kind: RowKind::Shell(*kind),
            });

            let mut branch = 0;
            for &child in &widget.children {
                let Some(slot) = tk.slot(child) else {
                    continue;
                };
                if let Slot::Branch(_) = slot {
                    branch += 1;
                    if branch - 1 != *active_branch {
                        continue;
                    }
                }
                visit(tk, child, depth + 1, slot_label(slot), out);
            }

            for (index, entry) in entries.iter().enumerate() {
                out.push(Row {
                    node,
                    depth: depth + 1,
                    label: format!("#{index}"),
                    value: entry.clone(),
                    kind: RowKind::Entry { shell: node, index },
                });
            }
        }
    }
}

fn slot_label(slot: &Slot) -> String {
    match slot {
        Slot::Field(name) => name.clone(),
        Slot::Staging => "item".to_string(),
        Slot::Key => "key".to_string(),
        Slot::Value => "value".to_string(),
        Slot::Selector => "type".to_string(),
        Slot::Branch(label) => label.clone(),
    }
}

/// How an editor's current value is shown.
pub fn display(state: &EditorState) -> String {
    match state {
        EditorState::Int { value, .. } => value.to_string(),
        EditorState::Float { value, .. } => value.to_string(),
        EditorState::Text(s) => s.clone(),
        EditorState::Toggle(true) => "[x]".to_string(),
        EditorState::Toggle(false) => "[ ]".to_string(),
        EditorState::Date(d) => d.format("%Y-%m-%d").to_string(),
        EditorState::Time(t) => t.format("%H:%M:%S").to_string(),
        EditorState::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        EditorState::Choice { options, selected } => options
            .get(*selected)
            .map(|o| format!("< {o} >"))
            .unwrap_or_default(),
        EditorState::Blank => "None".to_string(),
    }
}

/// Whether Enter opens a text input for this editor.
pub fn is_textual(state: &EditorState) -> bool {
    matches!(
        state,
        EditorState::Int { .. }
            | EditorState::Float { .. }
            | EditorState::Text(_)
            | EditorState::Date(_)
            | EditorState::Time(_)
            | EditorState::DateTime(_)
    )
}
