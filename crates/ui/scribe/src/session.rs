//! Terminal session: draws the editor tree and turns key presses into edits
//! and `UiEvent`s.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use schema_form::memory::EditorState;
use schema_form::{Action, MemoryToolkit, NodeId, Scalar, Session, ShellKind, Slot, Toolkit, UiEvent};
use tracing::debug;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::tui::Tui;
use crate::view::rows::{display, is_textual, rows, Row, RowKind};
use crate::view::{self, ViewState};

pub struct TerminalSession {
    tui: Tui,
    title: String,
    state: ViewState,
}

impl TerminalSession {
    pub fn new(title: impl Into<String>) -> Result<Self> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        Ok(Self {
            tui,
            title: title.into(),
            state: ViewState::default(),
        })
    }

    pub fn exit(&mut self) -> Result<()> {
        self.tui.exit()
    }
}

impl Session<MemoryToolkit> for TerminalSession {
    fn next_event(&mut self, toolkit: &mut MemoryToolkit, root: NodeId) -> schema_form::Result<UiEvent> {
        loop {
            let rows = rows(toolkit, root, &self.title);
            self.state.clamp(rows.len());
            self.tui
                .terminal
                .draw(|frame| view::draw(frame, toolkit, &self.title, &rows, &self.state))?;

            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(event) = handle_key(&mut self.state, toolkit, &rows, key) {
                debug!(?event, "ui event");
                return Ok(event);
            }
        }
    }
}

/// Apply one key press. Returns the event that ends this wait, if any.
pub fn handle_key(
    state: &mut ViewState,
    tk: &mut MemoryToolkit,
    rows: &[Row],
    key: KeyEvent,
) -> Option<UiEvent> {
    let row = rows.get(state.selected)?;

    if let Some(input) = state.editing.as_mut() {
        match key.code {
            KeyCode::Esc => state.editing = None,
            KeyCode::Enter => {
                let text = input.value().to_string();
                state.editing = None;
                let parsed = tk
                    .editor(row.node)
                    .ok_or_else(|| "not an editor".to_string())
                    .and_then(|editor| parse_input(editor, &text));
                state.status = match parsed {
                    Ok(value) if tk.write(row.node, value.clone()) => None,
                    Ok(_) => Some(format!("{}: value rejected", row.label)),
                    Err(e) => Some(format!("{}: {e}", row.label)),
                };
            }
            _ => {
                input.handle_event(&Event::Key(key));
            }
        }
        return None;
    }

    state.status = None;
    match key.code {
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(UiEvent::Confirm),
        KeyCode::Esc => Some(UiEvent::Cancel),
        KeyCode::Up | KeyCode::BackTab => {
            state.selected = state.selected.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Tab => {
            state.selected = (state.selected + 1).min(rows.len().saturating_sub(1));
            None
        }
        KeyCode::Enter => match tk.editor(row.node) {
            Some(editor) if row.kind == RowKind::Editor && is_textual(editor) => {
                let initial = match editor {
                    EditorState::Text(s) => s.clone(),
                    other => display(other),
                };
                state.editing = Some(Input::new(initial));
                None
            }
            _ => Some(UiEvent::Confirm),
        },
        KeyCode::Left => change(tk, row, -1),
        KeyCode::Right | KeyCode::Char(' ') => change(tk, row, 1),
        KeyCode::Insert => nearest_collection(tk, row.node).map(|shell| UiEvent::Trigger {
            node: shell,
            action: Action::Add,
        }),
        KeyCode::Delete => match row.kind {
            RowKind::Entry { shell, index } => Some(UiEvent::Trigger {
                node: shell,
                action: Action::Remove(index),
            }),
            _ => None,
        },
        _ => None,
    }
}

/// Toggle a checkbox or step a drop-down. Stepping a union selector becomes a
/// select trigger on the union so the core can switch branches.
fn change(tk: &mut MemoryToolkit, row: &Row, step: isize) -> Option<UiEvent> {
    if row.kind != RowKind::Editor {
        return None;
    }
    match tk.editor(row.node)? {
        EditorState::Toggle(checked) => {
            let flipped = !*checked;
            tk.write(row.node, Scalar::Bool(flipped));
            None
        }
        EditorState::Choice { options, selected } => {
            let len = options.len() as isize;
            if len == 0 {
                return None;
            }
            let next = (*selected as isize + step).rem_euclid(len) as usize;
            if tk.slot(row.node) == Some(&Slot::Selector) {
                let shell = tk.widget(row.node)?.parent?;
                return Some(UiEvent::Trigger {
                    node: shell,
                    action: Action::Select(next),
                });
            }
            tk.write(row.node, Scalar::Index(next));
            None
        }
        _ => None,
    }
}

/// The closest list or mapping shell at or above `node`.
fn nearest_collection(tk: &MemoryToolkit, node: NodeId) -> Option<NodeId> {
    let mut current = Some(node);
    while let Some(id) = current {
        let widget = tk.widget(id)?;
        if let schema_form::memory::WidgetKind::Shell {
            kind: ShellKind::List | ShellKind::Mapping,
            ..
        } = widget.kind
        {
            return Some(id);
        }
        current = widget.parent;
    }
    None
}

/// Parse what was typed into the scalar the editor expects.
pub fn parse_input(editor: &EditorState, text: &str) -> Result<Scalar, String> {
    let text_trimmed = text.trim();
    match editor {
        EditorState::Int { .. } => text_trimmed
            .parse()
            .map(Scalar::Int)
            .map_err(|_| format!("`{text_trimmed}` is not an integer")),
        EditorState::Float { .. } => text_trimmed
            .parse()
            .map(Scalar::Float)
            .map_err(|_| format!("`{text_trimmed}` is not a number")),
        EditorState::Text(_) => Ok(Scalar::Text(text.to_string())),
        EditorState::Date(_) => NaiveDate::parse_from_str(text_trimmed, "%Y-%m-%d")
            .map(Scalar::Date)
            .map_err(|_| format!("`{text_trimmed}` is not a date (YYYY-MM-DD)")),
        EditorState::Time(_) => NaiveTime::parse_from_str(text_trimmed, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(text_trimmed, "%H:%M"))
            .map(Scalar::Time)
            .map_err(|_| format!("`{text_trimmed}` is not a time (HH:MM[:SS])")),
        EditorState::DateTime(_) => NaiveDateTime::parse_from_str(text_trimmed, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(text_trimmed, "%Y-%m-%d %H:%M:%S"))
            .map(Scalar::DateTime)
            .map_err(|_| format!("`{text_trimmed}` is not a date-time (YYYY-MM-DDTHH:MM:SS)")),
        EditorState::Toggle(_) | EditorState::Choice { .. } | EditorState::Blank => {
            Err("not editable as text".to_string())
        }
    }
}
