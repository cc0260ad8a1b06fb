pub mod popup;
pub mod rows;

use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};
use schema_form::MemoryToolkit;
use tui_input::Input;

use crate::tui::Frame;
use popup::{centered_rect_fixed, draw_popup_frame};
use rows::Row;

pub const KEY_HINTS: &str =
    "↑↓ move · Enter edit · ←→/Space change · Ins add · Del remove · Ctrl-S confirm · Esc cancel";

/// Cursor, open text input and last status message of the dialog.
#[derive(Debug, Default)]
pub struct ViewState {
    pub selected: usize,
    pub editing: Option<Input>,
    pub status: Option<String>,
}

impl ViewState {
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

pub fn draw(frame: &mut Frame<'_>, tk: &MemoryToolkit, title: &str, rows: &[Row], state: &ViewState) {
    let area = centered_rect_fixed(
        frame.area(),
        96,
        u16::try_from(rows.len() + 6).unwrap_or(u16::MAX),
    );
    let inner = draw_popup_frame(frame, area, title);
    let [list_area, status_area, hint_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let value = match (&state.editing, i == state.selected) {
                (Some(input), true) => Span::styled(
                    format!("{}▏", input.value()),
                    Style::default().fg(Color::Yellow),
                ),
                _ => Span::raw(row.value.clone()),
            };
            ListItem::new(Line::from(vec![
                Span::raw("  ".repeat(row.depth)),
                Span::styled(format!("{}: ", row.label), Style::default().fg(Color::Cyan)),
                value,
            ]))
        })
        .collect();
    let list = List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut list_state = ListState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(list, list_area, &mut list_state);

    let status = state
        .status
        .clone()
        .or_else(|| {
            rows.get(state.selected)
                .and_then(|row| tk.help(row.node))
                .map(str::to_string)
        })
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(status).style(Style::default().fg(Color::Red)),
        status_area,
    );
    frame.render_widget(
        Paragraph::new(KEY_HINTS).style(Style::default().fg(Color::DarkGray)),
        hint_area,
    );
}
