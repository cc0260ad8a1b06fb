#![allow(dead_code)]

use std::collections::VecDeque;

use schema_form::{MemoryToolkit, NodeId, Result, Session, Slot, UiEvent};

type Step = Box<dyn FnMut(&mut MemoryToolkit, NodeId) -> UiEvent>;

/// A session that replays a fixed list of steps and cancels once it runs dry.
#[derive(Default)]
pub struct Script {
    steps: VecDeque<Step>,
    pub seen: usize,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, f: impl FnMut(&mut MemoryToolkit, NodeId) -> UiEvent + 'static) -> Self {
        self.steps.push_back(Box::new(f));
        self
    }

    pub fn confirm(self) -> Self {
        self.step(|_, _| UiEvent::Confirm)
    }

    pub fn cancel(self) -> Self {
        self.step(|_, _| UiEvent::Cancel)
    }
}

impl Session<MemoryToolkit> for Script {
    fn next_event(&mut self, toolkit: &mut MemoryToolkit, root: NodeId) -> Result<UiEvent> {
        self.seen += 1;
        Ok(match self.steps.pop_front() {
            Some(mut step) => step(toolkit, root),
            None => UiEvent::Cancel,
        })
    }
}

/// Shell of the record field at `path`.
pub fn node(tk: &MemoryToolkit, root: NodeId, path: &[&str]) -> NodeId {
    tk.field_path(root, path)
        .unwrap_or_else(|| panic!("no field at {path:?}"))
}

pub fn child(tk: &MemoryToolkit, parent: NodeId, slot: Slot) -> NodeId {
    tk.find_child(parent, &slot)
        .unwrap_or_else(|| panic!("no {slot:?} under {parent}"))
}
