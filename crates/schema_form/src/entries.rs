//! Entry state machines for the repeatable containers.
//!
//! Both containers move through the same three phases:
//!
//! ```text
//!   Empty --stage--> Staged --commit--> Committed(n) --stage--> Staged ...
//!                                            |
//!                                        remove_at
//! ```
//!
//! `stage` records the candidate read from the staging editors, `commit`
//! appends it (mappings may refuse), `remove_at` drops one committed entry with
//! a contiguous shift of everything after it. None of this knows about a
//! toolkit; the bindings feed values in and mirror the result out.

use indexmap::IndexMap;

use crate::error::EntryWarning;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Staged,
    Committed(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListEntries {
    staged: Option<Value>,
    committed: Vec<Value>,
}

impl ListEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed committed entries (list defaults).
    pub fn with_committed(committed: Vec<Value>) -> Self {
        Self {
            staged: None,
            committed,
        }
    }

    pub fn phase(&self) -> Phase {
        match (&self.staged, self.committed.len()) {
            (Some(_), _) => Phase::Staged,
            (None, 0) => Phase::Empty,
            (None, n) => Phase::Committed(n),
        }
    }

    pub fn stage(&mut self, value: Value) {
        self.staged = Some(value);
    }

    /// Append the staged value. Returns its index, or `None` if nothing was staged.
    pub fn commit(&mut self) -> Option<usize> {
        let value = self.staged.take()?;
        self.committed.push(value);
        Some(self.committed.len() - 1)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Value> {
        (index < self.committed.len()).then(|| self.committed.remove(index))
    }

    pub fn committed(&self) -> &[Value] {
        &self.committed
    }

    pub fn display(&self) -> Vec<String> {
        self.committed.iter().map(Value::render).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapEntries {
    staged: Option<(Value, Value)>,
    committed: IndexMap<Value, Value>,
}

impl MapEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        match (&self.staged, self.committed.len()) {
            (Some(_), _) => Phase::Staged,
            (None, 0) => Phase::Empty,
            (None, n) => Phase::Committed(n),
        }
    }

    pub fn stage(&mut self, key: Value, value: Value) {
        self.staged = Some((key, value));
    }

    /// Accept the staged pair. First write wins: a key already present, or one
    /// that cannot be hashed, is refused and the mapping stays as it was.
    /// Returns `Ok(None)` when nothing was staged.
    pub fn commit(&mut self) -> Result<Option<usize>, EntryWarning> {
        let Some((key, value)) = self.staged.take() else {
            return Ok(None);
        };
        if !key.is_hashable() {
            return Err(EntryWarning::UnhashableKey {
                type_name: key.type_name(),
            });
        }
        if self.committed.contains_key(&key) {
            return Err(EntryWarning::DuplicateKey { key });
        }
        let (index, _) = self.committed.insert_full(key, value);
        Ok(Some(index))
    }

    /// Drop the pair at `index`; its key becomes available again.
    pub fn remove_at(&mut self, index: usize) -> Option<(Value, Value)> {
        self.committed.shift_remove_index(index)
    }

    pub fn committed(&self) -> &IndexMap<Value, Value> {
        &self.committed
    }

    pub fn display(&self) -> Vec<String> {
        self.committed
            .iter()
            .map(|(k, v)| format!("{}: {}", k.render(), v.render()))
            .collect()
    }
}
