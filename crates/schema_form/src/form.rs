//! Form driver: build the root binding, hand it to an interactive session and
//! turn the session's terminal event into the result.
//!
//! A session is whatever owns the user's attention (a terminal loop, a dialog,
//! a test script). It blocks in `next_event` until something happens and
//! reports it as a `UiEvent`:
//! - `Trigger` fires add / remove / select on a container shell and the session
//!   continues,
//! - `Confirm` extracts the root value exactly once and ends the session,
//! - `Cancel` ends the session with an empty result and extracts nothing.
//!
//! Either way the editor tree is destroyed before `run` returns.

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::binding::{Binding, TriggerOutcome};
use crate::dispatch::Dispatcher;
use crate::error::{FormError, Result};
use crate::schema::FieldSchema;
use crate::toolkit::{Action, NodeId, Toolkit};
use crate::value::Value;

/// What an interactive session reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Trigger { node: NodeId, action: Action },
    Confirm,
    Cancel,
}

/// The interactive side of a form.
pub trait Session<T: Toolkit> {
    /// Wait for the next user event. The session may read and write primitive
    /// editors through `toolkit` while it waits.
    fn next_event(&mut self, toolkit: &mut T, root: NodeId) -> Result<UiEvent>;
}

/// Terminal outcome of one session.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Confirmed(IndexMap<String, Value>),
    Cancelled,
}

impl Outcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Outcome::Confirmed(_))
    }

    /// Field values on confirm, an empty mapping on cancel.
    pub fn into_values(self) -> IndexMap<String, Value> {
        match self {
            Outcome::Confirmed(values) => values,
            Outcome::Cancelled => IndexMap::new(),
        }
    }
}

/// A built editor tree and the toolkit holding it.
pub struct Form<T: Toolkit> {
    toolkit: T,
    root: Binding,
    name: String,
    title: String,
}

impl<T: Toolkit> Form<T> {
    /// Build the form for the named root record.
    pub fn build(dispatcher: &Dispatcher, mut toolkit: T, root: &str) -> Result<Self> {
        let binding = dispatcher.build_root(&mut toolkit, root)?;
        Ok(Self {
            toolkit,
            root: binding,
            name: root.to_string(),
            title: dispatcher.settings().title.clone(),
        })
    }

    /// Build a form around any single field.
    pub fn for_field(dispatcher: &Dispatcher, mut toolkit: T, field: &FieldSchema) -> Result<Self> {
        let root = dispatcher.build(&mut toolkit, field)?;
        Ok(Self {
            toolkit,
            root,
            name: field.name.clone(),
            title: dispatcher.settings().title.clone(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn root(&self) -> NodeId {
        self.root.node()
    }

    pub fn binding(&self) -> &Binding {
        &self.root
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    pub fn toolkit_mut(&mut self) -> &mut T {
        &mut self.toolkit
    }

    /// Route a trigger to the container shell `node`.
    pub fn trigger(&mut self, node: NodeId, action: Action) -> Result<TriggerOutcome> {
        let binding = self
            .root
            .find_mut(node)
            .ok_or(FormError::UnknownNode(node))?;
        let outcome = binding.trigger(action, &mut self.toolkit);
        if outcome == TriggerOutcome::Ignored {
            warn!(node = %node, %action, "trigger ignored");
        }
        Ok(outcome)
    }

    pub fn extract(&self) -> Value {
        self.root.extract(&self.toolkit)
    }

    /// The root value as a field mapping. A non-record root is reported under
    /// its own field name.
    pub fn extract_fields(&self) -> IndexMap<String, Value> {
        match self.extract() {
            Value::Record(fields) => fields,
            other => {
                let mut single = IndexMap::new();
                single.insert(self.name.clone(), other);
                single
            }
        }
    }

    /// Destroy the editor tree and hand the toolkit back.
    pub fn close(mut self) -> T {
        self.root.dispose(&mut self.toolkit);
        self.toolkit
    }
}

/// Runs one form session to completion.
#[derive(Debug, Clone, Default)]
pub struct FormDriver {
    dispatcher: Dispatcher,
}

impl FormDriver {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Build the root record's form and drive `session` until it confirms or
    /// cancels.
    pub fn run<T, S>(&self, toolkit: T, root: &str, session: &mut S) -> Result<Outcome>
    where
        T: Toolkit,
        S: Session<T>,
    {
        let form = Form::build(&self.dispatcher, toolkit, root)?;
        info!(root, title = form.title(), "form opened");
        drive(form, session)
    }
}

/// Drive an already built form.
pub fn drive<T, S>(mut form: Form<T>, session: &mut S) -> Result<Outcome>
where
    T: Toolkit,
    S: Session<T>,
{
    let root = form.root();
    loop {
        let event = match session.next_event(form.toolkit_mut(), root) {
            Ok(event) => event,
            Err(err) => {
                form.close();
                return Err(err);
            }
        };
        match event {
            UiEvent::Trigger { node, action } => {
                // Per-action failures are local; the session goes on.
                if let Err(err) = form.trigger(node, action) {
                    warn!("{err}");
                }
            }
            UiEvent::Confirm => {
                let values = form.extract_fields();
                info!(fields = values.len(), "form confirmed");
                form.close();
                return Ok(Outcome::Confirmed(values));
            }
            UiEvent::Cancel => {
                info!("form cancelled");
                form.close();
                return Ok(Outcome::Cancelled);
            }
        }
    }
}
