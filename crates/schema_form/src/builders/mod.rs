//! The built-in construction strategies.
//!
//! - `primitive`: leaf editors (numbers, text, toggles, dates, choices, null)
//! - `container`: list, mapping, union and record shells built from child
//!   bindings via `BuildContext::build_child`
//!
//! Every builder has the `BuilderFn` signature so the registry can hold them
//! side by side with user-supplied ones.

pub mod container;
pub mod primitive;
