//! Error types for the schema_form crate

use thiserror::Error;

use crate::toolkit::NodeId;
use crate::value::Value;

/// Fatal failures. Every variant raised while building aborts the whole
/// enclosing binding; nothing partially built is left alive in the toolkit.
#[derive(Debug, Error)]
pub enum FormError {
    /// No handler exists for the type (or the type could not be classified).
    #[error("handler for type `{ty}` at `{path}` is not implemented")]
    UnsupportedType { ty: String, path: String },

    /// Two literal values render to the same display string.
    #[error("literal values `{first}` and `{second}` share the display string `{display}`")]
    MalformedLiteralDisplay {
        display: String,
        first: String,
        second: String,
    },

    /// The schema nests deeper than the configured limit.
    #[error("schema nesting exceeds the depth limit of {limit} at `{path}`")]
    RecursionLimit { limit: usize, path: String },

    /// A record was reached again while its own editor was being built.
    #[error("record `{name}` contains itself at `{path}`")]
    RecursiveRecord { name: String, path: String },

    #[error("invalid type annotation `{input}` at offset {position}: {message}")]
    Annotation {
        input: String,
        position: usize,
        message: String,
    },

    #[error("invalid schema document: {0}")]
    Schema(String),

    #[error("failed to parse schema document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no editor node {0} in this form")]
    UnknownNode(NodeId),
}

/// Recoverable rejections of a single "add" action on a mapping editor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntryWarning {
    #[error("ignoring key `{key}`: it already exists")]
    DuplicateKey { key: Value },

    #[error("the key of type `{type_name}` is not hashable; discarding")]
    UnhashableKey { type_name: &'static str },
}

pub type Result<T, E = FormError> = std::result::Result<T, E>;
