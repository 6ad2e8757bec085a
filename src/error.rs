//! Errors surfaced by the form engine.
//!
//! Validation failures are *not* errors: they travel as data inside
//! [`ValidationResult`](crate::validation::ValidationResult). `FormError` is
//! reserved for misconfiguration and bad host input.

use thiserror::Error;

use crate::path::Path;

#[derive(Debug, Error)]
pub enum FormError {
    /// No factory is registered under the resolved component name.
    #[error("unknown component `{name}` for type `{type_name}`")]
    UnknownComponent { name: String, type_name: String },

    /// A host-supplied path does not address an existing field.
    #[error("no field at path {0}")]
    NoSuchField(Path),

    #[error("component `{component}` at {path} does not handle `{event}`")]
    UnsupportedEvent {
        component: String,
        path: Path,
        event: &'static str,
    },

    #[error("item index {index} out of range for list of length {len} at {path}")]
    IndexOutOfRange { path: Path, index: usize, len: usize },

    /// JSON Schema could not be turned into a type.
    #[error("unsupported schema at {pointer}: {reason}")]
    Schema { pointer: String, reason: String },

    /// Options or config JSON failed to decode; `path` is the JSON path.
    #[error("at JSON path {path} → {message}")]
    Decode { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, FormError>;
