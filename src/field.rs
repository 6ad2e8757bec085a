//! The editable-value tree.
//!
//! Every node implements [`Field`]. Composite nodes ([`Struct`], [`List`])
//! own their children outright; the host never holds a child handle across
//! calls, it addresses nodes by [`Path`] and routes [`FieldEvent`]s through
//! the root. A handled event comes back up as a [`Change`] whose value is
//! rewritten by each ancestor into its own aggregate.
pub mod base;
pub mod leaf;
pub mod list;
pub mod locals;
pub mod structure;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ctx::Ctx;
use crate::error::{FormError, Result};
use crate::options::FieldOptions;
use crate::path::{Path, PathSegment};
use crate::template::Template;
use crate::types::Type;
use crate::validation::ValidationResult;

pub use base::{FieldCore, FieldState};
pub use leaf::{Leaf, LeafKind};
pub use list::{reconcile_items, to_same_length, List, StateTransition};
pub use locals::{Button, ButtonAction, Extra, ItemLocals, Locals, SelectOption};
pub use structure::Struct;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Value,
    Add,
    Remove,
    MoveUp,
    MoveDown,
    ItemChange,
    ValidationStateChange,
}

/// A change as seen by whoever receives it: `value` is the receiver's
/// aggregate, `path` is where the edit happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub value: Value,
    pub path: Path,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    /// Raw edit-buffer value from the widget.
    Change(Value),
    Blur,
    Add,
    Remove(usize),
    MoveUp(usize),
    MoveDown(usize),
    SetItem(usize, Value),
    /// Deferred notification delivered by the form.
    Notify(ChangeKind),
}

impl FieldEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FieldEvent::Change(_) => "change",
            FieldEvent::Blur => "blur",
            FieldEvent::Add => "add",
            FieldEvent::Remove(_) => "remove",
            FieldEvent::MoveUp(_) => "moveUp",
            FieldEvent::MoveDown(_) => "moveDown",
            FieldEvent::SetItem(..) => "setItem",
            FieldEvent::Notify(_) => "notify",
        }
    }
}

/// Construction input for every component.
#[derive(Clone)]
pub struct FieldInit {
    pub ty: Type,
    pub value: Value,
    pub options: FieldOptions,
    pub ctx: Ctx,
}

pub trait Field {
    /// Registry name of the implementation (`Textbox`, `List`, ...).
    fn component(&self) -> &str;

    fn path(&self) -> &Path;

    /// Concrete type the node was built for, after union dispatch.
    fn ty(&self) -> &Type;

    /// Move the node (and its subtree) to a new address. Lists call this on
    /// surviving items after a remove or reorder.
    fn rebase(&mut self, path: Path, label: Option<String>);

    /// Current edit state as a domain value.
    fn get_value(&self) -> Value;

    /// Absent for optionality purposes.
    fn is_value_nully(&self) -> bool;

    fn has_error(&self) -> bool;

    /// Overwrite the displayed error flag, leaving the rest of the state alone.
    fn force_error(&mut self, has_error: bool);

    /// Validate without touching any state.
    fn pure_validate(&self) -> ValidationResult;

    /// Validate and persist the outcome.
    fn validate(&mut self) -> ValidationResult;

    /// Adopt a new input value from outside the tree.
    fn set_value(&mut self, value: Value) -> Result<()>;

    /// Deliver `event` to the node at `target`, relative to this one.
    /// `Ok(None)` means the event was handled without a value change.
    fn dispatch(&mut self, target: &[PathSegment], event: FieldEvent) -> Result<Option<Change>>;

    fn get_locals(&self) -> Locals;

    fn get_template(&self) -> Option<Template>;

    fn child(&self, segment: &PathSegment) -> Option<&dyn Field>;

    fn child_mut(&mut self, segment: &PathSegment) -> Option<&mut (dyn Field + 'static)>;
}

/// Absolute address of `target` below `base`, for error reporting.
pub(crate) fn missing(base: &Path, target: &[PathSegment]) -> FormError {
    FormError::NoSuchField(target.iter().cloned().fold(base.clone(), |p, s| p.join(s)))
}

pub(crate) fn unsupported(field: &dyn Field, event: &FieldEvent) -> FormError {
    FormError::UnsupportedEvent {
        component: field.component().to_string(),
        path: field.path().clone(),
        event: event.name(),
    }
}

/// `null` and the empty string both count as "nothing entered".
pub fn is_empty(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
