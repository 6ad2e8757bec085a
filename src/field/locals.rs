//! Render-ready props handed to templates.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::options::DateMode;
use crate::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Locals {
    pub component: String,
    /// Where the host routes edits back to, in place of a callback.
    pub path: Path,
    /// Display value, i.e. the formatted edit buffer.
    pub value: Value,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub help: Option<String>,
    pub error: Option<String>,
    pub has_error: bool,
    pub hidden: bool,
    pub stylesheet: Value,
    pub config: Value,
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Extra {
    None,
    #[serde(rename_all = "camelCase")]
    Textbox { keyboard_type: Option<String> },
    Select { options: Vec<SelectOption> },
    DatePicker { mode: DateMode },
    Struct { order: Vec<String>, inputs: IndexMap<String, Locals> },
    List { items: Vec<ItemLocals>, add: Option<Button> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemLocals {
    /// Stable item identity; survives reordering.
    pub key: String,
    pub input: Locals,
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ButtonAction {
    Add,
    Remove,
    MoveUp,
    MoveDown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub action: ButtonAction,
    pub label: String,
    pub disabled: bool,
}

impl Locals {
    /// Child locals of a struct or list, in display order.
    pub fn children(&self) -> Vec<&Locals> {
        match &self.extra {
            Extra::Struct { order, inputs } => order.iter().filter_map(|k| inputs.get(k)).collect(),
            Extra::List { items, .. } => items.iter().map(|i| &i.input).collect(),
            _ => Vec::new(),
        }
    }
}
