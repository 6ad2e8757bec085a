//! Per-field configuration and its resolution against union members.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::template::Template;
use crate::transformer::Transformer;
use crate::types::{Kind, Type};

// ------------------------------- Shapes ---------------------------------- //

/// Where derived labels go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Auto {
    #[default]
    Labels,
    Placeholders,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateMode {
    #[default]
    Date,
    Time,
    Datetime,
}

/// `false` hides the empty choice of a select; an object relabels it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NullOption {
    Enabled(bool),
    Custom { value: String, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct I18n {
    pub optional: String,
    pub required: String,
    pub add: String,
    pub remove: String,
    pub up: String,
    pub down: String,
    pub required_message: String,
    pub parse_error: String,
}

impl Default for I18n {
    fn default() -> Self {
        Self {
            optional: " (optional)".into(),
            required: "".into(),
            add: "Add".into(),
            remove: "✘".into(),
            up: "↑".into(),
            down: "↓".into(),
            required_message: "This field is required".into(),
            parse_error: "Invalid value".into(),
        }
    }
}

/// Explicit error text, fixed or computed from the current value.
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub enum ErrorText {
    Static(String),
    Dynamic(Rc<dyn Fn(&Value) -> String>),
}

impl ErrorText {
    pub fn render(&self, value: &Value) -> String {
        match self {
            ErrorText::Static(s) => s.clone(),
            ErrorText::Dynamic(f) => f(value),
        }
    }
}

impl From<String> for ErrorText {
    fn from(s: String) -> Self { ErrorText::Static(s) }
}

impl fmt::Debug for ErrorText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorText::Static(s) => f.debug_tuple("Static").field(s).finish(),
            ErrorText::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldOptions {
    pub label: Option<String>,
    pub help: Option<String>,
    pub placeholder: Option<String>,
    pub error: Option<ErrorText>,
    /// Parent-forced error flag; `Some(true)` shows the error regardless.
    pub has_error: Option<bool>,
    #[serde(skip)]
    pub transformer: Option<Transformer>,
    #[serde(skip)]
    pub template: Option<Template>,
    pub factory: Option<String>,
    pub auto: Option<Auto>,
    pub i18n: Option<I18n>,
    pub stylesheet: Option<Value>,
    pub config: Option<Value>,
    pub hidden: bool,

    // struct
    pub order: Option<Vec<String>>,
    pub fields: IndexMap<String, DeclaredOptions>,

    // list
    pub item: Option<Box<DeclaredOptions>>,
    pub disable_add: bool,
    pub disable_remove: bool,
    pub disable_order: bool,

    // select
    pub null_option: Option<NullOption>,
    pub sort: Option<SortOrder>,

    // date picker / textbox
    pub mode: Option<DateMode>,
    pub keyboard_type: Option<String>,
}

impl FieldOptions {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, options: impl Into<DeclaredOptions>) -> Self {
        self.fields.insert(name.into(), options.into());
        self
    }

    pub fn item(mut self, options: impl Into<DeclaredOptions>) -> Self {
        self.item = Some(Box::new(options.into()));
        self
    }
}

/// Options as written by the user, before the current value picks a branch.
#[derive(Clone)]
pub enum DeclaredOptions {
    Static(FieldOptions),
    Dynamic(Rc<dyn Fn(&Value) -> FieldOptions>),
    /// Indexed like the members of the union being edited.
    ByPosition(Vec<DeclaredOptions>),
    /// Keyed by the name of the concrete union member.
    ByName(IndexMap<String, DeclaredOptions>),
}

impl From<FieldOptions> for DeclaredOptions {
    fn from(o: FieldOptions) -> Self { DeclaredOptions::Static(o) }
}

impl Default for DeclaredOptions {
    fn default() -> Self { DeclaredOptions::Static(FieldOptions::default()) }
}

impl fmt::Debug for DeclaredOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredOptions::Static(o) => f.debug_tuple("Static").field(o).finish(),
            DeclaredOptions::Dynamic(_) => f.write_str("Dynamic(..)"),
            DeclaredOptions::ByPosition(xs) => f.debug_tuple("ByPosition").field(xs).finish(),
            DeclaredOptions::ByName(m) => f.debug_tuple("ByName").field(m).finish(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeclaredRepr {
    ByPosition(Vec<DeclaredOptions>),
    ByName {
        #[serde(rename = "byType")]
        by_type: IndexMap<String, DeclaredOptions>,
    },
    Static(FieldOptions),
}

impl<'de> Deserialize<'de> for DeclaredOptions {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(match DeclaredRepr::deserialize(d)? {
            DeclaredRepr::ByPosition(xs) => DeclaredOptions::ByPosition(xs),
            DeclaredRepr::ByName { by_type } => DeclaredOptions::ByName(by_type),
            DeclaredRepr::Static(o) => DeclaredOptions::Static(o),
        })
    }
}

// ------------------------------ Resolution -------------------------------- //

/// Effective options for a node holding `value` of declared type `ty`.
pub fn resolve_options(declared: &DeclaredOptions, value: &Value, ty: &Type) -> FieldOptions {
    match declared {
        DeclaredOptions::Static(o) => o.clone(),
        DeclaredOptions::Dynamic(f) => f(value),
        DeclaredOptions::ByPosition(list) => match concrete_member(ty, value) {
            Some((i, member)) => match list.get(i) {
                Some(d) => resolve_options(d, value, &member),
                None => unresolved("position", ty),
            },
            None => unresolved("position", ty),
        },
        DeclaredOptions::ByName(map) => match concrete_member(ty, value) {
            Some((_, member)) => match map.get(&member.name()) {
                Some(d) => resolve_options(d, value, &member),
                None => unresolved("name", ty),
            },
            None => unresolved("name", ty),
        },
    }
}

fn unresolved(how: &str, ty: &Type) -> FieldOptions {
    tracing::warn!(type_name = %ty.name(), "options keyed by union {how} do not resolve; using defaults");
    FieldOptions::default()
}

/// Member index and type a union (optionally under `maybe`) dispatches to.
fn concrete_member(ty: &Type, value: &Value) -> Option<(usize, Type)> {
    let union = match ty.kind() {
        Kind::Union { .. } => ty.clone(),
        Kind::Maybe { inner } if inner.union_members().is_some() => inner.clone(),
        _ => return None,
    };
    let i = union.dispatch(value)?;
    let member = union.union_members()?.get(i)?.clone();
    Some((i, member))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builtins as t;
    use serde_json::json;

    fn labelled(s: &str) -> DeclaredOptions { FieldOptions::default().label(s).into() }

    #[test]
    fn static_and_dynamic() {
        let ty = t::string();
        assert_eq!(resolve_options(&labelled("a"), &json!("x"), &ty).label.as_deref(), Some("a"));
        let dynamic = DeclaredOptions::Dynamic(Rc::new(|v: &Value| {
            FieldOptions::default().label(format!("len {}", v.as_str().map_or(0, str::len)))
        }));
        assert_eq!(resolve_options(&dynamic, &json!("abc"), &ty).label.as_deref(), Some("len 3"));
    }

    #[test]
    fn positional_options_follow_union_dispatch() {
        let ty = Type::union(vec![t::string(), t::number()]);
        let declared = DeclaredOptions::ByPosition(vec![labelled("text"), labelled("num")]);
        assert_eq!(resolve_options(&declared, &json!(1), &ty).label.as_deref(), Some("num"));
        assert_eq!(resolve_options(&declared, &json!("s"), &ty).label.as_deref(), Some("text"));
        // no union: falls through to defaults
        assert!(resolve_options(&declared, &json!(1), &t::number()).label.is_none());
    }

    #[test]
    fn nested_unions_recurse() {
        let inner = Type::union(vec![t::boolean(), t::number()]);
        let ty = Type::union(vec![t::string(), inner]);
        let declared = DeclaredOptions::ByPosition(vec![
            labelled("text"),
            DeclaredOptions::ByPosition(vec![labelled("bool"), labelled("num")]),
        ]);
        assert_eq!(resolve_options(&declared, &json!(true), &ty).label.as_deref(), Some("bool"));
    }

    #[test]
    fn named_options_use_member_names() {
        let ty = Type::maybe(Type::union(vec![t::string(), t::number()]));
        let mut by_name = IndexMap::new();
        by_name.insert("Number".to_string(), labelled("num"));
        let declared = DeclaredOptions::ByName(by_name);
        assert_eq!(resolve_options(&declared, &json!(2), &ty).label.as_deref(), Some("num"));
        assert!(resolve_options(&declared, &json!("x"), &ty).label.is_none());
    }

    #[test]
    fn deserializes_all_declared_shapes() {
        let o: FieldOptions = serde_json::from_value(json!({
            "label": "Root",
            "error": "bad",
            "nullOption": false,
            "fields": {
                "pet": {"byType": {"Dog": {"label": "Dog"}}},
                "tags": {"item": [{"label": "a"}, {"label": "b"}]}
            }
        }))
        .unwrap();
        assert_eq!(o.label.as_deref(), Some("Root"));
        assert!(matches!(o.error, Some(ErrorText::Static(ref s)) if s == "bad"));
        assert_eq!(o.null_option, Some(NullOption::Enabled(false)));
        assert!(matches!(o.fields.get("pet"), Some(DeclaredOptions::ByName(_))));
        match o.fields.get("tags") {
            Some(DeclaredOptions::Static(tags)) => {
                assert!(matches!(tags.item.as_deref(), Some(DeclaredOptions::ByPosition(xs)) if xs.len() == 2))
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
