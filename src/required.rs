//! Which fields count as required.
//!
//! Several sources can answer: the type itself, a list of required names
//! handed in through the context, a JSON Schema the type was generated from,
//! and finally optionality of the type. The order in which they are consulted
//! is data, not code, so hosts can reorder or drop sources.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::{Path, PathSegment};
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredRule {
    /// `TypeMeta::required` when set.
    TypeMeta,
    /// Membership of the last path key in the context `required` list.
    ContextList,
    /// Parent object's `required` array in the original JSON Schema.
    SchemaWalk,
    /// Required unless the type is a `maybe`.
    NotMaybe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredPolicy {
    rules: Vec<RequiredRule>,
}

impl Default for RequiredPolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                RequiredRule::TypeMeta,
                RequiredRule::ContextList,
                RequiredRule::SchemaWalk,
                RequiredRule::NotMaybe,
            ],
        }
    }
}

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RequiredQuery<'a> {
    pub ty: &'a Type,
    pub path: &'a Path,
    pub required: Option<&'a [String]>,
    pub schema: Option<&'a Value>,
}

impl RequiredPolicy {
    pub fn new(rules: Vec<RequiredRule>) -> Self { Self { rules } }

    pub fn rules(&self) -> &[RequiredRule] { &self.rules }

    /// First rule with an opinion wins; with no opinion at all, required.
    pub fn is_required(&self, q: RequiredQuery<'_>) -> bool {
        self.rules.iter().find_map(|r| r.evaluate(q)).unwrap_or(true)
    }
}

impl RequiredRule {
    pub fn evaluate(self, q: RequiredQuery<'_>) -> Option<bool> {
        match self {
            RequiredRule::TypeMeta => q.ty.meta().required,
            RequiredRule::ContextList => {
                let list = q.required?;
                let key = q.path.last().filter(|s| !s.is_index())?.raw();
                Some(list.iter().any(|k| *k == key))
            }
            RequiredRule::SchemaWalk => {
                let (last, parent) = q.path.segments().split_last()?;
                if last.is_index() {
                    return None;
                }
                let mut node = q.schema?;
                for seg in parent {
                    node = descend(node, seg)?;
                }
                let node = object_arm(node);
                node.get("properties")?;
                let key = last.raw();
                let required = node.get("required").and_then(Value::as_array);
                Some(required.is_some_and(|xs| xs.iter().any(|x| x.as_str() == Some(key.as_str()))))
            }
            RequiredRule::NotMaybe => Some(!q.ty.is_maybe()),
        }
    }
}

/// Look through nullable `oneOf`/`anyOf` wrappers to the schema that
/// actually describes the shape.
fn object_arm(node: &Value) -> &Value {
    for key in ["oneOf", "anyOf"] {
        if let Some(arms) = node.get(key).and_then(Value::as_array) {
            if let Some(arm) = arms.iter().find(|a| a.get("type").and_then(Value::as_str) != Some("null")) {
                return object_arm(arm);
            }
        }
    }
    node
}

fn descend<'a>(node: &'a Value, seg: &PathSegment) -> Option<&'a Value> {
    let node = object_arm(node);
    if let Some(prop) = node.get("properties").and_then(|p| p.get(seg.raw())) {
        return Some(prop);
    }
    let i = seg.as_index()?;
    node.get("prefixItems")
        .and_then(|p| p.get(i))
        .or_else(|| node.get("items"))
}
