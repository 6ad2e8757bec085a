//! Structural validation of a value against a [`Type`].
//!
//! Errors are accumulated, never thrown: a struct with three bad props yields
//! three errors, each carrying the full path from the form root.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path::Path;
use crate::types::{Kind, Type};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub message: String,
    pub path: Path,
    pub actual: Value,
    pub expected: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub value: Value,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn ok(value: Value) -> Self { Self { value, errors: Vec::new() } }

    pub fn with_errors(value: Value, errors: Vec<ValidationError>) -> Self { Self { value, errors } }

    pub fn is_valid(&self) -> bool { self.errors.is_empty() }

    pub fn first_error(&self) -> Option<&ValidationError> { self.errors.first() }
}

impl ValidationError {
    pub fn new(message: impl Into<String>, path: Path, actual: Value, expected: impl Into<String>) -> Self {
        Self { message: message.into(), path, actual, expected: expected.into() }
    }

    /// Default wording, overridable per type through its message hook.
    pub fn mismatch(actual: &Value, ty: &Type, path: &Path, context: Option<&Value>) -> Self {
        let message = ty
            .meta()
            .message
            .as_ref()
            .and_then(|f| f(actual, path, context))
            .unwrap_or_else(|| format!("Invalid value {actual} supplied to {path}: {}", ty.name()));
        Self::new(message, path.clone(), actual.clone(), ty.name())
    }
}

/// Validate `value` as found at `path`. `context` is handed to message hooks.
pub fn validate(value: &Value, ty: &Type, path: &Path, context: Option<&Value>) -> ValidationResult {
    let mut acc = Acc { context, errors: Vec::new() };
    let value = acc.run(value, ty, path);
    ValidationResult { value, errors: acc.errors }
}

struct Acc<'a> {
    context: Option<&'a Value>,
    errors: Vec<ValidationError>,
}

impl Acc<'_> {
    fn fail(&mut self, v: &Value, ty: &Type, path: &Path) {
        self.errors.push(ValidationError::mismatch(v, ty, path, self.context));
    }

    fn run(&mut self, v: &Value, ty: &Type, path: &Path) -> Value {
        match ty.kind() {
            Kind::Irreducible { is } => {
                if !is(v) {
                    self.fail(v, ty, path);
                }
                v.clone()
            }
            Kind::Maybe { inner } => {
                if v.is_null() { Value::Null } else { self.run(v, inner, path) }
            }
            Kind::Subtype { inner, predicate } | Kind::Refinement { inner, predicate } => {
                let before = self.errors.len();
                let out = self.run(v, inner, path);
                if self.errors.len() == before && !predicate(&out) {
                    self.fail(v, ty, path);
                }
                out
            }
            Kind::Struct { props } => {
                let Value::Object(map) = v else {
                    self.fail(v, ty, path);
                    return v.clone();
                };
                let mut out = Map::new();
                for (k, prop_ty) in props {
                    let actual = map.get(k).unwrap_or(&Value::Null);
                    let x = self.run(actual, prop_ty, &path.join(k.as_str()));
                    out.insert(k.clone(), x);
                }
                Value::Object(out)
            }
            Kind::List { item } => {
                let Value::Array(xs) = v else {
                    self.fail(v, ty, path);
                    return v.clone();
                };
                let out = xs
                    .iter()
                    .enumerate()
                    .map(|(i, x)| self.run(x, item, &path.join(i)))
                    .collect();
                Value::Array(out)
            }
            Kind::Dict { domain, codomain } => {
                let Value::Object(map) = v else {
                    self.fail(v, ty, path);
                    return v.clone();
                };
                let mut out = Map::new();
                for (k, x) in map {
                    let sub = path.join(k.as_str());
                    self.run(&Value::String(k.clone()), domain, &sub);
                    out.insert(k.clone(), self.run(x, codomain, &sub));
                }
                Value::Object(out)
            }
            Kind::Enums { variants } => {
                if !matches!(v, Value::String(s) if variants.contains_key(s)) {
                    self.fail(v, ty, path);
                }
                v.clone()
            }
            Kind::Union { members, .. } => match ty.dispatch(v).and_then(|i| members.get(i)) {
                Some(member) => self.run(v, member, path),
                None => {
                    self.fail(v, ty, path);
                    v.clone()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use crate::types::builtins as t;
    use serde_json::json;

    #[test]
    fn struct_errors_carry_full_paths() {
        let ty = Type::structure([
            ("name", t::string()),
            ("tags", Type::list(t::string())),
        ]);
        let r = validate(&json!({"name": 1, "tags": ["a", 2]}), &ty, &path!["root"], None);
        let paths: Vec<String> = r.errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["/root/name", "/root/tags/1"]);
        assert_eq!(r.errors[0].expected, "String");
        assert_eq!(r.errors[0].actual, json!(1));
    }

    #[test]
    fn subtype_predicate_only_runs_on_valid_inner() {
        let ty = Type::subtype(t::number(), |v| v.as_f64().is_some_and(|n| n > 10.0)).named("Big");
        assert_eq!(validate(&json!("x"), &ty, &Path::root(), None).errors[0].expected, "Number");
        assert_eq!(validate(&json!(3), &ty, &Path::root(), None).errors[0].expected, "Big");
        assert!(validate(&json!(11), &ty, &Path::root(), None).is_valid());
    }

    #[test]
    fn message_hook_overrides_text() {
        let ty = t::string().with_message(|_, p, _| Some(format!("need text at {p}")));
        let r = validate(&json!(5), &ty, &path!["a"], None);
        assert_eq!(r.errors[0].message, "need text at /a");
    }

    #[test]
    fn union_without_match_reports_union() {
        let ty = Type::union(vec![t::string(), t::number()]);
        let r = validate(&json!(true), &ty, &Path::root(), None);
        assert_eq!(r.errors.len(), 1);
        assert_eq!(r.errors[0].expected, "String | Number");
        assert!(validate(&json!(1.5), &ty, &Path::root(), None).is_valid());
    }

    #[test]
    fn dict_checks_keys_and_values() {
        let ty = Type::dict(Type::enums_of(["a", "b"]), t::number());
        assert!(validate(&json!({"a": 1}), &ty, &Path::root(), None).is_valid());
        let r = validate(&json!({"c": "x"}), &ty, &Path::root(), None);
        assert_eq!(r.errors.len(), 2);
    }
}
