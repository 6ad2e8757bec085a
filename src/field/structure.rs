//! Fixed-shape aggregate of named children.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::ctx::humanize;
use crate::error::Result;
use crate::field::base::FieldCore;
use crate::field::locals::{Extra, Locals};
use crate::field::{missing, unsupported, Change, ChangeKind, Field, FieldEvent, FieldInit};
use crate::options::resolve_options;
use crate::path::{Path, PathSegment};
use crate::resolver::{self, build_field};
use crate::template::Template;
use crate::types::{get_type_from_union, Kind, Type};
use crate::validation::ValidationResult;

pub struct Struct {
    core: FieldCore,
    /// Declared prop types, in declaration order.
    props: IndexMap<String, Type>,
    /// Children in display order.
    children: IndexMap<String, Box<dyn Field>>,
}

impl Struct {
    pub fn factory(init: FieldInit) -> Result<Box<dyn Field>> { Ok(Box::new(Self::new(init)?)) }

    pub fn new(init: FieldInit) -> Result<Self> {
        let props = match init.ty.innermost().kind() {
            Kind::Struct { props } => props.clone(),
            _ => IndexMap::new(),
        };
        let core = FieldCore::new(init);
        let mut children = IndexMap::with_capacity(props.len());
        for name in display_order(&props, core.options.order.as_deref()) {
            let sub = core.state.value.get(&name).cloned().unwrap_or(Value::Null);
            let child = build_child(&core, &name, &props[&name], sub)?;
            children.insert(name, child);
        }
        Ok(Self { core, props, children })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.children.keys().map(String::as_str) }

    fn nully_short_circuit(&self) -> bool {
        self.core.info.is_maybe && self.children.values().all(|c| c.is_value_nully())
    }

    /// Merge child results in declaration order; the struct's own predicate
    /// only runs when every child passed.
    fn aggregate(&self, mut results: IndexMap<String, ValidationResult>) -> ValidationResult {
        let mut errors = Vec::new();
        let mut value = Map::new();
        for name in self.props.keys() {
            if let Some(r) = results.shift_remove(name) {
                errors.extend(r.errors);
                value.insert(name.clone(), r.value);
            }
        }
        let value = Value::Object(value);
        if errors.is_empty() {
            errors = self.core.check_predicates(&value);
        }
        ValidationResult::with_errors(value, errors)
    }

    fn bubble(&mut self, change: Change) -> Change {
        if self.core.state.validation_attempted {
            let valid = self.pure_validate().is_valid();
            self.core.state.has_error = !valid;
        }
        Change { value: self.get_value(), path: change.path, kind: change.kind }
    }
}

fn display_order(props: &IndexMap<String, Type>, order: Option<&[String]>) -> Vec<String> {
    let Some(order) = order else { return props.keys().cloned().collect() };
    let mut names: Vec<String> = order.iter().filter(|n| props.contains_key(*n)).cloned().collect();
    names.extend(props.keys().filter(|k| !order.contains(k)).cloned());
    names
}

fn build_child(core: &FieldCore, name: &str, ty: &Type, value: Value) -> Result<Box<dyn Field>> {
    let options = core
        .options
        .fields
        .get(name)
        .map(|d| resolve_options(d, &value, ty))
        .unwrap_or_default();
    let ctx = core.ctx.child(name, Some(humanize(name)), &core.options);
    build_field(FieldInit { ty: ty.clone(), value, options, ctx })
}

impl Field for Struct {
    fn component(&self) -> &str { resolver::STRUCT }

    fn path(&self) -> &Path { self.core.path() }

    fn ty(&self) -> &Type { &self.core.ty }

    fn rebase(&mut self, path: Path, label: Option<String>) {
        for (name, child) in self.children.iter_mut() {
            child.rebase(path.join(name.as_str()), Some(humanize(name)));
        }
        self.core.rebase(path, label);
    }

    fn get_value(&self) -> Value {
        let map = self
            .props
            .keys()
            .filter_map(|k| self.children.get(k).map(|c| (k.clone(), c.get_value())))
            .collect();
        Value::Object(map)
    }

    fn is_value_nully(&self) -> bool { self.children.values().all(|c| c.is_value_nully()) }

    fn has_error(&self) -> bool { self.core.has_error() }

    fn force_error(&mut self, has_error: bool) { self.core.state.has_error = has_error }

    fn pure_validate(&self) -> ValidationResult {
        if self.nully_short_circuit() {
            return ValidationResult::ok(Value::Null);
        }
        let results = self.children.iter().map(|(k, c)| (k.clone(), c.pure_validate())).collect();
        self.aggregate(results)
    }

    fn validate(&mut self) -> ValidationResult {
        let result = if self.nully_short_circuit() {
            ValidationResult::ok(Value::Null)
        } else {
            let results = self.children.iter_mut().map(|(k, c)| (k.clone(), c.validate())).collect();
            self.aggregate(results)
        };
        self.core.record(&result, !result.is_valid());
        result
    }

    /// Children whose dispatched type changed are rebuilt; the rest keep
    /// their interaction state.
    fn set_value(&mut self, value: Value) -> Result<()> {
        for (name, prop_ty) in &self.props {
            let sub = value.get(name).cloned().unwrap_or(Value::Null);
            let concrete = get_type_from_union(prop_ty, &sub);
            let Some(child) = self.children.get_mut(name) else { continue };
            if child.ty().ptr_eq(&concrete) {
                child.set_value(sub)?;
            } else {
                tracing::debug!(path = %child.path(), from = %child.ty().name(), to = %concrete.name(), "union member changed; rebuilding");
                *child = build_child(&self.core, name, prop_ty, sub)?;
            }
        }
        self.core.state.value = value;
        Ok(())
    }

    fn dispatch(&mut self, target: &[PathSegment], event: FieldEvent) -> Result<Option<Change>> {
        let Some((head, rest)) = target.split_first() else {
            return match event {
                FieldEvent::Change(raw) => {
                    self.set_value(raw)?;
                    Ok(Some(Change { value: self.get_value(), path: self.path().clone(), kind: ChangeKind::Value }))
                }
                FieldEvent::Blur => {
                    self.core.state.touched = true;
                    Ok(None)
                }
                FieldEvent::Notify(kind) => {
                    Ok(Some(Change { value: self.get_value(), path: self.path().clone(), kind }))
                }
                other => Err(unsupported(&*self, &other)),
            };
        };
        let child = self
            .children
            .get_mut(&head.raw())
            .ok_or_else(|| missing(self.core.path(), target))?;
        let change = child.dispatch(rest, event)?;
        Ok(change.map(|c| self.bubble(c)))
    }

    fn get_locals(&self) -> Locals {
        let inputs: IndexMap<String, Locals> = self.children.iter().map(|(k, c)| (k.clone(), c.get_locals())).collect();
        let order = inputs.keys().cloned().collect();
        let value = self.get_value();
        self.core.locals(self.component(), value.clone(), &value, Extra::Struct { order, inputs })
    }

    fn get_template(&self) -> Option<Template> { self.core.template(self.component()) }

    fn child(&self, segment: &PathSegment) -> Option<&dyn Field> {
        self.children.get(&segment.raw()).map(|c| c.as_ref())
    }

    fn child_mut(&mut self, segment: &PathSegment) -> Option<&mut (dyn Field + 'static)> {
        self.children.get_mut(&segment.raw()).map(|c| c.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Form;
    use crate::options::FieldOptions;
    use crate::path;
    use crate::types::builtins as t;
    use serde_json::json;

    fn person() -> Type {
        Type::structure([("name", t::string()), ("age", Type::maybe(t::number()))])
    }

    #[test]
    fn value_is_read_from_children() {
        let mut form = Form::new(person(), json!({"name": "Ann", "age": 3}), FieldOptions::default()).unwrap();
        assert_eq!(form.get_value(), json!({"name": "Ann", "age": 3}));
        let change = form.on_change(&path!["age"], json!("4")).unwrap().unwrap();
        assert_eq!(change.path, path!["age"]);
        assert_eq!(change.value, json!({"name": "Ann", "age": 4}));
    }

    #[test]
    fn order_option_controls_display_not_value() {
        let options = FieldOptions { order: Some(vec!["age".into(), "name".into()]), ..FieldOptions::default() };
        let form = Form::new(person(), json!({"name": "x"}), options).unwrap();
        let Extra::Struct { order, .. } = form.locals().extra else { panic!("not a struct") };
        assert_eq!(order, vec!["age", "name"]);
        let keys: Vec<String> = form.get_value().as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "age"]);
    }

    #[test]
    fn labels_are_humanised_with_optional_suffix() {
        let ty = Type::structure([("firstName", t::string()), ("nickName", Type::maybe(t::string()))]);
        let form = Form::new(ty, json!({}), FieldOptions::default()).unwrap();
        let locals = form.locals();
        let labels: Vec<Option<String>> = locals.children().iter().map(|l| l.label.clone()).collect();
        assert_eq!(labels, vec![Some("First name".to_string()), Some("Nick name (optional)".to_string())]);
    }

    #[test]
    fn optional_struct_with_blank_children_is_null() {
        let ty = Type::maybe(person());
        let mut form = Form::new(ty, Value::Null, FieldOptions::default()).unwrap();
        let r = form.validate();
        assert!(r.is_valid());
        assert_eq!(r.value, Value::Null);
    }

    #[test]
    fn subtype_predicate_runs_only_after_children_pass() {
        let range = Type::subtype(
            Type::structure([("min", t::number()), ("max", t::number())]),
            |v| v["min"].as_f64() <= v["max"].as_f64(),
        );
        let mut form = Form::new(range.clone(), json!({"min": 5, "max": 1}), FieldOptions::default()).unwrap();
        let r = form.validate();
        assert_eq!(r.errors.len(), 1);
        assert_eq!(r.errors[0].path, Path::root());

        let mut form = Form::new(range, json!({"min": "x", "max": 1}), FieldOptions::default()).unwrap();
        let r = form.validate();
        assert_eq!(r.errors.len(), 1);
        assert_eq!(r.errors[0].path, path!["min"]);
    }

    #[test]
    fn union_props_rebuild_when_member_changes() {
        let ty = Type::structure([("v", Type::union(vec![t::boolean(), t::string()]))]);
        let mut form = Form::new(ty, json!({"v": true}), FieldOptions::default()).unwrap();
        assert_eq!(form.get_component(&path!["v"]).unwrap().component(), "Checkbox");
        form.set_value(json!({"v": "text"})).unwrap();
        assert_eq!(form.get_component(&path!["v"]).unwrap().component(), "Textbox");
        assert_eq!(form.get_value(), json!({"v": "text"}));
    }
}
