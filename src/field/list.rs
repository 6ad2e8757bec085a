//! Dynamic-length aggregate with stable item identity.
//!
//! Each item is keyed by a uid drawn from the form's [`UidGenerator`]. The
//! key travels with the item through moves and removals, so the child field
//! (and its touched / error state) stays attached to the right row. Only
//! slots that did not exist before get fresh keys.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{FormError, Result};
use crate::field::base::FieldCore;
use crate::field::locals::{Button, ButtonAction, Extra, ItemLocals, Locals};
use crate::field::{missing, Change, ChangeKind, Field, FieldEvent, FieldInit};
use crate::options::resolve_options;
use crate::path::{Path, PathSegment};
use crate::resolver::{self, build_field};
use crate::template::Template;
use crate::types::{get_type_from_union, Kind, Type};
use crate::uid::UidGenerator;
use crate::validation::ValidationResult;

/// What happens to one slot when the list's input is replaced from outside.
#[derive(Debug, Clone, PartialEq)]
pub enum StateTransition {
    /// Same member type, same value: nothing to do.
    Keep { index: usize },
    /// Same member type, new value: push it into the existing child.
    Update { index: usize, value: Value },
    /// The value now dispatches to a different union member.
    Rebuild { index: usize, value: Value },
    /// A slot that did not exist before.
    Create { index: usize, value: Value },
    /// A slot that no longer exists.
    Drop { index: usize },
}

/// Plan the per-slot work for replacing `prev` (each slot's concrete type
/// and current value) with `next`.
pub fn reconcile_items(prev: &[(Type, Value)], next: &[Value], item_type: &Type) -> Vec<StateTransition> {
    let mut plan = Vec::with_capacity(prev.len().max(next.len()));
    for (index, value) in next.iter().enumerate() {
        let transition = match prev.get(index) {
            None => StateTransition::Create { index, value: value.clone() },
            Some((ty, _)) if !ty.ptr_eq(&get_type_from_union(item_type, value)) => {
                StateTransition::Rebuild { index, value: value.clone() }
            }
            Some((_, old)) if old == value => StateTransition::Keep { index },
            Some(_) => StateTransition::Update { index, value: value.clone() },
        };
        plan.push(transition);
    }
    plan.extend((next.len()..prev.len()).map(|index| StateTransition::Drop { index }));
    plan
}

/// Keys resized to `len`: existing keys are kept by position, new positions
/// get fresh ones.
pub fn to_same_length(keys: &[String], len: usize, uid: &UidGenerator) -> Vec<String> {
    (0..len).map(|i| keys.get(i).cloned().unwrap_or_else(|| uid.next())).collect()
}

pub struct List {
    core: FieldCore,
    /// Declared item type, before per-item union dispatch.
    item_type: Type,
    /// Items in display order, keyed by uid.
    children: IndexMap<String, Box<dyn Field>>,
}

impl List {
    pub fn factory(init: FieldInit) -> Result<Box<dyn Field>> { Ok(Box::new(Self::new(init)?)) }

    pub fn new(init: FieldInit) -> Result<Self> {
        let item_type = match init.ty.innermost().kind() {
            Kind::List { item } => item.clone(),
            _ => crate::types::builtins::any(),
        };
        let core = FieldCore::new(init);
        let values = as_items(&core.state.value, core.path());
        let keys = to_same_length(&[], values.len(), &core.ctx.uid_generator);
        let mut children = IndexMap::with_capacity(values.len());
        for (index, (key, value)) in keys.into_iter().zip(values).enumerate() {
            children.insert(key, build_item(&core, &item_type, index, value)?);
        }
        Ok(Self { core, item_type, children })
    }

    pub fn keys(&self) -> Vec<&str> { self.children.keys().map(String::as_str).collect() }

    pub fn len(&self) -> usize { self.children.len() }

    pub fn is_empty(&self) -> bool { self.children.is_empty() }

    /// Structurally empty, or every slot holds `null`. A slot with a blank
    /// struct in it is not empty; its own fields report what is missing.
    fn items_empty(&self) -> bool { self.children.values().all(|c| c.get_value().is_null()) }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.children.len() {
            Ok(())
        } else {
            Err(FormError::IndexOutOfRange { path: self.path().clone(), index, len: self.children.len() })
        }
    }

    /// Empty lists either collapse to `null` (optional) or fail once at the
    /// list's own path (required). `None` means the items must be checked.
    fn empty_outcome(&self) -> Option<ValidationResult> {
        if !self.items_empty() {
            return None;
        }
        if self.core.info.is_maybe {
            return Some(ValidationResult::ok(Value::Null));
        }
        if self.core.is_required() {
            let err = self.core.required_error(self.get_value());
            return Some(ValidationResult::with_errors(self.get_value(), vec![err]));
        }
        Some(ValidationResult::ok(self.get_value()))
    }

    fn aggregate(&self, results: Vec<ValidationResult>) -> ValidationResult {
        let mut errors = Vec::new();
        let mut values = Vec::with_capacity(results.len());
        for r in results {
            errors.extend(r.errors);
            values.push(r.value);
        }
        let value = Value::Array(values);
        if errors.is_empty() {
            errors = self.core.check_predicates(&value);
        }
        ValidationResult::with_errors(value, errors)
    }

    /// An optional list never fails on its items' account; only errors at
    /// its own path count against it.
    fn own_error(&self, result: &ValidationResult) -> bool {
        if self.core.info.is_maybe {
            result.errors.iter().any(|e| &e.path == self.path())
        } else {
            !result.is_valid()
        }
    }

    fn item_label(&self, index: usize) -> String { item_label(&self.core, index) }

    /// Re-address items from `from` onwards after a splice or swap.
    fn rebase_items(&mut self, from: usize) {
        let base = self.core.path().clone();
        let labels: Vec<String> = (0..self.children.len()).map(|i| self.item_label(i)).collect();
        for (i, child) in self.children.values_mut().enumerate().skip(from) {
            child.rebase(base.join(i), Some(labels[i].clone()));
        }
    }

    /// Single exit for every mutation. A list that is already showing
    /// validation is revalidated, but item error flags are restored
    /// afterwards so a structural edit can't flip a sibling's error.
    fn emit_change(&mut self, path: Path, kind: ChangeKind) -> Change {
        if self.core.state.validation_attempted || self.core.state.has_error {
            let snapshot: Vec<(String, bool)> = self.children.iter().map(|(k, c)| (k.clone(), c.has_error())).collect();
            self.validate();
            for (key, has_error) in snapshot {
                if let Some(child) = self.children.get_mut(&key) {
                    child.force_error(has_error);
                }
            }
        }
        Change { value: self.get_value(), path, kind }
    }

    pub fn add(&mut self) -> Result<Change> {
        let index = self.children.len();
        let key = self.core.ctx.uid_generator.next();
        let child = build_item(&self.core, &self.item_type, index, Value::Null)?;
        tracing::debug!(path = %self.path(), %key, "item added");
        self.children.insert(key, child);
        Ok(self.emit_change(self.path().clone(), ChangeKind::Add))
    }

    pub fn remove(&mut self, index: usize) -> Result<Change> {
        self.check_index(index)?;
        if let Some((key, _)) = self.children.shift_remove_index(index) {
            tracing::debug!(path = %self.path(), %key, index, "item removed");
        }
        self.rebase_items(index);
        Ok(self.emit_change(self.path().clone(), ChangeKind::Remove))
    }

    pub fn move_up(&mut self, index: usize) -> Result<Change> {
        self.check_index(index)?;
        if index > 0 {
            self.children.swap_indices(index - 1, index);
            self.rebase_items(index - 1);
        }
        Ok(self.emit_change(self.path().clone(), ChangeKind::MoveUp))
    }

    pub fn move_down(&mut self, index: usize) -> Result<Change> {
        self.check_index(index)?;
        if index + 1 < self.children.len() {
            self.children.swap_indices(index, index + 1);
            self.rebase_items(index);
        }
        Ok(self.emit_change(self.path().clone(), ChangeKind::MoveDown))
    }

    /// In-place edit of one item, pushed straight into the child.
    pub fn set_item(&mut self, index: usize, value: Value) -> Result<Change> {
        self.check_index(index)?;
        self.replace_item(index, value)?;
        let path = self.path().join(index);
        Ok(self.emit_change(path, ChangeKind::ItemChange))
    }

    fn replace_item(&mut self, index: usize, value: Value) -> Result<()> {
        let concrete = get_type_from_union(&self.item_type, &value);
        let rebuild = match self.children.get_index(index) {
            Some((_, child)) => !child.ty().ptr_eq(&concrete),
            None => return Ok(()),
        };
        if rebuild {
            let fresh = build_item(&self.core, &self.item_type, index, value)?;
            if let Some((_, slot)) = self.children.get_index_mut(index) {
                *slot = fresh;
            }
        } else if let Some((_, child)) = self.children.get_index_mut(index) {
            child.set_value(value)?;
        }
        Ok(())
    }

    fn handle(&mut self, event: FieldEvent) -> Result<Option<Change>> {
        tracing::trace!(path = %self.path(), event = event.name(), "list event");
        match event {
            FieldEvent::Add => self.add().map(Some),
            FieldEvent::Remove(i) => self.remove(i).map(Some),
            FieldEvent::MoveUp(i) => self.move_up(i).map(Some),
            FieldEvent::MoveDown(i) => self.move_down(i).map(Some),
            FieldEvent::SetItem(i, v) => self.set_item(i, v).map(Some),
            FieldEvent::Change(raw) => {
                self.set_value(raw)?;
                Ok(Some(self.emit_change(self.path().clone(), ChangeKind::Value)))
            }
            FieldEvent::Blur => {
                self.core.state.touched = true;
                Ok(None)
            }
            FieldEvent::Notify(kind) => Ok(Some(Change { value: self.get_value(), path: self.path().clone(), kind })),
        }
    }

    fn buttons(&self, index: usize) -> Vec<Button> {
        let i18n = &self.core.ctx.i18n;
        let opts = &self.core.options;
        let last = self.children.len().saturating_sub(1);
        let mut buttons = Vec::new();
        if !opts.disable_remove {
            buttons.push(Button { action: ButtonAction::Remove, label: i18n.remove.clone(), disabled: false });
        }
        if !opts.disable_order {
            buttons.push(Button { action: ButtonAction::MoveUp, label: i18n.up.clone(), disabled: index == 0 });
            buttons.push(Button { action: ButtonAction::MoveDown, label: i18n.down.clone(), disabled: index == last });
        }
        buttons
    }
}

fn as_items(value: &Value, path: &Path) -> Vec<Value> {
    match value {
        Value::Array(xs) => xs.clone(),
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(%path, value = %other, "list input is not an array; starting empty");
            Vec::new()
        }
    }
}

fn item_label(core: &FieldCore, index: usize) -> String {
    let n = index + 1;
    match core.options.label.as_ref().or(core.ctx.label.as_ref()) {
        Some(label) => format!("{label}[{n}]"),
        None => n.to_string(),
    }
}

fn build_item(core: &FieldCore, item_type: &Type, index: usize, value: Value) -> Result<Box<dyn Field>> {
    let options = core
        .options
        .item
        .as_deref()
        .map(|d| resolve_options(d, &value, item_type))
        .unwrap_or_default();
    let ctx = core.ctx.child(index, Some(item_label(core, index)), &core.options);
    build_field(FieldInit { ty: item_type.clone(), value, options, ctx })
}

impl Field for List {
    fn component(&self) -> &str { resolver::LIST }

    fn path(&self) -> &Path { self.core.path() }

    fn ty(&self) -> &Type { &self.core.ty }

    fn rebase(&mut self, path: Path, label: Option<String>) {
        self.core.rebase(path, label);
        self.rebase_items(0);
    }

    fn get_value(&self) -> Value { Value::Array(self.children.values().map(|c| c.get_value()).collect()) }

    fn is_value_nully(&self) -> bool { self.items_empty() }

    fn has_error(&self) -> bool { self.core.has_error() }

    fn force_error(&mut self, has_error: bool) { self.core.state.has_error = has_error }

    fn pure_validate(&self) -> ValidationResult {
        if let Some(r) = self.empty_outcome() {
            return r;
        }
        self.aggregate(self.children.values().map(|c| c.pure_validate()).collect())
    }

    fn validate(&mut self) -> ValidationResult {
        let was_failing = self.core.state.has_error;
        let result = match self.empty_outcome() {
            Some(r) => r,
            None => {
                let results = self.children.values_mut().map(|c| c.validate()).collect();
                self.aggregate(results)
            }
        };
        let failing = self.own_error(&result);
        self.core.record(&result, failing);
        if was_failing && !failing {
            // parents learn about it on the next turn, never re-entrantly
            self.core.schedule(ChangeKind::ValidationStateChange);
        }
        result
    }

    fn set_value(&mut self, value: Value) -> Result<()> {
        let next = as_items(&value, self.path());
        let prev: Vec<(Type, Value)> = self.children.values().map(|c| (c.ty().clone(), c.get_value())).collect();
        let plan = reconcile_items(&prev, &next, &self.item_type);
        let old_keys: Vec<String> = self.children.keys().cloned().collect();
        let keys = to_same_length(&old_keys, next.len(), &self.core.ctx.uid_generator);
        let mut old: Vec<Option<Box<dyn Field>>> = std::mem::take(&mut self.children).into_values().map(Some).collect();
        let mut children = IndexMap::with_capacity(next.len());
        for step in plan {
            let (index, child) = match step {
                StateTransition::Keep { index } => (index, old[index].take()),
                StateTransition::Update { index, value } => {
                    let mut child = old[index].take();
                    if let Some(c) = child.as_mut() {
                        c.set_value(value)?;
                    }
                    (index, child)
                }
                StateTransition::Rebuild { index, value } | StateTransition::Create { index, value } => {
                    (index, Some(build_item(&self.core, &self.item_type, index, value)?))
                }
                StateTransition::Drop { .. } => continue,
            };
            if let Some(child) = child {
                children.insert(keys[index].clone(), child);
            }
        }
        self.children = children;
        self.core.state.value = value;
        Ok(())
    }

    fn dispatch(&mut self, target: &[PathSegment], event: FieldEvent) -> Result<Option<Change>> {
        let Some((head, rest)) = target.split_first() else { return self.handle(event) };
        let index = head.as_index().ok_or_else(|| missing(self.core.path(), target))?;
        let child = match self.children.get_index_mut(index) {
            Some((_, child)) => child,
            None => return Err(missing(self.core.path(), target)),
        };
        match child.dispatch(rest, event)? {
            // an edit inside an item is an item change as far as the list is concerned
            Some(Change { path, kind: ChangeKind::Value, .. }) => Ok(Some(self.emit_change(path, ChangeKind::ItemChange))),
            Some(change) => Ok(Some(self.emit_change(change.path, change.kind))),
            None => Ok(None),
        }
    }

    fn get_locals(&self) -> Locals {
        let items = self
            .children
            .iter()
            .enumerate()
            .map(|(i, (key, child))| ItemLocals { key: key.clone(), input: child.get_locals(), buttons: self.buttons(i) })
            .collect();
        let add = (!self.core.options.disable_add).then(|| Button {
            action: ButtonAction::Add,
            label: self.core.ctx.i18n.add.clone(),
            disabled: false,
        });
        let value = self.get_value();
        self.core.locals(self.component(), value.clone(), &value, Extra::List { items, add })
    }

    fn get_template(&self) -> Option<Template> { self.core.template(self.component()) }

    fn child(&self, segment: &PathSegment) -> Option<&dyn Field> {
        let index = segment.as_index()?;
        self.children.get_index(index).map(|(_, c)| c.as_ref())
    }

    fn child_mut(&mut self, segment: &PathSegment) -> Option<&mut (dyn Field + 'static)> {
        let index = segment.as_index()?;
        self.children.get_index_mut(index).map(|(_, c)| c.as_mut())
    }
}
