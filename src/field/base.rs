//! State and render-prop plumbing shared by every component.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::ctx::{Anchor, Ctx};
use crate::field::locals::{Extra, Locals};
use crate::field::{ChangeKind, FieldInit};
use crate::options::{Auto, FieldOptions};
use crate::path::Path;
use crate::template::Template;
use crate::types::{Type, TypeInfo};
use crate::validation::{ValidationError, ValidationResult};

/// Per-node interaction state. Owned by exactly one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldState {
    /// Edit buffer for leaves; unused by composites, which read their children.
    pub value: Value,
    pub touched: bool,
    pub validation_attempted: bool,
    pub has_error: bool,
    pub parse_error: bool,
    pub last_error: Option<String>,
}

pub struct FieldCore {
    pub ty: Type,
    pub info: TypeInfo,
    pub options: FieldOptions,
    pub ctx: Ctx,
    pub state: FieldState,
    anchor: Anchor,
}

impl FieldCore {
    pub fn new(init: FieldInit) -> Self {
        let info = TypeInfo::classify(Some(&init.ty));
        let anchor = Rc::new(RefCell::new(init.ctx.path.clone()));
        Self {
            ty: init.ty,
            info,
            options: init.options,
            ctx: init.ctx,
            state: FieldState { value: init.value, ..FieldState::default() },
            anchor,
        }
    }

    pub fn path(&self) -> &Path { &self.ctx.path }

    pub fn context(&self) -> Option<&Value> { self.ctx.context.as_deref() }

    pub fn is_required(&self) -> bool { self.ctx.is_required(&self.ty) }

    /// The parent's explicit override wins over internal state.
    pub fn has_error(&self) -> bool { self.options.has_error == Some(true) || self.state.has_error }

    pub fn rebase(&mut self, path: Path, label: Option<String>) {
        *self.anchor.borrow_mut() = path.clone();
        self.ctx.path = path;
        self.ctx.label = label;
    }

    /// Queue a notification that reaches this node wherever it sits when
    /// the queue is drained.
    pub fn schedule(&self, kind: ChangeKind) { self.ctx.schedule(&self.anchor, kind) }

    /// Persist a validation outcome. Only errors addressed to this node
    /// supply its error text; nested ones belong to the children.
    pub fn record(&mut self, result: &ValidationResult, has_error: bool) {
        self.state.validation_attempted = true;
        self.state.has_error = has_error;
        self.state.last_error = result
            .errors
            .iter()
            .find(|e| &e.path == self.path())
            .map(|e| e.message.clone());
    }

    pub fn required_error(&self, actual: Value) -> ValidationError {
        ValidationError::new(self.ctx.i18n.required_message.clone(), self.path().clone(), actual, self.ty.name())
    }

    /// Shape-level check of an aggregate against predicate-bearing wrappers.
    /// Plain structs and lists are already covered by their children.
    pub fn check_predicates(&self, value: &Value) -> Vec<ValidationError> {
        if !has_predicate(&self.ty) {
            return Vec::new();
        }
        crate::validation::validate(value, &self.ty, self.path(), self.context()).errors
    }

    // ---- render props ----

    fn derived_label(&self) -> Option<String> {
        let base = self.ctx.label.clone()?;
        if self.ctx.is_list_item() {
            return Some(base);
        }
        let suffix = if self.is_required() { &self.ctx.i18n.required } else { &self.ctx.i18n.optional };
        Some(format!("{base}{suffix}"))
    }

    pub fn label(&self) -> Option<String> {
        if let Some(label) = &self.options.label {
            return Some(label.clone());
        }
        match self.ctx.auto {
            Auto::Labels => self.derived_label(),
            Auto::Placeholders | Auto::None => None,
        }
    }

    pub fn placeholder(&self) -> Option<String> {
        if let Some(p) = &self.options.placeholder {
            return Some(p.clone());
        }
        match self.ctx.auto {
            Auto::Placeholders if self.options.label.is_none() => self.derived_label(),
            _ => None,
        }
    }

    /// Most specific text for the current error: explicit option, then the
    /// type's own message hook, then whatever the last check produced.
    pub fn error(&self, value: &Value) -> Option<String> {
        if !self.has_error() {
            return None;
        }
        if let Some(e) = &self.options.error {
            return Some(e.render(value));
        }
        let hooked = self.ty.meta().message.as_ref().and_then(|f| f(value, self.path(), self.context()));
        hooked.or_else(|| self.state.last_error.clone())
    }

    pub fn template(&self, component: &str) -> Option<Template> {
        self.options
            .template
            .clone()
            .or_else(|| self.ctx.templates.get(component).cloned())
    }

    pub fn locals(&self, component: &str, display: Value, value: &Value, extra: Extra) -> Locals {
        Locals {
            component: component.to_string(),
            path: self.path().clone(),
            value: display,
            label: self.label(),
            placeholder: self.placeholder(),
            help: self.options.help.clone(),
            error: self.error(value),
            has_error: self.has_error(),
            hidden: self.options.hidden,
            stylesheet: (*self.ctx.stylesheet).clone(),
            config: (*self.ctx.config).clone(),
            extra,
        }
    }
}

/// Any subtype or refinement among the wrappers of `ty`.
pub(crate) fn has_predicate(ty: &Type) -> bool {
    let mut cur = ty.clone();
    loop {
        let info = TypeInfo::classify(Some(&cur));
        if info.has_predicate() {
            return true;
        }
        match info.inner_type {
            Some(inner) if info.is_maybe && !inner.ptr_eq(&cur) => cur = inner,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builtins as t;

    #[test]
    fn predicate_detection_looks_through_maybe() {
        assert!(has_predicate(&Type::maybe(Type::subtype(t::number(), |_| true))));
        assert!(!has_predicate(&Type::maybe(t::number())));
        assert!(!has_predicate(&Type::list(Type::refinement(t::string(), |_| true))));
    }
}
