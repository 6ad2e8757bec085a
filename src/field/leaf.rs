//! Single-value editors: text box, checkbox, select, date picker.
//!
//! They differ only in their default transformer and in the extra render
//! props they expose; the touched / parse-error / required state machine is
//! the same for all of them.

use serde_json::Value;

use crate::error::Result;
use crate::field::base::FieldCore;
use crate::field::locals::{Extra, Locals, SelectOption};
use crate::field::{is_empty, missing, unsupported, Change, ChangeKind, Field, FieldEvent, FieldInit};
use crate::options::{NullOption, SortOrder};
use crate::path::{Path, PathSegment};
use crate::resolver;
use crate::template::Template;
use crate::transformer::{TransformError, Transformer, Transformers};
use crate::types::{builtins, Kind, Type};
use crate::validation::{self, ValidationError, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Textbox,
    Checkbox,
    Select,
    DatePicker,
}

impl LeafKind {
    pub fn component(self) -> &'static str {
        match self {
            LeafKind::Textbox => resolver::TEXTBOX,
            LeafKind::Checkbox => resolver::CHECKBOX,
            LeafKind::Select => resolver::SELECT,
            LeafKind::DatePicker => resolver::DATE_PICKER,
        }
    }

    fn default_transformer(self, ty: &Type, table: &Transformers) -> Transformer {
        match self {
            LeafKind::Textbox if is_numeric(ty) => table.number.clone(),
            LeafKind::Textbox if is_opaque(ty) => table.identity.clone(),
            LeafKind::Textbox => table.text.clone(),
            LeafKind::Checkbox => table.checkbox.clone(),
            LeafKind::Select => table.select.clone(),
            LeafKind::DatePicker => table.date.clone(),
        }
    }
}

fn is_numeric(ty: &Type) -> bool {
    matches!(ty.innermost().name().as_str(), builtins::NUMBER | builtins::INTEGER)
}

/// Irreducibles whose members need not be text; their values pass through untouched.
fn is_opaque(ty: &Type) -> bool {
    matches!(ty.innermost().name().as_str(), builtins::ANY | builtins::NIL)
}

pub fn textbox(init: FieldInit) -> Result<Box<dyn Field>> { Ok(Box::new(Leaf::new(LeafKind::Textbox, init))) }

pub fn checkbox(init: FieldInit) -> Result<Box<dyn Field>> { Ok(Box::new(Leaf::new(LeafKind::Checkbox, init))) }

pub fn select(init: FieldInit) -> Result<Box<dyn Field>> { Ok(Box::new(Leaf::new(LeafKind::Select, init))) }

pub fn date_picker(init: FieldInit) -> Result<Box<dyn Field>> { Ok(Box::new(Leaf::new(LeafKind::DatePicker, init))) }

pub struct Leaf {
    kind: LeafKind,
    core: FieldCore,
    transformer: Transformer,
}

impl Leaf {
    pub fn new(kind: LeafKind, init: FieldInit) -> Self {
        let transformer = init
            .options
            .transformer
            .clone()
            .unwrap_or_else(|| kind.default_transformer(&init.ty, &init.ctx.transformers));
        let mut core = FieldCore::new(init);
        core.state.value = transformer.format(&core.state.value);
        Self { kind, core, transformer }
    }

    pub fn kind(&self) -> LeafKind { self.kind }

    fn parse_message(&self, e: &TransformError) -> String {
        e.message().map(str::to_string).unwrap_or_else(|| self.core.ctx.i18n.parse_error.clone())
    }

    /// Empty, required, and not already a member (`Nil` holds `null`).
    fn blank_but_required(&self, v: &Value) -> bool { is_empty(v) && !self.core.ty.is(v) && self.core.is_required() }

    /// Parse, then required, then the type itself. Returns the result and
    /// whether parsing failed.
    fn check(&self) -> (ValidationResult, bool) {
        let path = self.core.path();
        match self.transformer.parse(&self.core.state.value) {
            Err(e) => {
                let raw = self.core.state.value.clone();
                let err = ValidationError::new(self.parse_message(&e), path.clone(), raw.clone(), self.core.ty.name());
                (ValidationResult::with_errors(raw, vec![err]), true)
            }
            Ok(v) if self.blank_but_required(&v) => {
                let err = self.core.required_error(v.clone());
                (ValidationResult::with_errors(v, vec![err]), false)
            }
            Ok(v) => (validation::validate(&v, &self.core.ty, path, self.core.context()), false),
        }
    }

    /// Recompute the error flag after an interaction. Once a full
    /// validation has happened every edit revalidates; before that only
    /// parse failures and touched required fields show up.
    fn refresh(&mut self) {
        if self.core.state.validation_attempted {
            self.validate();
            return;
        }
        let state = &mut self.core.state;
        match self.transformer.parse(&state.value) {
            Err(e) => {
                let message = e.message().map(str::to_string).unwrap_or_else(|| self.core.ctx.i18n.parse_error.clone());
                state.parse_error = true;
                state.has_error = true;
                state.last_error = Some(message);
            }
            Ok(v) => {
                state.parse_error = false;
                if state.touched && is_empty(&v) && !self.core.ty.is(&v) && self.core.ctx.is_required(&self.core.ty) {
                    state.has_error = true;
                    state.last_error = Some(self.core.ctx.i18n.required_message.clone());
                } else {
                    state.has_error = false;
                    state.last_error = None;
                }
            }
        }
    }

    fn change(&self, kind: ChangeKind) -> Change {
        Change { value: self.get_value(), path: self.core.path().clone(), kind }
    }

    fn extra(&self) -> Extra {
        match self.kind {
            LeafKind::Textbox => Extra::Textbox { keyboard_type: self.keyboard_type() },
            LeafKind::Checkbox => Extra::None,
            LeafKind::Select => Extra::Select { options: self.select_options() },
            LeafKind::DatePicker => Extra::DatePicker { mode: self.core.options.mode.unwrap_or_default() },
        }
    }

    fn keyboard_type(&self) -> Option<String> {
        match &self.core.options.keyboard_type {
            Some(k) => Some(k.clone()),
            None if is_numeric(&self.core.ty) => Some("numeric".to_string()),
            None => None,
        }
    }

    /// Enum choices, optionally sorted, behind the null option.
    fn select_options(&self) -> Vec<SelectOption> {
        let mut choices: Vec<SelectOption> = match self.core.ty.innermost().kind() {
            Kind::Enums { variants } => variants
                .iter()
                .map(|(value, text)| SelectOption { value: value.clone(), text: text.clone() })
                .collect(),
            _ => Vec::new(),
        };
        match self.core.options.sort {
            Some(SortOrder::Asc) => choices.sort_by(|a, b| a.text.cmp(&b.text)),
            Some(SortOrder::Desc) => choices.sort_by(|a, b| b.text.cmp(&a.text)),
            None => {}
        }
        let null = match &self.core.options.null_option {
            Some(NullOption::Enabled(false)) => None,
            Some(NullOption::Custom { value, text }) => Some(SelectOption { value: value.clone(), text: text.clone() }),
            Some(NullOption::Enabled(true)) | None => Some(SelectOption { value: String::new(), text: "-".to_string() }),
        };
        null.into_iter().chain(choices).collect()
    }
}

impl Field for Leaf {
    fn component(&self) -> &str { self.kind.component() }

    fn path(&self) -> &Path { self.core.path() }

    fn ty(&self) -> &Type { &self.core.ty }

    fn rebase(&mut self, path: Path, label: Option<String>) { self.core.rebase(path, label) }

    /// The parsed edit buffer, or the raw buffer while it does not parse.
    fn get_value(&self) -> Value {
        self.transformer
            .parse(&self.core.state.value)
            .unwrap_or_else(|_| self.core.state.value.clone())
    }

    fn is_value_nully(&self) -> bool { is_empty(&self.get_value()) }

    fn has_error(&self) -> bool { self.core.has_error() }

    fn force_error(&mut self, has_error: bool) { self.core.state.has_error = has_error }

    fn pure_validate(&self) -> ValidationResult { self.check().0 }

    fn validate(&mut self) -> ValidationResult {
        let (result, parse_error) = self.check();
        self.core.state.parse_error = parse_error;
        self.core.record(&result, !result.is_valid());
        result
    }

    fn set_value(&mut self, value: Value) -> Result<()> {
        self.core.state.value = self.transformer.format(&value);
        self.refresh();
        Ok(())
    }

    fn dispatch(&mut self, target: &[PathSegment], event: FieldEvent) -> Result<Option<Change>> {
        if !target.is_empty() {
            return Err(missing(self.path(), target));
        }
        tracing::trace!(path = %self.path(), event = event.name(), "leaf event");
        match event {
            FieldEvent::Change(raw) => {
                self.core.state.value = raw;
                self.core.state.touched = true;
                self.refresh();
                Ok(Some(self.change(ChangeKind::Value)))
            }
            FieldEvent::Blur => {
                self.core.state.touched = true;
                self.refresh();
                Ok(None)
            }
            FieldEvent::Notify(kind) => Ok(Some(self.change(kind))),
            other => Err(unsupported(&*self, &other)),
        }
    }

    fn get_locals(&self) -> Locals {
        let display = self.transformer.format(&self.core.state.value);
        self.core.locals(self.component(), display, &self.get_value(), self.extra())
    }

    fn get_template(&self) -> Option<Template> { self.core.template(self.component()) }

    fn child(&self, _segment: &PathSegment) -> Option<&dyn Field> { None }

    fn child_mut(&mut self, _segment: &PathSegment) -> Option<&mut (dyn Field + 'static)> { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Form;
    use crate::options::FieldOptions;
    use crate::path;
    use crate::types::builtins as t;
    use serde_json::json;

    fn leaf(form: &Form) -> &dyn Field { form.get_component(&Path::root()).unwrap() }

    #[test]
    fn required_field_waits_for_interaction() {
        let mut form = Form::new(t::string(), Value::Null, FieldOptions::default()).unwrap();
        assert!(!leaf(&form).has_error());
        form.on_blur(&Path::root()).unwrap();
        assert!(leaf(&form).has_error());
        assert_eq!(form.locals().error.as_deref(), Some("This field is required"));
    }

    #[test]
    fn parse_error_beats_required_and_keeps_raw_value() {
        let mut form = Form::new(t::number(), Value::Null, FieldOptions::default()).unwrap();
        let change = form.on_change(&Path::root(), json!("abc")).unwrap().unwrap();
        assert_eq!(change.value, json!("abc"));
        assert!(leaf(&form).has_error());
        let r = form.validate();
        assert_eq!(r.errors.len(), 1);
        assert_eq!(r.errors[0].message, "\"abc\" is not a valid number");

        form.on_change(&Path::root(), json!("42")).unwrap();
        assert!(!leaf(&form).has_error());
        assert_eq!(form.get_value(), json!(42));
    }

    #[test]
    fn optional_number_blank_is_null() {
        let form = Form::new(Type::maybe(t::number()), Value::Null, FieldOptions::default()).unwrap();
        assert_eq!(form.locals().value, json!(""));
        assert_eq!(form.get_value(), Value::Null);
        assert!(form.pure_validate().is_valid());
    }

    #[test]
    fn explicit_error_text_wins() {
        let options = FieldOptions { error: Some("nope".to_string().into()), ..FieldOptions::default() };
        let mut form = Form::new(t::string(), Value::Null, options).unwrap();
        form.validate();
        assert_eq!(form.locals().error.as_deref(), Some("nope"));
    }

    #[test]
    fn forced_error_flag_shows_without_interaction() {
        let options = FieldOptions { has_error: Some(true), ..FieldOptions::default() };
        let form = Form::new(Type::maybe(t::string()), Value::Null, options).unwrap();
        assert!(form.locals().has_error);
    }

    #[test]
    fn select_lists_null_option_then_sorted_choices() {
        let ty = Type::enums([("b", "Bee"), ("a", "Ay")]);
        let options = FieldOptions { sort: Some(SortOrder::Asc), ..FieldOptions::default() };
        let form = Form::new(ty, Value::Null, options).unwrap();
        let Extra::Select { options } = form.locals().extra else { panic!("not a select") };
        let texts: Vec<&str> = options.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, vec!["-", "Ay", "Bee"]);
    }

    #[test]
    fn any_and_nil_values_pass_through_untouched() {
        let mut form = Form::new(t::any(), json!({"a": 1}), FieldOptions::default()).unwrap();
        assert_eq!(form.get_value(), json!({"a": 1}));
        assert_eq!(form.locals().value, json!({"a": 1}));
        assert!(form.validate().is_valid());

        let mut form = Form::new(t::nil(), Value::Null, FieldOptions::default()).unwrap();
        form.on_blur(&Path::root()).unwrap();
        assert!(!leaf(&form).has_error());
        let r = form.validate();
        assert!(r.is_valid(), "{:?}", r.errors);
        assert_eq!(r.value, Value::Null);
    }

    #[test]
    fn blank_text_reads_as_null() {
        let mut form = Form::new(Type::maybe(t::string()), json!("hi"), FieldOptions::default()).unwrap();
        let change = form.on_change(&Path::root(), json!("")).unwrap().unwrap();
        assert_eq!(change.value, Value::Null);
        assert_eq!(form.locals().value, json!(""));
        assert!(form.validate().is_valid());
    }

    #[test]
    fn nested_targets_below_a_leaf_do_not_exist() {
        let mut form = Form::new(t::string(), Value::Null, FieldOptions::default()).unwrap();
        assert!(form.on_change(&path!["x"], json!("v")).is_err());
    }
}
