//! The root of a field tree and the host's entry point.
//!
//! A [`Form`] binds a type, an initial value and options into one tree of
//! fields. The host feeds interactions in by path and gets back a [`Change`]
//! carrying the whole form's value; deferred notifications wait in a queue
//! until the host calls [`Form::run_pending`] on its next turn.

use std::rc::Rc;

use serde_json::Value;

use crate::config::FormConfig;
use crate::ctx::{Ctx, Scheduler};
use crate::error::{FormError, Result};
use crate::field::{Change, ChangeKind, Field, FieldEvent, FieldInit, Locals};
use crate::options::FieldOptions;
use crate::path::Path;
use crate::resolver::{build_field, Registry};
use crate::template::{Template, Templates};
use crate::transformer::Transformers;
use crate::types::Type;
use crate::uid::UidGenerator;
use crate::validation::ValidationResult;

pub struct Form {
    root: Box<dyn Field>,
    original: Value,
    uid_generator: Rc<UidGenerator>,
    scheduler: Rc<Scheduler>,
}

pub struct FormBuilder {
    ty: Type,
    value: Value,
    options: FieldOptions,
    label: Option<String>,
    registry: Registry,
    templates: Templates,
    transformers: Transformers,
    config: FormConfig,
    context: Option<Value>,
    original_schema: Option<Value>,
}

impl FormBuilder {
    pub fn options(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }

    /// Default label for the root field.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn templates(mut self, templates: Templates) -> Self {
        self.templates = templates;
        self
    }

    pub fn transformers(mut self, transformers: Transformers) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    /// Host value passed to type message hooks.
    pub fn context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn required(mut self, names: Vec<String>) -> Self {
        self.config.required = Some(names);
        self
    }

    /// JSON Schema the type came from, walked by the `schemaWalk` rule.
    pub fn original_schema(mut self, schema: Value) -> Self {
        self.original_schema = Some(schema);
        self
    }

    pub fn build(self) -> Result<Form> {
        let config = self.config;
        let scheduler = Rc::new(Scheduler::default());
        let uid_generator = Rc::new(UidGenerator::new(config.uid_seed));
        let ctx = Ctx {
            auto: config.auto,
            label: self.label,
            i18n: Rc::new(config.i18n),
            templates: Rc::new(self.templates),
            registry: Rc::new(self.registry),
            transformers: Rc::new(self.transformers),
            uid_generator: uid_generator.clone(),
            stylesheet: Rc::new(config.stylesheet),
            config: Rc::new(config.config),
            path: Path::root(),
            context: self.context.map(Rc::new),
            required: config.required.map(Rc::from),
            original_schema: self.original_schema.map(Rc::new),
            required_policy: Rc::new(config.required_policy),
            scheduler: Rc::downgrade(&scheduler),
        };
        let root = build_field(FieldInit { ty: self.ty, value: self.value.clone(), options: self.options, ctx })?;
        tracing::debug!(component = root.component(), type_name = %root.ty().name(), "form built");
        Ok(Form { root, original: self.value, uid_generator, scheduler })
    }
}

impl Form {
    pub fn new(ty: Type, value: Value, options: FieldOptions) -> Result<Self> {
        Self::builder(ty, value).options(options).build()
    }

    pub fn builder(ty: Type, value: Value) -> FormBuilder {
        FormBuilder {
            ty,
            value,
            options: FieldOptions::default(),
            label: None,
            registry: Registry::default(),
            templates: Templates::default(),
            transformers: Transformers::default(),
            config: FormConfig::default(),
            context: None,
            original_schema: None,
        }
    }

    pub fn root(&self) -> &dyn Field { self.root.as_ref() }

    /// The value the form was built (or last reset) with.
    pub fn original(&self) -> &Value { &self.original }

    pub fn uid_seed(&self) -> &str { self.uid_generator.seed() }

    /// Current edit state, valid or not. Fields that fail to parse
    /// contribute their raw text.
    pub fn get_value(&self) -> Value { self.root.get_value() }

    /// Validate the whole tree. Every node records its own outcome, so an
    /// optional list with a bad item flags the item and not itself.
    pub fn validate(&mut self) -> ValidationResult { self.root.validate() }

    pub fn pure_validate(&self) -> ValidationResult { self.root.pure_validate() }

    /// The validated value, only when the tree is valid.
    pub fn value_if_valid(&self) -> Option<Value> {
        let result = self.pure_validate();
        result.is_valid().then_some(result.value)
    }

    pub fn get_component(&self, path: &Path) -> Option<&dyn Field> {
        let mut cur: &dyn Field = self.root.as_ref();
        for segment in path.segments() {
            cur = cur.child(segment)?;
        }
        Some(cur)
    }

    pub fn get_component_mut(&mut self, path: &Path) -> Option<&mut (dyn Field + 'static)> {
        let mut cur: &mut (dyn Field + 'static) = self.root.as_mut();
        for segment in path.segments() {
            cur = cur.child_mut(segment)?;
        }
        Some(cur)
    }

    pub fn locals(&self) -> Locals { self.root.get_locals() }

    pub fn template(&self) -> Option<Template> { self.root.get_template() }

    /// Render the root through its template, if one is registered.
    pub fn render(&self) -> Option<String> { self.template().map(|t| t.render(&self.locals())) }

    fn route(&mut self, path: &Path, event: FieldEvent) -> Result<Option<Change>> {
        tracing::trace!(%path, event = event.name(), "routing event");
        self.root.dispatch(path.segments(), event)
    }

    pub fn on_change(&mut self, path: &Path, raw: Value) -> Result<Option<Change>> {
        self.route(path, FieldEvent::Change(raw))
    }

    pub fn on_blur(&mut self, path: &Path) -> Result<Option<Change>> { self.route(path, FieldEvent::Blur) }

    pub fn add(&mut self, path: &Path) -> Result<Option<Change>> { self.route(path, FieldEvent::Add) }

    pub fn remove(&mut self, path: &Path, index: usize) -> Result<Option<Change>> {
        self.route(path, FieldEvent::Remove(index))
    }

    pub fn move_up(&mut self, path: &Path, index: usize) -> Result<Option<Change>> {
        self.route(path, FieldEvent::MoveUp(index))
    }

    pub fn move_down(&mut self, path: &Path, index: usize) -> Result<Option<Change>> {
        self.route(path, FieldEvent::MoveDown(index))
    }

    pub fn set_item(&mut self, path: &Path, index: usize, value: Value) -> Result<Option<Change>> {
        self.route(path, FieldEvent::SetItem(index, value))
    }

    /// Replace the input from outside. Surviving nodes keep their state.
    pub fn set_value(&mut self, value: Value) -> Result<Change> {
        self.root.set_value(value.clone())?;
        self.original = value;
        Ok(Change { value: self.get_value(), path: Path::root(), kind: ChangeKind::Value })
    }

    pub fn has_pending(&self) -> bool { !self.scheduler.is_empty() }

    /// Deliver everything queued before this call. Anything queued while
    /// delivering waits for the next call. A message goes to wherever its
    /// target sits now; targets dropped in the meantime are skipped.
    pub fn run_pending(&mut self) -> Vec<Change> {
        let mut out = Vec::new();
        for pending in self.scheduler.drain() {
            let Some(path) = pending.target_path() else {
                tracing::debug!(kind = ?pending.kind, "deferred notification target was dropped");
                continue;
            };
            match self.root.dispatch(path.segments(), FieldEvent::Notify(pending.kind)) {
                Ok(Some(change)) => out.push(change),
                Ok(None) => {}
                Err(FormError::NoSuchField(path)) => {
                    tracing::debug!(%path, "deferred notification target is gone");
                }
                Err(error) => tracing::warn!(%error, "deferred notification failed"),
            }
        }
        out
    }
}
