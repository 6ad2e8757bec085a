//! Type + options → field implementation.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{FormError, Result};
use crate::field::{self, Field, FieldInit};
use crate::options::FieldOptions;
use crate::types::{builtins, get_type_from_union, Type, TypeInfo, TypeKind};

pub type FieldFactory = fn(FieldInit) -> Result<Box<dyn Field>>;

pub const TEXTBOX: &str = "Textbox";
pub const CHECKBOX: &str = "Checkbox";
pub const SELECT: &str = "Select";
pub const DATE_PICKER: &str = "DatePicker";
pub const STRUCT: &str = "Struct";
pub const LIST: &str = "List";

/// Component name → factory.
#[derive(Clone)]
pub struct Registry {
    factories: IndexMap<String, FieldFactory>,
}

impl Registry {
    pub fn empty() -> Self { Self { factories: IndexMap::new() } }

    pub fn register(mut self, name: impl Into<String>, factory: FieldFactory) -> Self {
        self.factories.insert(name.into(), factory);
        self
    }

    pub fn get(&self, name: &str) -> Option<FieldFactory> { self.factories.get(name).copied() }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.factories.keys().map(String::as_str) }
}

impl Default for Registry {
    fn default() -> Self {
        Self::empty()
            .register(TEXTBOX, field::leaf::textbox)
            .register(CHECKBOX, field::leaf::checkbox)
            .register(SELECT, field::leaf::select)
            .register(DATE_PICKER, field::leaf::date_picker)
            .register(STRUCT, field::structure::Struct::factory)
            .register(LIST, field::list::List::factory)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

/// Canonical component for a type's shape, ignoring any overrides.
pub fn component_name(ty: &Type) -> String {
    let info = TypeInfo::classify(Some(ty));
    match info.kind {
        TypeKind::Irreducible => match ty.name().as_str() {
            builtins::BOOLEAN => CHECKBOX.to_string(),
            builtins::DATE => DATE_PICKER.to_string(),
            _ => TEXTBOX.to_string(),
        },
        TypeKind::Struct => STRUCT.to_string(),
        TypeKind::List => LIST.to_string(),
        TypeKind::Enums => SELECT.to_string(),
        TypeKind::Dict => "Dict".to_string(),
        TypeKind::Union => "Union".to_string(),
        TypeKind::Maybe | TypeKind::Subtype | TypeKind::Refinement => match info.inner_type {
            Some(inner) if !inner.ptr_eq(ty) => component_name(&inner),
            _ => TEXTBOX.to_string(),
        },
    }
}

/// `options.factory`, then the type's own hook, then the shape.
pub fn resolve_component(ty: &Type, options: &FieldOptions, registry: &Registry) -> Result<(String, FieldFactory)> {
    let name = options
        .factory
        .clone()
        .or_else(|| ty.meta().factory.clone())
        .unwrap_or_else(|| component_name(ty));
    match registry.get(&name) {
        Some(f) => Ok((name, f)),
        None => Err(FormError::UnknownComponent { name, type_name: ty.name() }),
    }
}

/// Dispatch unions against the initial value, then construct the component.
pub fn build_field(init: FieldInit) -> Result<Box<dyn Field>> {
    let ty = get_type_from_union(&init.ty, &init.value);
    let (name, factory) = resolve_component(&ty, &init.options, &init.ctx.registry)?;
    tracing::debug!(path = %init.ctx.path, component = %name, type_name = %ty.name(), "building field");
    factory(FieldInit { ty, ..init })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builtins as t;

    #[test]
    fn primitive_names() {
        assert_eq!(component_name(&t::string()), TEXTBOX);
        assert_eq!(component_name(&t::number()), TEXTBOX);
        assert_eq!(component_name(&t::boolean()), CHECKBOX);
        assert_eq!(component_name(&t::date()), DATE_PICKER);
        assert_eq!(component_name(&Type::enums_of(["a"])), SELECT);
    }

    #[test]
    fn wrappers_recurse() {
        let ty = Type::maybe(Type::refinement(Type::list(t::string()), |_| true));
        assert_eq!(component_name(&ty), LIST);
        assert_eq!(component_name(&Type::maybe(t::boolean())), CHECKBOX);
        assert_eq!(component_name(&Type::subtype(Type::enums_of(["a"]), |_| true)), SELECT);
        assert_eq!(component_name(&Type::maybe(Type::dict(t::string(), t::number()))), "Dict");
    }

    #[test]
    fn precedence_options_then_type_then_kind() {
        let registry = Registry::default();
        let ty = t::string().with_factory(SELECT);
        let (name, _) = resolve_component(&ty, &FieldOptions::default(), &registry).unwrap();
        assert_eq!(name, SELECT);

        let options = FieldOptions { factory: Some(CHECKBOX.into()), ..FieldOptions::default() };
        let (name, _) = resolve_component(&ty, &options, &registry).unwrap();
        assert_eq!(name, CHECKBOX);
    }

    #[test]
    fn unknown_names_are_fatal() {
        let registry = Registry::default();
        let dict = Type::dict(t::string(), t::number());
        let err = resolve_component(&dict, &FieldOptions::default(), &registry).err().unwrap();
        assert!(matches!(err, FormError::UnknownComponent { ref name, .. } if name == "Dict"));

        let options = FieldOptions { factory: Some("Slider".into()), ..FieldOptions::default() };
        assert!(resolve_component(&t::number(), &options, &registry).is_err());
    }
}
