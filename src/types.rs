//! The type algebra that drives form composition.
//!
//! A [`Type`] is an immutable, shared description of a value shape:
//! irreducible primitives guarded by a predicate, structs of named props,
//! homogeneous lists, dicts, optional (`maybe`) wrappers, subtypes and
//! refinements guarded by an extra predicate, string enums, and unions with a
//! dispatch function. One `Type` is shared by every field built from it, so
//! handles are `Rc` and cloning is cheap.
pub mod builtins;
pub mod info;

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::path::Path;

pub use info::{TypeInfo, TypeKind};

// ------------------------------ Callables -------------------------------- //

/// Membership test for irreducibles, subtypes and refinements.
pub type Predicate = Rc<dyn Fn(&Value) -> bool>;

/// Union dispatch: index of the concrete member, `None` when nothing matches.
pub type Dispatch = Rc<dyn Fn(&Value) -> Option<usize>>;

/// Type-provided validation message; `None` keeps the default text. The last
/// argument is the host context threaded through the form, if any.
pub type MessageFn = Rc<dyn Fn(&Value, &Path, Option<&Value>) -> Option<String>>;

// ------------------------------ Descriptor ------------------------------- //

#[derive(Clone)]
pub struct Type(Rc<TypeDef>);

struct TypeDef {
    name: Option<String>,
    kind: Kind,
    meta: TypeMeta,
}

#[derive(Clone, Default)]
pub struct TypeMeta {
    /// Explicit requiredness, consulted first by the default required policy.
    pub required: Option<bool>,
    /// Component the type selects for itself (e.g. a custom editor).
    pub factory: Option<String>,
    pub message: Option<MessageFn>,
}

#[derive(Clone)]
pub enum Kind {
    Irreducible { is: Predicate },
    Struct { props: IndexMap<String, Type> },
    List { item: Type },
    Dict { domain: Type, codomain: Type },
    Maybe { inner: Type },
    Subtype { inner: Type, predicate: Predicate },
    Refinement { inner: Type, predicate: Predicate },
    Enums { variants: IndexMap<String, String> },
    Union { members: Vec<Type>, dispatch: Option<Dispatch> },
}

impl Type {
    fn from_kind(kind: Kind) -> Self {
        Self(Rc::new(TypeDef { name: None, kind, meta: TypeMeta::default() }))
    }

    pub fn irreducible(name: impl Into<String>, is: impl Fn(&Value) -> bool + 'static) -> Self {
        Self::from_kind(Kind::Irreducible { is: Rc::new(is) }).named(name)
    }

    pub fn structure<K: Into<String>>(props: impl IntoIterator<Item = (K, Type)>) -> Self {
        let props = props.into_iter().map(|(k, t)| (k.into(), t)).collect();
        Self::from_kind(Kind::Struct { props })
    }

    pub fn list(item: Type) -> Self { Self::from_kind(Kind::List { item }) }

    pub fn dict(domain: Type, codomain: Type) -> Self { Self::from_kind(Kind::Dict { domain, codomain }) }

    pub fn maybe(inner: Type) -> Self { Self::from_kind(Kind::Maybe { inner }) }

    pub fn subtype(inner: Type, predicate: impl Fn(&Value) -> bool + 'static) -> Self {
        Self::from_kind(Kind::Subtype { inner, predicate: Rc::new(predicate) })
    }

    pub fn refinement(inner: Type, predicate: impl Fn(&Value) -> bool + 'static) -> Self {
        Self::from_kind(Kind::Refinement { inner, predicate: Rc::new(predicate) })
    }

    /// Enum of `key -> label` pairs; the key is the stored value.
    pub fn enums<K: Into<String>, L: Into<String>>(variants: impl IntoIterator<Item = (K, L)>) -> Self {
        let variants = variants.into_iter().map(|(k, l)| (k.into(), l.into())).collect();
        Self::from_kind(Kind::Enums { variants })
    }

    /// Enum whose labels equal its keys.
    pub fn enums_of<K: Into<String>>(keys: impl IntoIterator<Item = K>) -> Self {
        Self::enums(keys.into_iter().map(|k| {
            let k = k.into();
            (k.clone(), k)
        }))
    }

    pub fn union(members: Vec<Type>) -> Self { Self::from_kind(Kind::Union { members, dispatch: None }) }

    // ---- builder-style modifiers (copy-on-write; the original is untouched) ----

    fn modify(&self, f: impl FnOnce(&mut TypeDef)) -> Self {
        let mut def = TypeDef {
            name: self.0.name.clone(),
            kind: self.0.kind.clone(),
            meta: self.0.meta.clone(),
        };
        f(&mut def);
        Self(Rc::new(def))
    }

    pub fn named(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.modify(|d| d.name = Some(name))
    }

    pub fn with_dispatch(&self, dispatch: impl Fn(&Value) -> Option<usize> + 'static) -> Self {
        let dispatch: Dispatch = Rc::new(dispatch);
        self.modify(|d| {
            if let Kind::Union { dispatch: slot, .. } = &mut d.kind {
                *slot = Some(dispatch);
            }
        })
    }

    pub fn with_required(&self, required: bool) -> Self { self.modify(|d| d.meta.required = Some(required)) }

    pub fn with_factory(&self, component: impl Into<String>) -> Self {
        let component = component.into();
        self.modify(|d| d.meta.factory = Some(component))
    }

    pub fn with_message(&self, message: impl Fn(&Value, &Path, Option<&Value>) -> Option<String> + 'static) -> Self {
        let message: MessageFn = Rc::new(message);
        self.modify(|d| d.meta.message = Some(message))
    }

    // ---- accessors ----

    pub fn kind(&self) -> &Kind { &self.0.kind }

    pub fn meta(&self) -> &TypeMeta { &self.0.meta }

    /// Identity, not structural equality.
    pub fn ptr_eq(&self, other: &Type) -> bool { Rc::ptr_eq(&self.0, &other.0) }

    /// Explicit name if one was given, else a name derived from the shape.
    pub fn name(&self) -> String {
        if let Some(n) = &self.0.name {
            return n.clone();
        }
        match &self.0.kind {
            Kind::Irreducible { .. } => "Irreducible".to_string(),
            Kind::Struct { props } => {
                let inner: Vec<String> = props.iter().map(|(k, t)| format!("{k}: {}", t.name())).collect();
                format!("{{{}}}", inner.join(", "))
            }
            Kind::List { item } => format!("Array<{}>", item.name()),
            Kind::Dict { domain, codomain } => format!("{{[key: {}]: {}}}", domain.name(), codomain.name()),
            Kind::Maybe { inner } => format!("?{}", inner.name()),
            Kind::Subtype { inner, .. } | Kind::Refinement { inner, .. } => format!("{{{} | <predicate>}}", inner.name()),
            Kind::Enums { variants } => variants.keys().map(|k| format!("\"{k}\"")).collect::<Vec<_>>().join(" | "),
            Kind::Union { members, .. } => members.iter().map(Type::name).collect::<Vec<_>>().join(" | "),
        }
    }

    /// Wrapped type of maybe/subtype/refinement/list, if any.
    pub fn inner(&self) -> Option<&Type> {
        match &self.0.kind {
            Kind::Maybe { inner } | Kind::Subtype { inner, .. } | Kind::Refinement { inner, .. } => Some(inner),
            Kind::List { item } => Some(item),
            Kind::Dict { codomain, .. } => Some(codomain),
            _ => None,
        }
    }

    /// Strip maybe/subtype/refinement wrappers down to the shape-bearing type.
    pub fn innermost(&self) -> Type {
        let mut cur = self.clone();
        loop {
            let next = match cur.kind() {
                Kind::Maybe { inner } | Kind::Subtype { inner, .. } | Kind::Refinement { inner, .. } => inner.clone(),
                _ => return cur,
            };
            if next.ptr_eq(&cur) {
                return cur;
            }
            cur = next;
        }
    }

    pub fn is_maybe(&self) -> bool { matches!(self.0.kind, Kind::Maybe { .. }) }

    /// Total membership predicate.
    pub fn is(&self, v: &Value) -> bool {
        match &self.0.kind {
            Kind::Irreducible { is } => is(v),
            Kind::Struct { props } => match v {
                Value::Object(map) => props.iter().all(|(k, t)| t.is(map.get(k).unwrap_or(&Value::Null))),
                _ => false,
            },
            Kind::List { item } => matches!(v, Value::Array(xs) if xs.iter().all(|x| item.is(x))),
            Kind::Dict { domain, codomain } => match v {
                Value::Object(map) => map.iter().all(|(k, x)| domain.is(&Value::String(k.clone())) && codomain.is(x)),
                _ => false,
            },
            Kind::Maybe { inner } => v.is_null() || inner.is(v),
            Kind::Subtype { inner, predicate } | Kind::Refinement { inner, predicate } => inner.is(v) && predicate(v),
            Kind::Enums { variants } => matches!(v, Value::String(s) if variants.contains_key(s)),
            Kind::Union { members, .. } => match self.dispatch(v) {
                Some(i) => members.get(i).is_some_and(|m| m.is(v)),
                None => false,
            },
        }
    }

    /// Union dispatch. Non-unions never match.
    pub fn dispatch(&self, v: &Value) -> Option<usize> {
        match &self.0.kind {
            Kind::Union { members, dispatch: Some(f) } => f(v).filter(|i| *i < members.len()),
            Kind::Union { members, dispatch: None } => members.iter().position(|m| m.is(v)),
            _ => None,
        }
    }

    pub fn union_members(&self) -> Option<&[Type]> {
        match &self.0.kind {
            Kind::Union { members, .. } => Some(members),
            _ => None,
        }
    }
}

/// Concrete member of a (possibly nested) union for `value`; any other type,
/// or a union with no matching member, comes back unchanged.
pub fn get_type_from_union(ty: &Type, value: &Value) -> Type {
    let mut cur = ty.clone();
    while let Some(members) = cur.union_members() {
        match cur.dispatch(value).and_then(|i| members.get(i)) {
            Some(m) => {
                let m = m.clone();
                cur = m;
            }
            None => break,
        }
    }
    cur
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Type").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builtins as t;
    use serde_json::json;

    #[test]
    fn struct_membership_is_recursive() {
        let person = Type::structure([("name", t::string()), ("age", Type::maybe(t::number()))]);
        assert!(person.is(&json!({"name": "a"})));
        assert!(person.is(&json!({"name": "a", "age": 3})));
        assert!(!person.is(&json!({"age": 3})));
        assert!(!person.is(&json!(["a"])));
    }

    #[test]
    fn refinement_checks_inner_first() {
        let positive = Type::refinement(t::number(), |v| v.as_f64().is_some_and(|n| n > 0.0));
        assert!(positive.is(&json!(2)));
        assert!(!positive.is(&json!(-2)));
        assert!(!positive.is(&json!("2")));
    }

    #[test]
    fn union_dispatch_uses_predicates_then_explicit_fn() {
        let u = Type::union(vec![t::string(), t::number()]);
        assert_eq!(u.dispatch(&json!(1)), Some(1));
        assert_eq!(u.dispatch(&json!(true)), None);

        let forced = u.with_dispatch(|_| Some(0));
        assert_eq!(forced.dispatch(&json!(1)), Some(0));
        assert!(!forced.is(&json!(1)));
        // the modifier copies; the original keeps predicate dispatch
        assert_eq!(u.dispatch(&json!(1)), Some(1));
    }

    #[test]
    fn nested_union_resolves_to_leaf_member() {
        let inner = Type::union(vec![t::boolean(), t::number()]);
        let outer = Type::union(vec![t::string(), inner]);
        let got = get_type_from_union(&outer, &json!(4));
        assert_eq!(got.name(), "Number");
        let none = get_type_from_union(&outer, &json!(null));
        assert!(none.ptr_eq(&outer));
    }

    #[test]
    fn innermost_strips_wrappers() {
        let s = Type::structure([("a", t::string())]);
        let wrapped = Type::maybe(Type::subtype(s.clone(), |_| true));
        assert!(wrapped.innermost().ptr_eq(&s));
    }

    #[test]
    fn derived_names() {
        assert_eq!(Type::list(t::string()).name(), "Array<String>");
        assert_eq!(Type::maybe(t::number()).name(), "?Number");
        assert_eq!(Type::enums_of(["a", "b"]).name(), "\"a\" | \"b\"");
        assert_eq!(Type::list(t::string()).named("Tags").name(), "Tags");
    }
}
