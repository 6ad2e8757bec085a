use super::{Kind, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Irreducible,
    Struct,
    List,
    Dict,
    Maybe,
    Subtype,
    Refinement,
    Enums,
    Union,
}

/// Flat classification of a type's outermost tag.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub kind: TypeKind,
    pub inner_type: Option<Type>,
    pub is_maybe: bool,
    pub is_subtype: bool,
    pub is_enum: bool,
    pub is_list: bool,
    pub is_dict: bool,
    pub is_union: bool,
    pub is_refinement: bool,
    pub is_primitive: bool,
    pub is_object: bool,
}

impl TypeInfo {
    fn empty() -> Self {
        Self {
            kind: TypeKind::Irreducible,
            inner_type: None,
            is_maybe: false,
            is_subtype: false,
            is_enum: false,
            is_list: false,
            is_dict: false,
            is_union: false,
            is_refinement: false,
            is_primitive: false,
            is_object: false,
        }
    }

    /// Total, side-effect free. `None` classifies as an all-false irreducible.
    pub fn classify(ty: Option<&Type>) -> Self {
        let Some(ty) = ty else { return Self::empty() };
        let mut info = Self::empty();
        info.inner_type = ty.inner().cloned();
        info.kind = match ty.kind() {
            Kind::Irreducible { .. } => TypeKind::Irreducible,
            Kind::Struct { .. } => TypeKind::Struct,
            Kind::List { .. } => { info.is_list = true; TypeKind::List }
            Kind::Dict { .. } => { info.is_dict = true; TypeKind::Dict }
            Kind::Maybe { .. } => { info.is_maybe = true; TypeKind::Maybe }
            Kind::Subtype { .. } => { info.is_subtype = true; TypeKind::Subtype }
            Kind::Refinement { .. } => { info.is_refinement = true; TypeKind::Refinement }
            Kind::Enums { .. } => { info.is_enum = true; TypeKind::Enums }
            Kind::Union { .. } => { info.is_union = true; TypeKind::Union }
        };
        info.is_primitive = !(info.is_maybe
            || info.is_subtype
            || info.is_enum
            || info.is_list
            || info.is_dict
            || info.is_union
            || info.is_refinement);
        info.is_object = info.is_subtype || info.is_dict;
        info
    }

    /// Subtype or refinement: carries a predicate beyond its inner shape.
    pub fn has_predicate(&self) -> bool { self.is_subtype || self.is_refinement }
}
