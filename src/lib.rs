//! Type-driven form composition and validation.
//!
//! A [`Type`] describes the shape of a value. [`Form`] turns a type, an
//! initial value and [`FieldOptions`] into a tree of fields, one per node,
//! each tracking its own touched / validated / error state and producing
//! render-ready [`Locals`] for whatever draws the widgets.
pub mod config;
pub mod ctx;
pub mod error;
pub mod field;
pub mod form;
pub mod options;
pub mod path;
pub mod path_de;
pub mod required;
pub mod resolver;
pub mod schema;
pub mod template;
pub mod transformer;
pub mod types;
pub mod uid;
pub mod validation;

pub use config::FormConfig;
pub use error::{FormError, Result};
pub use field::{Change, ChangeKind, Field, FieldEvent, Locals};
pub use form::{Form, FormBuilder};
pub use options::{DeclaredOptions, FieldOptions};
pub use path::{Path, PathSegment};
pub use resolver::Registry;
pub use schema::type_from_schema;
pub use types::{builtins, Type, TypeInfo};
pub use validation::{validate, ValidationError, ValidationResult};
