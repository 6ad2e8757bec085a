//! Edit-buffer ⇄ domain value conversion.
//!
//! `format` turns a domain value into what an editor shows, `parse` goes the
//! other way and may fail. Each form owns its own [`Transformers`] table;
//! overriding an entry in one form can't leak into another.

use std::fmt;
use std::rc::Rc;

use serde_json::{Number, Value};

use crate::types::builtins;

pub type FormatFn = Rc<dyn Fn(&Value) -> Value>;
pub type ParseFn = Rc<dyn Fn(&Value) -> Result<Value, TransformError>>;

/// Parse failure. Carries a message when the parser had something to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError(pub Option<String>);

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self { Self(Some(message.into())) }

    pub fn message(&self) -> Option<&str> { self.0.as_deref() }
}

#[derive(Clone)]
pub struct Transformer {
    pub format: FormatFn,
    pub parse: ParseFn,
}

impl Transformer {
    pub fn new(
        format: impl Fn(&Value) -> Value + 'static,
        parse: impl Fn(&Value) -> Result<Value, TransformError> + 'static,
    ) -> Self {
        Self { format: Rc::new(format), parse: Rc::new(parse) }
    }

    pub fn format(&self, v: &Value) -> Value { (self.format)(v) }

    pub fn parse(&self, v: &Value) -> Result<Value, TransformError> { (self.parse)(v) }

    pub fn identity() -> Self { Self::new(Value::clone, |v| Ok(v.clone())) }

    /// Text boxes: `null` shows as `""`, and blank text parses back to
    /// `null`. Anything else parses to itself.
    pub fn text() -> Self {
        Self::new(
            |v| match v {
                Value::Null => Value::String(String::new()),
                Value::String(_) => v.clone(),
                other => Value::String(other.to_string()),
            },
            |v| match v {
                Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
                _ => Ok(v.clone()),
            },
        )
    }

    /// Numeric text boxes. `""` parses to `null`; integers stay integers.
    pub fn number() -> Self {
        Self::new(
            |v| match v {
                Value::Null => Value::String(String::new()),
                Value::Number(n) => Value::String(n.to_string()),
                other => other.clone(),
            },
            |v| match v {
                Value::Null => Ok(Value::Null),
                Value::Number(_) => Ok(v.clone()),
                Value::String(s) => parse_number(s),
                other => Err(TransformError::new(format!("{other} is not a number"))),
            },
        )
    }

    pub fn checkbox() -> Self {
        Self::new(
            |v| if v.is_null() { Value::Bool(false) } else { v.clone() },
            |v| Ok(v.clone()),
        )
    }

    /// Selects: the null option carries the empty string.
    pub fn select() -> Self {
        Self::new(
            |v| if v.is_null() { Value::String(String::new()) } else { v.clone() },
            |v| match v {
                Value::String(s) if s.is_empty() => Ok(Value::Null),
                _ => Ok(v.clone()),
            },
        )
    }

    /// Date pickers: canonical ISO text through `chrono`.
    pub fn date() -> Self {
        Self::new(Value::clone, |v| match v {
            Value::Null => Ok(Value::Null),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => builtins::parse_temporal(s)
                .map(Value::String)
                .ok_or_else(|| TransformError::new(format!("\"{s}\" is not a valid date"))),
            other => Err(TransformError::new(format!("{other} is not a valid date"))),
        })
    }
}

fn parse_number(s: &str) -> Result<Value, TransformError> {
    let t = s.trim();
    if t.is_empty() {
        return Ok(Value::Null);
    }
    if let Ok(i) = t.parse::<i64>() {
        return Ok(Value::Number(i.into()));
    }
    if let Ok(u) = t.parse::<u64>() {
        return Ok(Value::Number(u.into()));
    }
    t.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| TransformError::new(format!("\"{s}\" is not a valid number")))
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Transformer { .. }") }
}

/// Per-form defaults, looked up by the leaf components.
#[derive(Debug, Clone)]
pub struct Transformers {
    pub identity: Transformer,
    pub text: Transformer,
    pub number: Transformer,
    pub checkbox: Transformer,
    pub select: Transformer,
    pub date: Transformer,
}

impl Default for Transformers {
    fn default() -> Self {
        Self {
            identity: Transformer::identity(),
            text: Transformer::text(),
            number: Transformer::number(),
            checkbox: Transformer::checkbox(),
            select: Transformer::select(),
            date: Transformer::date(),
        }
    }
}
