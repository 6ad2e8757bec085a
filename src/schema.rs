//! JSON Schema → [`Type`].
//!
//! Covers the dialect an inferred schema typically uses: `type` (single or
//! array), `properties` / `required`, `items`, tuple-style `prefixItems`,
//! `enum`, `oneOf` / `anyOf` with a `null` arm for nullability, numeric and
//! length bounds, `pattern`, `format` (`uri`, `date`, `date-time`) and
//! `title`. Anything else is ignored rather than rejected.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{FormError, Result};
use crate::types::{builtins, Type};

static URI_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:\S+$").expect("static regex"));

pub fn looks_like_uri(s: &str) -> bool { URI_SCHEME.is_match(s) }

pub fn type_from_schema(schema: &Value) -> Result<Type> { convert(schema, "") }

fn fail(pointer: &str, reason: impl Into<String>) -> FormError {
    FormError::Schema { pointer: if pointer.is_empty() { "/".to_string() } else { pointer.to_string() }, reason: reason.into() }
}

fn convert(schema: &Value, pointer: &str) -> Result<Type> {
    let obj = match schema {
        Value::Object(obj) => obj,
        Value::Bool(true) => return Ok(builtins::any()),
        other => return Err(fail(pointer, format!("expected a schema object, found {other}"))),
    };
    let ty = match (obj.get("oneOf").or_else(|| obj.get("anyOf")), obj.get("type")) {
        (Some(Value::Array(arms)), _) => {
            let key = if obj.contains_key("oneOf") { "oneOf" } else { "anyOf" };
            alternatives(arms, &format!("{pointer}/{key}"))?
        }
        (Some(_), _) => return Err(fail(pointer, "oneOf/anyOf must be an array")),
        (None, Some(Value::Array(names))) => {
            let arms: Vec<Value> = names.iter().map(|n| with_type(obj, n.clone())).collect();
            alternatives(&arms, pointer)?
        }
        (None, Some(Value::String(name))) => by_name(name, obj, pointer)?,
        (None, Some(other)) => return Err(fail(pointer, format!("`type` must be a string or array, found {other}"))),
        (None, None) if obj.contains_key("enum") => by_name("string", obj, pointer)?,
        (None, None) if obj.contains_key("properties") => by_name("object", obj, pointer)?,
        (None, None) => builtins::any(),
    };
    Ok(match obj.get("title").and_then(Value::as_str) {
        Some(title) => ty.named(title),
        None => ty,
    })
}

/// `{"type": ["string", "null"], ...}` splits into one arm per type name.
fn with_type(obj: &Map<String, Value>, name: Value) -> Value {
    let mut arm = obj.clone();
    arm.insert("type".to_string(), name);
    arm.remove("title");
    Value::Object(arm)
}

fn is_null_arm(arm: &Value) -> bool { arm.get("type").and_then(Value::as_str) == Some("null") }

/// `null` arms become optionality; a single remaining arm is used as is.
fn alternatives(arms: &[Value], pointer: &str) -> Result<Type> {
    let nullable = arms.iter().any(is_null_arm);
    let mut members = Vec::new();
    for (i, arm) in arms.iter().enumerate() {
        if !is_null_arm(arm) {
            members.push(convert(arm, &format!("{pointer}/{i}"))?);
        }
    }
    let core = match members.len() {
        0 => return Ok(builtins::nil()),
        1 => members.remove(0),
        _ => Type::union(members),
    };
    Ok(if nullable { Type::maybe(core) } else { core })
}

fn by_name(name: &str, obj: &Map<String, Value>, pointer: &str) -> Result<Type> {
    match name {
        "string" => string(obj, pointer),
        "integer" => Ok(numeric(builtins::integer(), obj)),
        "number" => Ok(numeric(builtins::number(), obj)),
        "boolean" => Ok(builtins::boolean()),
        "null" => Ok(builtins::nil()),
        "any" => Ok(builtins::any()),
        "array" => array(obj, pointer),
        "object" => object(obj, pointer),
        other => Err(fail(pointer, format!("unknown type `{other}`"))),
    }
}

fn string(obj: &Map<String, Value>, pointer: &str) -> Result<Type> {
    if let Some(Value::Array(lits)) = obj.get("enum") {
        let keys: Vec<String> = lits.iter().filter_map(Value::as_str).map(str::to_string).collect();
        if keys.len() != lits.len() {
            return Err(fail(pointer, "only string enums are supported"));
        }
        return Ok(Type::enums_of(keys));
    }
    let base = match obj.get("format").and_then(Value::as_str) {
        Some("date") | Some("date-time") => return Ok(builtins::date()),
        Some("uri") => Type::refinement(builtins::string(), |v| v.as_str().is_some_and(looks_like_uri)).named("Uri"),
        _ => builtins::string(),
    };
    Ok(match obj.get("pattern").and_then(Value::as_str) {
        Some(pattern) => {
            let rx = Regex::new(pattern).map_err(|e| fail(&format!("{pointer}/pattern"), e.to_string()))?;
            Type::refinement(base, move |v| v.as_str().is_some_and(|s| rx.is_match(s)))
        }
        None => base,
    })
}

fn numeric(base: Type, obj: &Map<String, Value>) -> Type {
    let min = obj.get("minimum").and_then(Value::as_f64);
    let max = obj.get("maximum").and_then(Value::as_f64);
    let literals: Option<Vec<f64>> = obj
        .get("enum")
        .or_else(|| obj.get("enum_numbers"))
        .and_then(Value::as_array)
        .map(|xs| xs.iter().filter_map(Value::as_f64).collect());
    if min.is_none() && max.is_none() && literals.is_none() {
        return base;
    }
    Type::refinement(base, move |v| {
        let Some(n) = v.as_f64() else { return false };
        min.is_none_or(|m| n >= m)
            && max.is_none_or(|m| n <= m)
            && literals.as_ref().is_none_or(|xs| xs.contains(&n))
    })
}

fn array(obj: &Map<String, Value>, pointer: &str) -> Result<Type> {
    let item = match (obj.get("prefixItems"), obj.get("items")) {
        (Some(Value::Array(cols)), _) => {
            let mut members = Vec::with_capacity(cols.len());
            for (i, col) in cols.iter().enumerate() {
                members.push(convert(col, &format!("{pointer}/prefixItems/{i}"))?);
            }
            match members.len() {
                0 => builtins::any(),
                1 => members.remove(0),
                _ => Type::union(members),
            }
        }
        (_, Some(items)) => convert(items, &format!("{pointer}/items"))?,
        _ => builtins::any(),
    };
    let min = obj.get("minItems").and_then(Value::as_u64);
    let max = obj.get("maxItems").and_then(Value::as_u64);
    let list = Type::list(item);
    if min.is_none() && max.is_none() {
        return Ok(list);
    }
    Ok(Type::refinement(list, move |v| {
        let len = v.as_array().map_or(0, Vec::len) as u64;
        min.is_none_or(|m| len >= m) && max.is_none_or(|m| len <= m)
    }))
}

fn object(obj: &Map<String, Value>, pointer: &str) -> Result<Type> {
    let required: Vec<&str> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|xs| xs.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let mut props = Vec::new();
    if let Some(Value::Object(properties)) = obj.get("properties") {
        for (name, sub) in properties {
            let ty = convert(sub, &format!("{pointer}/properties/{}", name.replace('~', "~0").replace('/', "~1")))?;
            let ty = if required.contains(&name.as_str()) || ty.is_maybe() { ty } else { Type::maybe(ty) };
            props.push((name.clone(), ty));
        }
    }
    Ok(Type::structure(props))
}
