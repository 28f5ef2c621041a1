//! Type coercion of raw test inputs
//!
//! Test cases store every input as text. Before an invocation each raw string
//! is converted into a typed JSON value according to its declaration, so the
//! entry point receives `[2, 7, 11, 15]` rather than `"[2,7,11,15]"`.

use serde_json::{Number, Value};
use thiserror::Error;
use tracing::debug;

use crate::manifest::{Manifest, ParamType, ParameterSpec};
use crate::request::FunctionArg;

/// A raw input that does not lex as its declared type.
///
/// Scoped to a single test case; the batch carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {expected} for '{param}' at index {index}: {reason}")]
pub struct CoercionError {
    /// 0-indexed input position
    pub index: usize,
    /// Declared parameter name
    pub param: String,
    /// Declared type tag
    pub expected: String,
    /// What went wrong
    pub reason: String,
}

/// How the inputs of every case in a batch are converted
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentPlan {
    /// Free-form convention: manifest inputs, return marker already filtered out
    Manifest(Vec<ParameterSpec>),

    /// Named-function convention: declared argument names and optional tags
    Declared(Vec<FunctionArg>),
}

impl ArgumentPlan {
    pub fn from_manifest(manifest: &Manifest) -> Self {
        ArgumentPlan::Manifest(manifest.inputs().cloned().collect())
    }

    /// Number of raw inputs each case must supply
    pub fn arity(&self) -> usize {
        match self {
            ArgumentPlan::Manifest(params) => params.len(),
            ArgumentPlan::Declared(args) => args.len(),
        }
    }

    /// Coerce one case's raw inputs, stopping at the first failure
    pub fn coerce(&self, raw: &[String]) -> Result<Vec<Value>, CoercionError> {
        match self {
            ArgumentPlan::Manifest(params) => params
                .iter()
                .zip(raw)
                .enumerate()
                .map(|(index, (spec, raw))| coerce(index, spec, raw))
                .collect(),
            ArgumentPlan::Declared(args) => args
                .iter()
                .zip(raw)
                .enumerate()
                .map(|(index, (arg, raw))| coerce_declared(index, arg, raw))
                .collect(),
        }
    }
}

/// Coerce a raw input according to its manifest entry
pub fn coerce(index: usize, spec: &ParameterSpec, raw: &str) -> Result<Value, CoercionError> {
    let value = coerce_as(spec.kind, spec.element_type(), raw).map_err(|reason| CoercionError {
        index,
        param: spec.name.clone(),
        expected: spec.kind.tag().to_string(),
        reason,
    })?;

    if let (Value::Array(items), Some(size)) = (&value, spec.array_props.as_ref().and_then(|p| p.size))
        && items.len() != size
    {
        debug!(
            param = %spec.name,
            declared = size,
            actual = items.len(),
            "array length differs from declared size"
        );
    }

    Ok(value)
}

/// Coerce a raw input for a named-function argument.
///
/// Tagged arguments go through the same rules as manifest entries, with
/// `number` accepted as an integer-or-float tag. Untagged arguments are
/// passed through as JSON when the text is valid JSON, or as a string.
pub fn coerce_declared(index: usize, arg: &FunctionArg, raw: &str) -> Result<Value, CoercionError> {
    let Some(tag) = arg.kind.as_deref().map(str::trim) else {
        return Ok(preserve(raw));
    };

    let error = |reason: String| CoercionError {
        index,
        param: arg.name.clone(),
        expected: tag.to_string(),
        reason,
    };

    if tag == "number" {
        return parse_integer(raw)
            .map(Value::from)
            .or_else(|_| parse_float(raw))
            .map_err(error);
    }

    match ParamType::from_tag(tag) {
        Some(kind) if !kind.is_return_marker() => coerce_as(kind, None, raw).map_err(error),
        _ => {
            debug!(arg = %arg.name, tag, "unrecognised argument type, passing input through");
            Ok(preserve(raw))
        }
    }
}

fn coerce_as(kind: ParamType, element: Option<ParamType>, raw: &str) -> Result<Value, String> {
    match kind {
        ParamType::String | ParamType::Character => Ok(Value::String(raw.to_owned())),
        ParamType::Integer | ParamType::Long => parse_integer(raw).map(Value::from),
        ParamType::Float | ParamType::Double => parse_float(raw),
        ParamType::Boolean => Ok(Value::Bool(raw.trim().eq_ignore_ascii_case("true"))),
        ParamType::Array => parse_array(raw, element),
        ParamType::Return => Err("return marker does not accept input".to_string()),
    }
}

fn parse_integer(raw: &str) -> Result<i64, String> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| format!("\"{raw}\" is not an integer ({e})"))
}

fn parse_float(raw: &str) -> Result<Value, String> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("\"{raw}\" is not a number ({e})"))?;
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| format!("\"{raw}\" is not a finite number"))
}

fn parse_array(raw: &str, element: Option<ParamType>) -> Result<Value, String> {
    let parsed: Value =
        serde_json::from_str(raw.trim()).map_err(|e| format!("malformed array literal: {e}"))?;

    let Value::Array(items) = parsed else {
        return Err(format!("\"{raw}\" is not an array"));
    };

    match element {
        Some(ParamType::Integer | ParamType::Long) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                element_to_integer(item)
                    .map(Value::from)
                    .ok_or_else(|| format!("element {i} ({item}) is not an integer"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        _ => Ok(Value::Array(items)),
    }
}

/// Integral numbers pass, other numbers truncate toward zero, numeric strings parse
fn element_to_integer(item: &Value) -> Option<i64> {
    match item {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn preserve(raw: &str) -> Value {
    serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_owned()))
}
