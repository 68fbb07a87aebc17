use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};
use strsim::damerau_levenshtein;

use crate::candid_types::{is_tuple_record, CandidType, Field, Primitive};
use crate::type_string_parser::parse_type_string;

static PRINCIPAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z2-7]{1,5}(-[a-z2-7]{1,5})*$").expect("principal pattern compiles")
});

const MAX_DIST: usize = 1;

/// Outcome of checking a JSON text against argument types. It is ok iff there are no errors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    errors: Vec<String>,
}

impl ValidationResult {
    pub fn accepted() -> Self {
        Self::default()
    }

    pub fn from_errors(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            f.write_str("ok")
        } else {
            f.write_str(&self.errors.join("\n"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Arg(usize),
    Field(String),
    Index(usize),
}

/// Location of a value inside the argument JSON, rendered like `arg0.to[2]` or `(root).to`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JsonPath(Vec<PathSegment>);

impl JsonPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    fn field(&self, name: &str) -> Self {
        self.child(PathSegment::Field(name.to_string()))
    }

    fn index(&self, idx: usize) -> Self {
        self.child(PathSegment::Index(idx))
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // positional arguments name themselves; anything else hangs off the single root value
        if !matches!(self.0.first(), Some(PathSegment::Arg(_))) {
            f.write_str("(root)")?;
        }
        for segment in &self.0 {
            match segment {
                PathSegment::Arg(n) => write!(f, "arg{}", n)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(n) => write!(f, "[{}]", n)?,
            }
        }
        Ok(())
    }
}

/// Checks user-edited JSON against the resolved argument types of a method.
#[derive(Debug, Clone, Default)]
pub struct CandidJsonValidator {
    arg_types: Vec<CandidType>,
}

impl CandidJsonValidator {
    pub fn new(arg_types: Vec<CandidType>) -> Self {
        Self { arg_types }
    }

    /// Type strings that do not parse are kept as `Unknown` and accept anything.
    pub fn from_type_strings<S: AsRef<str>>(arg_types: &[S]) -> Self {
        Self::new(
            arg_types
                .iter()
                .map(|raw| {
                    let raw = raw.as_ref();
                    parse_type_string(raw).unwrap_or_else(|e| {
                        debug!("{}; it will not be checked", e);
                        CandidType::Unknown(raw.to_string())
                    })
                })
                .collect(),
        )
    }

    pub fn arg_types(&self) -> &[CandidType] {
        &self.arg_types
    }

    pub fn validate(&self, json_text: &str) -> ValidationResult {
        if self.arg_types.is_empty() {
            return ValidationResult::accepted();
        }
        match serde_json::from_str::<Value>(json_text) {
            Ok(value) => self.validate_value(&value),
            Err(e) => ValidationResult::from_errors(vec![format!("invalid JSON: {}", e)]),
        }
    }

    pub fn validate_value(&self, value: &Value) -> ValidationResult {
        let mut errors = Vec::new();
        match self.arg_types.as_slice() {
            [] => {}
            [single] => {
                check(single, value, &JsonPath::root(), &mut errors);
                if !errors.is_empty() && unwraps_to_valid(single, value) {
                    errors.clear();
                }
            }
            many => match value {
                Value::Array(items) if items.len() == many.len() => {
                    for (i, (ty, item)) in many.iter().zip(items).enumerate() {
                        check(ty, item, &JsonPath::root().child(PathSegment::Arg(i)), &mut errors);
                    }
                }
                Value::Array(items) => report(
                    &mut errors,
                    &JsonPath::root(),
                    format!("expected {} arguments, got {}", many.len(), items.len()),
                ),
                other => report(
                    &mut errors,
                    &JsonPath::root(),
                    format!(
                        "expected a JSON array of {} arguments, got {}",
                        many.len(),
                        kind_of(other)
                    ),
                ),
            },
        }
        ValidationResult::from_errors(errors)
    }
}

/// A single argument may also be written as a one-element array.
fn unwraps_to_valid(ty: &CandidType, value: &Value) -> bool {
    match value {
        Value::Array(items) if items.len() == 1 => {
            let mut errors = Vec::new();
            check(ty, &items[0], &JsonPath::root(), &mut errors);
            errors.is_empty()
        }
        _ => false,
    }
}

fn report(errors: &mut Vec<String>, path: &JsonPath, message: impl fmt::Display) {
    errors.push(format!("{} {}", path, message));
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check(ty: &CandidType, value: &Value, path: &JsonPath, errors: &mut Vec<String>) {
    match ty {
        CandidType::Primitive(p) => check_primitive(*p, value, path, errors),
        CandidType::Opt(inner) => {
            if !value.is_null() {
                check(inner, value, path, errors);
            }
        }
        CandidType::Vec(inner) => match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    check(inner, item, &path.index(i), errors);
                }
            }
            _ => report(errors, path, "expected array"),
        },
        CandidType::Blob => match value {
            Value::String(_) => {}
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_primitive(Primitive::Nat8, item, &path.index(i), errors);
                }
            }
            _ => report(errors, path, "expected string or array of nat8"),
        },
        CandidType::Record(fields) => check_record(fields, value, path, errors),
        CandidType::Variant(fields) => check_variant(fields, value, path, errors),
        CandidType::Func(_) | CandidType::Service(_) | CandidType::Named(_) | CandidType::Unknown(_) => {
            debug!("{}: accepting value for '{}' without checking", path, ty);
        }
    }
}

fn check_primitive(p: Primitive, value: &Value, path: &JsonPath, errors: &mut Vec<String>) {
    match p {
        Primitive::Text => {
            if !value.is_string() {
                report(errors, path, "expected string");
            }
        }
        Primitive::Principal => match value {
            Value::String(s) if PRINCIPAL_RE.is_match(s) => {}
            Value::String(s) => report(errors, path, format!("expected principal, got '{}'", s)),
            _ => report(errors, path, "expected principal string"),
        },
        Primitive::Bool => {
            if !value.is_boolean() {
                report(errors, path, "expected boolean");
            }
        }
        Primitive::Null => {
            if !value.is_null() {
                report(errors, path, "expected null");
            }
        }
        // nothing inhabits empty, so there is nothing to check against
        Primitive::Reserved | Primitive::Empty => {}
        number => match value {
            Value::Number(n) => check_number(number, n, path, errors),
            _ => report(errors, path, "expected number"),
        },
    }
}

fn check_number(p: Primitive, n: &Number, path: &JsonPath, errors: &mut Vec<String>) {
    if p.is_float() {
        return;
    }
    let integral = n
        .as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
        .or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i128)
        });
    let Some(v) = integral else {
        report(errors, path, "expected integer");
        return;
    };
    if p.is_unsigned() && v < 0 {
        report(errors, path, "expected non-negative integer");
        return;
    }
    if let Some((min, max)) = p.bounds() {
        if v < min || v > max {
            report(errors, path, format!("value out of range for {}", p));
        }
    }
}

fn check_record(fields: &[Field], value: &Value, path: &JsonPath, errors: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for field in fields {
                let key = field.label.key();
                match map.get(&key) {
                    Some(v) => check(&field.ty, v, &path.field(&key), errors),
                    None if field.ty.is_optional() => {}
                    None => report(
                        errors,
                        path,
                        format!(
                            "missing required field '{}'{}",
                            key,
                            suggestion(&key, undeclared_keys(fields, map))
                        ),
                    ),
                }
            }
        }
        Value::Array(items) if is_tuple_record(fields) => {
            for (i, field) in fields.iter().enumerate() {
                match items.get(i) {
                    Some(v) => check(&field.ty, v, &path.index(i), errors),
                    None if field.ty.is_optional() => {}
                    None => report(errors, path, format!("missing tuple element {}", i)),
                }
            }
        }
        other => report(errors, path, format!("expected object, got {}", kind_of(other))),
    }
}

fn check_variant(fields: &[Field], value: &Value, path: &JsonPath, errors: &mut Vec<String>) {
    if fields.is_empty() {
        debug!("{}: variant without tags has no values; not checking", path);
        return;
    }
    let find = |tag: &str| fields.iter().find(|field| field.label.key() == tag);

    match value {
        Value::Object(map) if map.len() == 1 => {
            let Some((tag, payload)) = map.iter().next() else {
                return;
            };
            match find(tag.as_str()) {
                Some(field) => check(&field.ty, payload, &path.field(tag), errors),
                None => report(errors, path, unknown_tag(tag, fields)),
            }
        }
        Value::Object(map) => report(
            errors,
            path,
            format!("expected exactly one variant tag, found {}", map.len()),
        ),
        // a bare tag name stands for a unit tag without payload
        Value::String(tag) => match find(tag.as_str()) {
            Some(field) if field.ty.is_unit() => {}
            Some(_) => report(errors, path, format!("variant tag '{}' requires a payload", tag)),
            None => report(errors, path, unknown_tag(tag, fields)),
        },
        other => report(
            errors,
            path,
            format!("expected object with one variant tag, got {}", kind_of(other)),
        ),
    }
}

fn unknown_tag(tag: &str, fields: &[Field]) -> String {
    let tags: Vec<String> = fields.iter().map(|field| field.label.key()).collect();
    format!(
        "unknown variant tag '{}', expected one of: {}{}",
        tag,
        tags.join(", "),
        suggestion(tag, tags.iter().map(String::as_str))
    )
}

fn undeclared_keys<'a>(
    fields: &'a [Field],
    map: &'a Map<String, Value>,
) -> impl Iterator<Item = &'a str> + 'a {
    map.keys()
        .map(String::as_str)
        .filter(move |key| !fields.iter().any(|field| field.label.key() == *key))
}

fn suggestion<'a>(wanted: &str, candidates: impl Iterator<Item = &'a str>) -> String {
    candidates
        .filter(|candidate| *candidate != wanted)
        .find(|candidate| damerau_levenshtein(candidate, wanted) <= MAX_DIST)
        .map(|candidate| format!(" (did you mean '{}'?)", candidate))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests;
