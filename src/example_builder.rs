use serde_json::{json, Map, Value};

use crate::candid_types::{is_tuple_record, CandidType, Primitive};
use crate::validator::CandidJsonValidator;

const TEXT_PLACEHOLDER: &str = "text";
/// Textual form of the management canister id, the shortest valid principal.
const PRINCIPAL_PLACEHOLDER: &str = "aaaaa-aa";

/// Example JSON text for a list of argument type strings.
///
/// No arguments give `[]`, one argument gives the bare value and several give an array.
pub fn build_example<S: AsRef<str>>(arg_types: &[S]) -> String {
    build_example_for(CandidJsonValidator::from_type_strings(arg_types).arg_types())
}

pub fn build_example_for(arg_types: &[CandidType]) -> String {
    let value = match arg_types {
        [single] => example_value(single),
        many => Value::Array(many.iter().map(example_value).collect()),
    };
    format!("{:#}", value)
}

/// Smallest value of `ty` that the validator accepts.
pub fn example_value(ty: &CandidType) -> Value {
    match ty {
        CandidType::Primitive(p) => primitive_example(*p),
        CandidType::Opt(_) => Value::Null,
        CandidType::Vec(inner) => Value::Array(vec![example_value(inner)]),
        CandidType::Blob => json!([0]),
        CandidType::Record(fields) if is_tuple_record(fields) => {
            Value::Array(fields.iter().map(|field| example_value(&field.ty)).collect())
        }
        CandidType::Record(fields) => Value::Object(
            fields
                .iter()
                .map(|field| (field.label.key(), example_value(&field.ty)))
                .collect::<Map<String, Value>>(),
        ),
        CandidType::Variant(fields) => match fields.first() {
            Some(field) => {
                let mut tag = Map::new();
                tag.insert(field.label.key(), example_value(&field.ty));
                Value::Object(tag)
            }
            None => Value::Null,
        },
        CandidType::Func(_) | CandidType::Service(_) | CandidType::Named(_) | CandidType::Unknown(_) => {
            Value::Null
        }
    }
}

fn primitive_example(p: Primitive) -> Value {
    match p {
        Primitive::Text => json!(TEXT_PLACEHOLDER),
        Primitive::Principal => json!(PRINCIPAL_PLACEHOLDER),
        Primitive::Bool => json!(false),
        Primitive::Null | Primitive::Reserved | Primitive::Empty => Value::Null,
        float if float.is_float() => json!(0.0),
        _ => json!(0),
    }
}
