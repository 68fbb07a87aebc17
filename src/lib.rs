mod candid_types;
mod did_parser;
mod example_builder;
mod resolver;
mod type_string_parser;
mod validator;

pub use candid_types::{
    is_tuple_record, CandidType, Field, FieldLabel, FuncArg, FuncMode, FuncType, Method, Primitive,
};
pub use did_parser::{CandidInterface, CandidParseError, ServiceDecl};
pub use example_builder::{build_example, build_example_for, example_value};
pub use resolver::{CandidTypeResolver, MethodSignature, ResolvedArg, ResolverLimits};
pub use type_string_parser::{parse_type_string, TypeStringError};
pub use validator::{CandidJsonValidator, JsonPath, PathSegment, ValidationResult};

/// Expand the alias references in `raw_types` using the `type` declarations of `source`.
pub fn resolve_arg_types<S: AsRef<str>>(source: &str, raw_types: &[S]) -> Vec<String> {
    CandidTypeResolver::new(source).resolve_arg_types(raw_types)
}

/// Check `json_text` against resolved argument type strings.
pub fn validate<S: AsRef<str>>(arg_types: &[S], json_text: &str) -> ValidationResult {
    CandidJsonValidator::from_type_strings(arg_types).validate(json_text)
}
