mod arity_tests;

use super::*;

fn validate(types: &[&str], json: &str) -> ValidationResult {
    CandidJsonValidator::from_type_strings(types).validate(json)
}
