use super::validate;

#[test]
fn test_no_arguments_accepts_anything() {
    let result = validate(&[], "");
    assert!(result.is_ok());
    assert!(result.errors().is_empty());
    assert!(validate(&[], "{ not json").is_ok());
}

#[test]
fn test_single_argument_bare_value() {
    let result = validate(&["nat"], "5");
    assert!(result.is_ok());
    assert_eq!(result.errors(), &[] as &[String]);
}

#[test]
fn test_single_argument_wrong_kind() {
    let result = validate(&["nat"], "\"five\"");
    assert!(!result.is_ok());
    assert_eq!(result.errors(), &["(root) expected number".to_string()]);
}

#[test]
fn test_single_argument_wrapped_in_array() {
    assert!(validate(&["text"], r#"["hello"]"#).is_ok());
    assert!(validate(&["record { a : nat }"], r#"[{"a": 1}]"#).is_ok());
    // the bare value is tried first
    assert!(validate(&["vec nat"], "[7]").is_ok());
    assert!(validate(&["vec nat"], "[[7, 8]]").is_ok());
}

#[test]
fn test_single_argument_wrapped_but_wrong_reports_bare_errors() {
    let result = validate(&["text"], "[1]");
    assert_eq!(result.errors(), &["(root) expected string".to_string()]);
}

#[test]
fn test_multiple_arguments_arity_mismatch() {
    let result = validate(&["text", "nat"], r#"["a"]"#);
    assert!(!result.is_ok());
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0], "(root) expected 2 arguments, got 1");

    let result = validate(&["text", "nat"], r#"["a", 1, 2]"#);
    assert_eq!(result.errors()[0], "(root) expected 2 arguments, got 3");
}

#[test]
fn test_multiple_arguments_require_array() {
    let result = validate(&["text", "nat"], r#"{"a": 1}"#);
    assert_eq!(
        result.errors(),
        &["(root) expected a JSON array of 2 arguments, got object".to_string()]
    );
}

#[test]
fn test_multiple_arguments_checked_by_position() {
    assert!(validate(&["text", "nat"], r#"["a", 1]"#).is_ok());

    let result = validate(&["text", "nat", "bool"], r#"[1, "b", true]"#);
    assert_eq!(
        result.errors(),
        &[
            "arg0 expected string".to_string(),
            "arg1 expected number".to_string()
        ]
    );
}

#[test]
fn test_invalid_json_short_circuits() {
    let result = validate(&["text", "nat"], "[\"a\", ");
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].starts_with("invalid JSON:"));

    let result = validate(&["nat"], "");
    assert_eq!(result.errors().len(), 1);
    assert!(result.errors()[0].starts_with("invalid JSON:"));
}

#[test]
fn test_result_display() {
    assert_eq!(validate(&["nat"], "1").to_string(), "ok");
    assert_eq!(
        validate(&["text", "nat"], "[1, true]").to_string(),
        "arg0 expected string\narg1 expected number"
    );
}
