use std::io::Write;

use candid_args::{
    build_example, validate, CandidInterface, CandidJsonValidator, CandidParseError,
    CandidTypeResolver,
};
use serde_json::{json, Value};

const LEDGER_DID: &str = r#"
type Subaccount = blob;
type Tokens = nat;
type Account = record { owner : principal; subaccount : opt Subaccount };

// ICRC-1 style transfer
type TransferArg = record {
    from_subaccount : opt Subaccount;
    to : Account;
    amount : Tokens;
    fee : opt Tokens;
    memo : opt blob;
    created_at_time : opt nat64;
};

type TransferError = variant {
    BadFee : record { expected_fee : Tokens };
    InsufficientFunds : record { balance : Tokens };
    TooOld;
    TemporarilyUnavailable;
    GenericError : record { error_code : nat; message : text };
};

type TransferResult = variant { Ok : Tokens; Err : TransferError };

service : {
    icrc1_name : () -> (text) query;
    icrc1_balance_of : (Account) -> (Tokens) query;
    icrc1_transfer : (TransferArg) -> (TransferResult);
    approve : (spender : Account, amount : Tokens, expires_at : opt nat64) -> (TransferResult);
}
"#;

fn ledger_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".did")
        .tempfile()
        .unwrap();
    file.write_all(LEDGER_DID.as_bytes()).unwrap();
    file
}

#[test]
fn test_resolver_from_file_lists_methods() {
    let file = ledger_file();
    let resolver = CandidTypeResolver::from_file(file.path()).unwrap();
    assert_eq!(
        resolver.method_names(),
        vec!["icrc1_name", "icrc1_balance_of", "icrc1_transfer", "approve"]
    );
    assert!(resolver.resolve_method("icrc1_name").unwrap().arg_types().is_empty());
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.did");
    match CandidTypeResolver::from_file(&missing) {
        Err(CandidParseError::Io { path, .. }) => assert!(path.ends_with("nope.did")),
        other => panic!("expected an I/O error, got {:?}", other),
    }
    assert!(CandidInterface::from_file(&missing).is_err());
}

#[test]
fn test_transfer_arguments_expand_fully() {
    let resolver = CandidTypeResolver::new(LEDGER_DID);
    let transfer = resolver.resolve_method("icrc1_transfer").unwrap();
    assert_eq!(
        transfer.arg_types(),
        vec![
            "record { from_subaccount : opt blob; to : record { owner : principal; subaccount : opt blob }; \
             amount : nat; fee : opt nat; memo : opt blob; created_at_time : opt nat64 }"
                .to_string()
        ]
    );
    assert!(transfer.result_types()[0].starts_with("variant { Ok : nat; Err : variant { BadFee"));
}

#[test]
fn test_example_seeds_a_valid_transfer() {
    let resolver = CandidTypeResolver::new(LEDGER_DID);
    let arg_types = resolver.resolve_method("icrc1_transfer").unwrap().arg_types();
    let example = build_example(&arg_types);

    let value: Value = serde_json::from_str(&example).unwrap();
    assert_eq!(
        value,
        json!({
            "from_subaccount": null,
            "to": { "owner": "aaaaa-aa", "subaccount": null },
            "amount": 0,
            "fee": null,
            "memo": null,
            "created_at_time": null
        })
    );
    assert!(validate(&arg_types, &example).is_ok());
}

#[test]
fn test_user_edits_are_checked() {
    let resolver = CandidTypeResolver::new(LEDGER_DID);
    let validator = CandidJsonValidator::from_type_strings(
        &resolver.resolve_method("icrc1_transfer").unwrap().arg_types(),
    );

    let edited = r#"{
        "to": { "owner": "ryjl3-tyaaa-aaaaa-aaaba-cai" },
        "amount": 1.5,
        "created_at_time": -1
    }"#;
    let result = validator.validate(edited);
    assert_eq!(
        result.errors(),
        &[
            "(root).amount expected integer".to_string(),
            "(root).created_at_time expected non-negative integer".to_string(),
        ]
    );

    let fixed = r#"{ "to": { "owner": "ryjl3-tyaaa-aaaaa-aaaba-cai" }, "amount": 100000 }"#;
    assert!(validator.validate(fixed).is_ok());
}

#[test]
fn test_named_arguments_validate_positionally() {
    let resolver = CandidTypeResolver::new(LEDGER_DID);
    let approve = resolver.resolve_method("approve").unwrap();
    let names: Vec<_> = approve.args.iter().map(|arg| arg.name.clone()).collect();
    assert_eq!(
        names,
        vec![
            Some("spender".to_string()),
            Some("amount".to_string()),
            Some("expires_at".to_string())
        ]
    );

    let arg_types = approve.arg_types();
    assert!(validate(&arg_types, &build_example(&arg_types)).is_ok());
    assert!(validate(&arg_types, r#"[{"owner": "aaaaa-aa"}, 5, null]"#).is_ok());

    let result = validate(&arg_types, r#"[{"owner": "aaaaa-aa"}, 5]"#);
    assert_eq!(result.errors(), &["(root) expected 3 arguments, got 2".to_string()]);

    let result = validate(&arg_types, r#"[{"ownr": "aaaaa-aa"}, "5", null]"#);
    assert_eq!(
        result.errors(),
        &[
            "arg0 missing required field 'owner' (did you mean 'ownr'?)".to_string(),
            "arg1 expected number".to_string(),
        ]
    );
}

#[test]
fn test_variant_results_validate() {
    let resolver = CandidTypeResolver::new(LEDGER_DID);
    let results = resolver.resolve_method("icrc1_transfer").unwrap().result_types();

    assert!(validate(&results, r#"{"Ok": 12}"#).is_ok());
    assert!(validate(&results, r#"{"Err": "TooOld"}"#).is_ok());
    assert!(validate(&results, r#"{"Err": {"BadFee": {"expected_fee": 10}}}"#).is_ok());
    assert_eq!(
        validate(&results, r#"{"Err": {"GenericError": {"error_code": 1}}}"#).errors(),
        &["(root).Err.GenericError missing required field 'message'".to_string()]
    );
}
