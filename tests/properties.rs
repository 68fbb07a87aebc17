use candid_args::{
    build_example, resolve_arg_types, validate, CandidType, CandidTypeResolver, Field, FieldLabel,
    Primitive,
};
use proptest::prelude::*;
use serde_json::Value;

fn leaf() -> impl Strategy<Value = CandidType> {
    prop_oneof![
        proptest::sample::select(Primitive::ALL.to_vec()).prop_map(CandidType::Primitive),
        Just(CandidType::Blob),
        Just(CandidType::Named("Unresolved".to_string())),
    ]
}

/// Arbitrary finite Candid types with distinct record labels and variant tags.
fn candid_type() -> impl Strategy<Value = CandidType> {
    leaf().prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(CandidType::opt),
            inner.clone().prop_map(CandidType::vec),
            proptest::collection::btree_map("[a-z][a-z0-9_]{0,6}", inner.clone(), 0..4).prop_map(
                |fields| {
                    CandidType::Record(
                        fields
                            .into_iter()
                            .map(|(name, ty)| Field::named(&name, ty))
                            .collect(),
                    )
                }
            ),
            proptest::collection::vec(inner.clone(), 1..4).prop_map(|types| {
                CandidType::Record(
                    types
                        .into_iter()
                        .enumerate()
                        .map(|(i, ty)| Field::new(FieldLabel::Unnamed(i as u32), ty))
                        .collect(),
                )
            }),
            proptest::collection::btree_map("[A-Z][A-Za-z]{0,6}", inner, 1..4).prop_map(|tags| {
                CandidType::Variant(
                    tags.into_iter()
                        .map(|(tag, ty)| Field::named(&tag, ty))
                        .collect(),
                )
            }),
        ]
    })
}

fn type_strings(types: &[CandidType]) -> Vec<String> {
    types.iter().map(ToString::to_string).collect()
}

proptest! {
    /// Whatever the builder produces, the validator accepts.
    #[test]
    fn example_always_validates(types in proptest::collection::vec(candid_type(), 0..4)) {
        let raw = type_strings(&types);
        let example = build_example(&raw);
        let result = validate(&raw, &example);
        prop_assert!(result.is_ok(), "{} rejected for {:?}: {:?}", example, raw, result.errors());
    }

    #[test]
    fn wrong_arity_is_rejected(
        types in proptest::collection::vec(candid_type(), 2..5),
        shrink in any::<bool>(),
    ) {
        let raw = type_strings(&types);
        let mut values = match serde_json::from_str::<Value>(&build_example(&raw)) {
            Ok(Value::Array(values)) => values,
            other => panic!("expected an argument array, got {:?}", other),
        };
        if shrink {
            values.pop();
        } else {
            values.push(Value::Null);
        }
        let result = validate(&raw, &Value::Array(values).to_string());
        prop_assert!(!result.is_ok());
    }

    #[test]
    fn null_is_accepted_for_opt_positions(
        types in proptest::collection::vec(candid_type(), 1..4),
        pick in any::<proptest::sample::Index>(),
    ) {
        let mut types = types;
        let position = pick.index(types.len());
        types[position] = CandidType::opt(types[position].clone());
        let raw = type_strings(&types);

        let example: Value = serde_json::from_str(&build_example(&raw)).unwrap();
        let with_null = match example {
            Value::Array(mut values) if raw.len() > 1 => {
                values[position] = Value::Null;
                Value::Array(values)
            }
            _ => Value::Null,
        };
        let result = validate(&raw, &with_null.to_string());
        prop_assert!(result.is_ok(), "{:?}", result.errors());
    }

    #[test]
    fn resolution_preserves_order(picks in proptest::collection::vec((any::<bool>(), 0usize..4), 0..8)) {
        let source = "type A0 = nat; type A1 = text; type A2 = vec bool; type A3 = opt int8;";
        let expansions = ["nat", "text", "vec bool", "opt int8"];
        let plain = ["principal", "float64", "blob", "null"];

        let raw: Vec<String> = picks
            .iter()
            .map(|(alias, k)| if *alias { format!("A{}", k) } else { plain[*k].to_string() })
            .collect();
        let resolved = resolve_arg_types(source, &raw);

        prop_assert_eq!(resolved.len(), raw.len());
        for ((alias, k), out) in picks.iter().zip(&resolved) {
            let expected = if *alias { expansions[*k] } else { plain[*k] };
            prop_assert_eq!(out.as_str(), expected);
        }
    }
}

#[test]
fn self_referential_alias_terminates() {
    let resolver = CandidTypeResolver::new("type A = record { next : A }; type B = vec B;");
    assert_eq!(
        resolver.resolve_arg_types(&["A", "B"]),
        vec!["record { next : A }".to_string(), "vec B".to_string()]
    );
    // the leftover reference is still a usable example and validates
    let example = build_example(&resolver.resolve_arg_types(&["A"]));
    assert!(validate(&["record { next : A }"], &example).is_ok());
}
