//! Augment chain tests
//!
//! Oldest level runs first and controls the more derived ones through
//! `inner`. Pending levels are tracked per instance.

use aclass::{Definition, Function, Object, Realm, RealmConfig, Type, Value};
use aclass_test_utils::{continue_with, instance, realm, text, text_arg};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

/// Level that passes `x + pass` inward and appends `append` on the way out
fn level(pass: &'static str, append: &'static str) -> Function {
    Function::new("m", move |_, args| {
        let x = text_arg(args, 1);
        let inner = continue_with(&args[0], format!("{x}{pass}"))?;
        Ok(Value::from(format!("{inner}{append}")))
    })
}

fn augmented(parent: Option<&Type>, realm: &Realm, f: Function) -> Type {
    let definition = Definition::new().member("augment$m", f);
    let derived = match parent {
        Some(parent) => parent.derive(definition),
        None => realm.derive(None, definition),
    };
    derived.unwrap()
}

fn four_levels(realm: &Realm) -> Type {
    four_levels_with(realm, level("C", "G"))
}

/// Four-level chain with `second` as the level of the second type
fn four_levels_with(realm: &Realm, second: Function) -> Type {
    let a = augmented(None, realm, level("B", "H"));
    let b = augmented(Some(&a), realm, second);
    let c = augmented(Some(&b), realm, level("D", "F"));
    augmented(
        Some(&c),
        realm,
        Function::new("m", |_, args| Ok(Value::from(format!("{}E", text_arg(args, 1))))),
    )
}

#[test]
fn test_four_level_chain_runs_outside_in() {
    let realm = realm();
    let d = four_levels(&realm);
    let object = instance(&d, &[]);

    let out = object.call_method("m", &[Value::from("A")]).unwrap();
    assert_eq!(out, Value::from("ABCDEFGH"));
    assert_eq!(object.augment_depth(), 0);

    // a second call sees the same chain
    let again = object.call_method("m", &[Value::from("A")]).unwrap();
    assert_eq!(again, Value::from("ABCDEFGH"));
    assert_eq!(object.augment_depth(), 0);
}

#[test]
fn test_intermediate_types_run_partial_chains() {
    let realm = realm();
    let a = augmented(None, &realm, level("B", "H"));
    let b = augmented(Some(&a), &realm, level("C", "G"));

    let a_out = instance(&a, &[]).call_method("m", &[Value::from("A")]).unwrap();
    let b_out = instance(&b, &[]).call_method("m", &[Value::from("A")]).unwrap();

    // past the last level `inner` yields undefined
    assert_eq!(a_out, Value::from("H"));
    assert_eq!(b_out, Value::from("GH"));
}

#[test]
fn test_sibling_subtypes_are_isolated() {
    let realm = realm();
    let a = augmented(None, &realm, level("1", "!"));
    let b = augmented(
        Some(&a),
        &realm,
        Function::new("m", |_, args| Ok(Value::from(format!("{}b", text_arg(args, 1))))),
    );
    let c = augmented(
        Some(&a),
        &realm,
        Function::new("m", |_, args| Ok(Value::from(format!("{}c", text_arg(args, 1))))),
    );

    let b_instance = instance(&b, &[]);
    let c_instance = instance(&c, &[]);

    assert_eq!(
        b_instance.call_method("m", &[Value::from("x")]).unwrap(),
        Value::from("x1b!")
    );
    assert_eq!(
        c_instance.call_method("m", &[Value::from("x")]).unwrap(),
        Value::from("x1c!")
    );
    assert_eq!(
        instance(&a, &[]).call_method("m", &[Value::from("x")]).unwrap(),
        Value::from("!")
    );
}

#[test]
fn test_other_instance_called_mid_chain() {
    let realm = realm();
    let other_slot: Arc<Mutex<Option<Object>>> = Arc::default();
    let slot = Arc::clone(&other_slot);

    let d = four_levels_with(
        &realm,
        Function::new("m", move |this, args| {
            let x = text_arg(args, 1);
            let other = slot.lock().clone();
            let own = this.as_object();
            if let (Some(other), Some(own)) = (other, own) {
                if !other.ptr_eq(own) {
                    let nested = other.call_method("m", &[Value::from("A")])?;
                    assert_eq!(text(&nested), "ABCDEFGH");
                    assert_eq!(other.augment_depth(), 0);
                    // the two more derived levels are still pending here
                    assert_eq!(own.augment_depth(), 2);
                }
            }
            let inner = continue_with(&args[0], format!("{x}C"))?;
            Ok(Value::from(format!("{inner}G")))
        }),
    );

    let other = instance(&d, &[]);
    let object = instance(&d, &[]);
    *other_slot.lock() = Some(other.clone());

    let out = object.call_method("m", &[Value::from("A")]).unwrap();
    assert_eq!(out, Value::from("ABCDEFGH"));
    assert_eq!(object.augment_depth(), 0);
    assert_eq!(other.augment_depth(), 0);
}

#[test]
fn test_nested_member_does_not_reach_outer_levels() {
    let realm = realm();
    let a = realm
        .derive(
            None,
            Definition::new()
                .method("augment$m", |this, args| {
                    let nested = this.call_method("n", &[Value::from("n-arg")])?;
                    let rest = args[0].call(&[])?;
                    Ok(Value::from(format!("M1 n=[{}] rest=[{}]", text(&nested), text(&rest))))
                })
                .method("augment$n", |_, args| {
                    let inner = args[0].call(&[aclass::arg(args, 1)])?;
                    Ok(Value::from(format!("N inner={inner}")))
                }),
        )
        .unwrap();
    let b = a
        .derive(Definition::new().method("augment$m", |_, args| {
            Ok(Value::from(format!("M2({})", aclass::arg(args, 1))))
        }))
        .unwrap();

    let object = instance(&b, &[]);
    let out = object.call_method("m", &[]).unwrap();
    assert_eq!(out, Value::from("M1 n=[N inner=undefined] rest=[M2(undefined)]"));
    assert_eq!(object.augment_depth(), 0);
}

#[test]
fn test_two_augmented_members_nest() {
    let realm = realm();
    let a = realm
        .derive(
            None,
            Definition::new()
                .method("augment$m", |this, args| {
                    let nested = this.call_method("n", &[Value::from("n")])?;
                    let inner = continue_with(&args[0], format!("{}1", text_arg(args, 1)))?;
                    Ok(Value::from(format!("m<{inner}>{}", text(&nested))))
                })
                .method("augment$n", |_, args| {
                    let inner = continue_with(&args[0], format!("{}1", text_arg(args, 1)))?;
                    Ok(Value::from(format!("n<{inner}>")))
                }),
        )
        .unwrap();
    let b = a
        .derive(
            Definition::new()
                .method("augment$m", |_, args| Ok(Value::from(format!("{}2", text_arg(args, 1)))))
                .method("augment$n", |this, args| {
                    let depth = this.as_object().map_or(usize::MAX, Object::augment_depth);
                    Ok(Value::from(format!("{}2@{depth}", text_arg(args, 1))))
                }),
        )
        .unwrap();

    let object = instance(&b, &[]);
    assert_eq!(
        object.call_method("n", &[Value::from("x")]).unwrap(),
        Value::from("n<x12@0>")
    );
    // m's own level stays pending while n runs to completion
    assert_eq!(
        object.call_method("m", &[Value::from("x")]).unwrap(),
        Value::from("m<x12>n<n12@1>")
    );
    assert_eq!(object.augment_depth(), 0);
}

#[test]
fn test_inner_member_outside_a_base_is_undefined() {
    let realm = realm();
    let a = realm
        .derive(
            None,
            Definition::new()
                .method("peek", |this, _| this.call_method("inner", &[Value::from("stolen")]))
                .method("augment$m", |this, args| {
                    let peeked = this.call_method("peek", &[])?;
                    let inner = continue_with(&args[0], format!("{}1", text_arg(args, 1)))?;
                    Ok(Value::from(format!("{peeked}|{inner}")))
                }),
        )
        .unwrap();
    let b = a
        .derive(Definition::new().method("augment$m", |_, args| {
            Ok(Value::from(format!("{}2", text_arg(args, 1))))
        }))
        .unwrap();

    let object = instance(&b, &[]);
    assert_eq!(
        object.call_method("m", &[Value::from("x")]).unwrap(),
        Value::from("undefined|x12")
    );
    assert!(object.call_method("peek", &[]).unwrap().is_undefined());
    assert_eq!(object.augment_depth(), 0);
}

#[test]
fn test_reentrant_call_on_same_instance() {
    let realm = realm();
    let a = realm
        .derive(
            None,
            Definition::new().method("augment$m", |this, args| {
                let depth = text_arg(args, 1).len();
                let inner = continue_with(&args[0], String::new())?;
                if depth < 2 {
                    let nested = this.call_method("m", &[Value::from("#".repeat(depth + 1))])?;
                    return Ok(Value::from(format!("({inner}{})", text(&nested))));
                }
                Ok(Value::from(format!("({inner})")))
            }),
        )
        .unwrap();
    let b = a
        .derive(Definition::new().method("augment$m", |_, _| Ok(Value::from("b"))))
        .unwrap();

    let object = instance(&b, &[]);
    let out = object.call_method("m", &[Value::from("")]).unwrap();
    assert_eq!(out, Value::from("(b(b(b)))"));
    assert_eq!(object.augment_depth(), 0);
}

#[test]
fn test_inner_may_run_several_times_or_not_at_all() {
    let realm = realm();
    let a = realm
        .derive(
            None,
            Definition::new().method("augment$m", |_, args| {
                let times = text_arg(args, 1).len();
                let mut out = String::new();
                for _ in 0..times {
                    out.push_str(&continue_with(&args[0], String::new())?);
                }
                Ok(Value::from(format!("[{out}]")))
            }),
        )
        .unwrap();
    let b = a
        .derive(Definition::new().method("augment$m", |_, _| Ok(Value::from("b"))))
        .unwrap();
    let object = instance(&b, &[]);

    assert_eq!(
        object.call_method("m", &[Value::from("")]).unwrap(),
        Value::from("[]")
    );
    assert_eq!(
        object.call_method("m", &[Value::from("xxx")]).unwrap(),
        Value::from("[bbb]")
    );
    assert_eq!(object.augment_depth(), 0);
}

#[test]
fn test_plain_base_reaches_levels_through_inner_member() {
    let realm = realm();
    let a = realm
        .derive(
            None,
            Definition::new().method("m", |this, args| {
                let inner = this.call_method("inner", &[Value::from(format!("{}1", text_arg(args, 0)))])?;
                Ok(Value::from(format!("<{}>", text(&inner))))
            }),
        )
        .unwrap();
    let b = a
        .derive(Definition::new().method("augment$m", |_, args| {
            Ok(Value::from(format!("{}2", text_arg(args, 1))))
        }))
        .unwrap();

    assert_eq!(
        instance(&a, &[]).call_method("m", &[Value::from("x")]).unwrap(),
        Value::from("<>")
    );
    let object = instance(&b, &[]);
    assert_eq!(
        object.call_method("m", &[Value::from("x")]).unwrap(),
        Value::from("<x12>")
    );
    assert_eq!(object.augment_depth(), 0);
}

#[test]
fn test_depth_limit_from_config() {
    // a chain counts its pending levels plus one entry for the call itself
    let realm = Realm::with_config(RealmConfig::new().with_max_augment_depth(3)).unwrap();
    let d = four_levels(&realm);
    let c = d.parent().unwrap().clone();

    assert_eq!(
        instance(&c, &[]).call_method("m", &[Value::from("A")]).unwrap(),
        Value::from("FGH")
    );

    let object = instance(&d, &[]);
    let err = object.call_method("m", &[Value::from("A")]).unwrap_err();
    assert!(matches!(err, aclass::Error::AugmentDepthExceeded { limit: 3, .. }));
    assert_eq!(object.augment_depth(), 0);
}

#[test]
fn test_error_inside_chain_unwinds_stack() {
    let realm = realm();
    let a = augmented(None, &realm, level("B", "H"));
    let b = augmented(
        Some(&a),
        &realm,
        Function::new("m", |_, _| Err(aclass::Error::raise("level failed"))),
    );
    let c = augmented(Some(&b), &realm, level("D", "F"));
    let object = instance(&c, &[]);

    let err = object.call_method("m", &[Value::from("A")]).unwrap_err();
    assert_eq!(err, aclass::Error::raise("level failed"));
    assert_eq!(object.augment_depth(), 0);

    // the instance stays usable after the failure
    let err = object.call_method("m", &[Value::from("A")]).unwrap_err();
    assert_eq!(err, aclass::Error::raise("level failed"));
    assert_eq!(object.augment_depth(), 0);
}

fn expected(index: usize, levels: usize, calls: usize) -> String {
    if index == levels {
        return String::new();
    }
    format!("{index}[{}]", expected(index + 1, levels, calls).repeat(calls))
}

fn counting_level(index: usize, calls: usize) -> Function {
    Function::new("m", move |_, args| {
        let mut out = String::new();
        for _ in 0..calls {
            out.push_str(&continue_with(&args[0], String::new())?);
        }
        Ok(Value::from(format!("{index}[{out}]")))
    })
}

proptest! {
    #[test]
    fn prop_chain_output_and_balance(levels in 1usize..6, calls in 0usize..3) {
        let realm = realm();
        let mut ty = augmented(None, &realm, counting_level(0, calls));
        for index in 1..levels {
            ty = augmented(Some(&ty), &realm, counting_level(index, calls));
        }
        let object = instance(&ty, &[]);

        let out = object.call_method("m", &[]).unwrap();
        prop_assert_eq!(text(&out), expected(0, levels, calls));
        prop_assert_eq!(object.augment_depth(), 0);
    }
}
