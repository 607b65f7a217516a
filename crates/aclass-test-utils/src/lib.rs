//! Testing utilities for aclass workspace
//!
//! Shared test helpers, fixtures, and assertions.

#![allow(missing_docs)]

use aclass::{Body, Function, Object, Realm, Result, Type, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Install a test subscriber honoring `RUST_LOG`; later calls are no-ops
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn realm() -> Realm {
    init_tracing();
    Realm::new()
}

pub fn text(value: &Value) -> String {
    match value {
        Value::Str(s) => s.to_string(),
        Value::Undefined => String::new(),
        other => other.to_string(),
    }
}

pub fn text_arg(args: &[Value], index: usize) -> String {
    text(&aclass::arg(args, index))
}

pub fn number(value: &Value) -> f64 {
    value.as_number().unwrap_or(f64::NAN)
}

/// Call a continuation (bound original or `inner`) with one string argument
pub fn continue_with(continuation: &Value, input: String) -> Result<String> {
    continuation.call(&[Value::from(input)]).map(|out| text(&out))
}

pub fn instance(ty: &Type, args: &[Value]) -> Object {
    ty.call(args)
        .expect("construction failed")
        .into_object()
        .expect("init replaced the instance")
}

/// Initializer storing its first argument as `prop`
pub fn prop_init() -> Body {
    Body::init(|this, args| {
        this.set("prop", aclass::arg(args, 0))?;
        Ok(Value::Undefined)
    })
}

/// Initializer bumping `counter` on every run
pub fn counting_init(counter: &Arc<AtomicUsize>) -> Function {
    let counter = Arc::clone(counter);
    Function::new("init", move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Undefined)
    })
}
