//! Built-in modifiers: `before`, `after`, `around`, `augment`, `static`

use super::{Modifier, ModifierContext};
use crate::augment;
use crate::error::{Error, Result};
use crate::function::Function;
use crate::value::Value;

/// Run the supplied function, then the original, with the same arguments
///
/// The wrapper returns `Undefined`; only `around` and `augment` propagate a
/// result.
#[derive(Debug, Clone, Copy, Default)]
pub struct Before;

/// Run the original, then the supplied function, with the same arguments
///
/// Mirror image of [`Before`]; the wrapper returns `Undefined`.
#[derive(Debug, Clone, Copy, Default)]
pub struct After;

/// Hand the supplied function the receiver-bound original as first argument
///
/// The supplied function decides whether and how often the original runs.
/// Its return value is the wrapper's return value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Around;

/// Insert the supplied function as the next inner level of a chain
///
/// The outer (older) level controls when the inner (more derived) one runs
/// by calling the `inner` continuation it receives as first argument.
#[derive(Debug, Clone, Copy, Default)]
pub struct Augment;

/// Define a type-level member bound to the prototype
#[derive(Debug, Clone, Copy, Default)]
pub struct Static;

fn sequence(name: &str, first: Function, second: Function) -> Function {
    Function::new(name, move |this, args| {
        first.call(this, args)?;
        second.call(this, args)?;
        Ok(Value::Undefined)
    })
}

impl Modifier for Before {
    fn apply(
        &self,
        cx: &ModifierContext<'_>,
        existing: Function,
        supplied: Value,
    ) -> Result<Option<Value>> {
        let supplied = supplied.into_function(cx.member())?;
        Ok(Some(sequence(cx.member(), supplied, existing).into()))
    }
}

impl Modifier for After {
    fn apply(
        &self,
        cx: &ModifierContext<'_>,
        existing: Function,
        supplied: Value,
    ) -> Result<Option<Value>> {
        let supplied = supplied.into_function(cx.member())?;
        Ok(Some(sequence(cx.member(), existing, supplied).into()))
    }
}

impl Modifier for Around {
    fn apply(
        &self,
        cx: &ModifierContext<'_>,
        existing: Function,
        supplied: Value,
    ) -> Result<Option<Value>> {
        let supplied = supplied.into_function(cx.member())?;
        let wrapper = Function::new(cx.member(), move |this, args| {
            let mut call_args = Vec::with_capacity(args.len() + 1);
            call_args.push(Value::Function(existing.bind(this.clone())));
            call_args.extend_from_slice(args);
            supplied.call(this, &call_args)
        });
        Ok(Some(wrapper.into()))
    }
}

impl Modifier for Augment {
    fn apply(
        &self,
        cx: &ModifierContext<'_>,
        existing: Function,
        supplied: Value,
    ) -> Result<Option<Value>> {
        let supplied = supplied.into_function(cx.member())?;
        let wrapper = augment::wrap(
            cx.member(),
            existing,
            supplied,
            cx.config().max_augment_depth,
        );
        Ok(Some(wrapper.into()))
    }
}

impl Modifier for Static {
    fn apply(
        &self,
        cx: &ModifierContext<'_>,
        _existing: Function,
        supplied: Value,
    ) -> Result<Option<Value>> {
        let ty = cx.target().owner_type().ok_or_else(|| Error::NotAPrototype {
            member: cx.member().to_string(),
        })?;
        let member = match supplied {
            Value::Function(f) => Value::Function(f.bind(Value::Object(cx.target().clone()))),
            data => data,
        };
        ty.set_static(cx.member(), member);
        Ok(None)
    }
}
