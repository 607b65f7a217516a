//! Callable values
//!
//! A [`Function`] always receives its receiver explicitly. Continuations
//! that must remember a receiver (the bound original of `around`, the
//! `inner` of `augment`) capture it with [`Function::bind`] at call time.

use crate::augment::{self, Link};
use crate::error::{Error, Result};
use crate::object::Object;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value> + Send + Sync;

/// Shared, identity-comparable callable
#[derive(Clone)]
pub struct Function(Arc<FunctionInner>);

struct FunctionInner {
    name: String,
    kind: FunctionKind,
}

enum FunctionKind {
    Native(Box<NativeFn>),

    /// Forwards to the value `member` has on `target` when called
    Delegate { target: Object, member: String },

    /// Nothing implements the member; fails on call
    Missing,

    /// One level of an augment chain over an older implementation
    Augment(Link),
}

impl Function {
    /// Create function from a closure taking `(receiver, args)`
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(FunctionInner {
            name: name.into(),
            kind: FunctionKind::Native(Box::new(f)),
        }))
    }

    /// Create a stub that looks up `member` on `target` at every call
    ///
    /// Later redefinitions of the member are observed.
    #[must_use]
    pub fn delegate(target: Object, member: impl Into<String>) -> Self {
        let member = member.into();
        Self(Arc::new(FunctionInner {
            name: member.clone(),
            kind: FunctionKind::Delegate { target, member },
        }))
    }

    /// Create a stub for a member nothing implements
    #[must_use]
    pub fn missing(member: impl Into<String>) -> Self {
        Self(Arc::new(FunctionInner {
            name: member.into(),
            kind: FunctionKind::Missing,
        }))
    }

    pub(crate) fn augmented(link: Link) -> Self {
        Self(Arc::new(FunctionInner {
            name: link.member().to_string(),
            kind: FunctionKind::Augment(link),
        }))
    }

    pub(crate) fn augment_link(&self) -> Option<&Link> {
        match &self.0.kind {
            FunctionKind::Augment(link) => Some(link),
            _ => None,
        }
    }

    /// Function name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Invoke with an explicit receiver
    ///
    /// # Errors
    /// Whatever the body returns; stubs fail with `MissingImplementation`
    /// or `NotCallable` when their target has no callable member
    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value> {
        match &self.0.kind {
            FunctionKind::Native(f) => f(this, args),
            FunctionKind::Delegate { target, member } => match target.get(member) {
                Value::Function(f) => f.call(this, args),
                Value::Undefined => Err(Error::missing(member.as_str())),
                other => Err(Error::NotCallable {
                    member: member.clone(),
                    found: other.type_name(),
                }),
            },
            FunctionKind::Missing => Err(Error::missing(self.0.name.as_str())),
            FunctionKind::Augment(link) => augment::run(link, this, args),
        }
    }

    /// Capture `receiver` so callers need not supply one
    ///
    /// A new function is created per binding, so no receiver slot is ever
    /// shared between calls.
    #[must_use]
    pub fn bind(&self, receiver: Value) -> Function {
        let target = self.clone();
        Function::new(self.name().to_string(), move |_, args| {
            target.call(&receiver, args)
        })
    }

    /// Concrete implementation this function currently stands for
    ///
    /// Natives and augment levels resolve to themselves, delegates to
    /// whatever the target member currently is, the missing stub to `None`.
    #[must_use]
    pub fn resolve(&self) -> Option<Function> {
        match &self.0.kind {
            FunctionKind::Native(_) | FunctionKind::Augment(_) => Some(self.clone()),
            FunctionKind::Delegate { target, member } => match target.get(member) {
                Value::Function(f) => f.resolve(),
                _ => None,
            },
            FunctionKind::Missing => None,
        }
    }

    /// Identity comparison
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.0.kind {
            FunctionKind::Native(_) => "native",
            FunctionKind::Delegate { .. } => "delegate",
            FunctionKind::Missing => "missing",
            FunctionKind::Augment(_) => "augment",
        };
        write!(f, "Function({} {kind})", self.0.name)
    }
}
