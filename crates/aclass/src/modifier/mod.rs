//! Method modifiers
//!
//! A [`Modifier`] turns the current implementation of a member into a
//! replacement at definition time. Built-ins live in [`builtin`], lookup by
//! name in [`ModifierRegistry`].

use crate::config::RealmConfig;
use crate::error::Result;
use crate::function::Function;
use crate::object::Object;
use crate::value::Value;

mod builtin;
mod registry;

pub use builtin::{After, Around, Augment, Before, Static};
pub use registry::ModifierRegistry;

/// Combinator applied when a `modifier$member` entry is installed
///
/// Closures `Fn(existing, supplied, member) -> Result<Value>` implement this
/// trait and always install their result.
pub trait Modifier: Send + Sync {
    /// Produce the replacement for `cx.member()`
    ///
    /// `existing` is the implementation being wrapped: a sibling entry of
    /// the same definition, the target's own member, a delegate to the
    /// inherited one, or a stub that fails when called.
    ///
    /// # Returns
    /// - `Some(value)` to install `value` (callable or plain data)
    /// - `None` to leave the target untouched
    ///
    /// # Errors
    /// Aborts the surrounding `extend`
    fn apply(&self, cx: &ModifierContext<'_>, existing: Function, supplied: Value)
        -> Result<Option<Value>>;
}

impl<F> Modifier for F
where
    F: Fn(Function, Value, &str) -> Result<Value> + Send + Sync,
{
    fn apply(
        &self,
        cx: &ModifierContext<'_>,
        existing: Function,
        supplied: Value,
    ) -> Result<Option<Value>> {
        self(existing, supplied, cx.member()).map(Some)
    }
}

/// Where a modifier is being applied
#[derive(Debug, Clone, Copy)]
pub struct ModifierContext<'a> {
    target: &'a Object,
    modifier: &'a str,
    member: &'a str,
    config: &'a RealmConfig,
}

impl<'a> ModifierContext<'a> {
    pub(crate) fn new(
        target: &'a Object,
        modifier: &'a str,
        member: &'a str,
        config: &'a RealmConfig,
    ) -> Self {
        Self {
            target,
            modifier,
            member,
            config,
        }
    }

    /// Object receiving the member (a prototype or an instance)
    #[inline]
    #[must_use]
    pub fn target(&self) -> &'a Object {
        self.target
    }

    /// Name the modifier was registered under
    #[inline]
    #[must_use]
    pub fn modifier(&self) -> &'a str {
        self.modifier
    }

    /// Member being defined
    #[inline]
    #[must_use]
    pub fn member(&self) -> &'a str {
        self.member
    }

    /// Configuration of the target's realm
    #[inline]
    #[must_use]
    pub fn config(&self) -> &'a RealmConfig {
        self.config
    }
}
