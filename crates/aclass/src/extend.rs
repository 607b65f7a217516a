//! Bulk member installation
//!
//! Entries are installed in definition order. Plain keys are assigned;
//! tagged keys (`modifier$member`) are routed through the named modifier,
//! which receives the implementation it wraps:
//!
//! 1. the plain entry for the same member in this definition, else
//! 2. the target's own callable member, else
//! 3. a delegate to the target's prototype, resolved at call time, else
//! 4. a stub that fails when called (target has no prototype).
//!
//! Within one call each member is written at most once by a plain key and
//! wrapped at most once; later duplicates are skipped.

use crate::definition::{Definition, MemberKey};
use crate::error::{Error, Result};
use crate::function::Function;
use crate::modifier::ModifierContext;
use crate::object::Object;
use crate::value::Value;
use std::collections::HashSet;

/// Install every entry of `definition` on `target`
///
/// Entries before a failing one stay installed.
///
/// # Errors
/// - `UnknownModifier` if a tag names an unregistered modifier
/// - `RealmDropped` if the target's realm is gone
/// - whatever a modifier reports
pub(crate) fn extend(target: &Object, definition: &Definition) -> Result<()> {
    let realm = target.realm()?;
    let separator = realm.config().tag_separator;

    let mut written: HashSet<&str> = HashSet::new();
    let mut wrapped: HashSet<&str> = HashSet::new();

    for (key, value) in definition.iter() {
        let parsed = MemberKey::parse(key, separator);
        let member = parsed.member;

        let Some(modifier_name) = parsed.modifier else {
            if !written.insert(member) {
                tracing::trace!(member, "member already written, skipping");
                continue;
            }
            tracing::trace!(member, kind = value.type_name(), "install member");
            target.set(member, value.clone());
            continue;
        };

        if !wrapped.insert(member) {
            tracing::trace!(member, modifier = modifier_name, "member already wrapped, skipping");
            continue;
        }
        let existing = base_implementation(target, definition, member);
        install(target, modifier_name, member, existing, value.clone())?;
        written.insert(member);
    }

    Ok(())
}

/// Apply one modifier to one member, as `extend` does for a single tag
pub(crate) fn apply_modifier(
    target: &Object,
    modifier: &str,
    member: &str,
    supplied: Value,
) -> Result<()> {
    let existing = base_implementation(target, &Definition::new(), member);
    install(target, modifier, member, existing, supplied)
}

fn install(
    target: &Object,
    modifier_name: &str,
    member: &str,
    existing: Function,
    supplied: Value,
) -> Result<()> {
    let realm = target.realm()?;
    let modifier = realm
        .registry()
        .get(modifier_name)
        .ok_or_else(|| Error::UnknownModifier {
            modifier: modifier_name.to_string(),
            member: member.to_string(),
        })?;

    let cx = ModifierContext::new(target, modifier_name, member, realm.config());
    match modifier.apply(&cx, existing, supplied)? {
        Some(replacement) => {
            tracing::trace!(
                member,
                modifier = modifier_name,
                kind = replacement.type_name(),
                "install modified member"
            );
            target.set(member, replacement);
        }
        None => tracing::trace!(member, modifier = modifier_name, "modifier installed nothing"),
    }
    Ok(())
}

fn base_implementation(target: &Object, definition: &Definition, member: &str) -> Function {
    if let Some(Value::Function(sibling)) = definition.get(member) {
        return sibling.clone();
    }
    if let Some(Value::Function(own)) = target.get_own(member) {
        return own;
    }
    match target.prototype() {
        Some(proto) => Function::delegate(proto.clone(), member),
        None => Function::missing(member),
    }
}
