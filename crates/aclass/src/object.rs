//! Objects: member tables linked into prototype chains
//!
//! The same [`Object`] handle represents a type's shared prototype, a
//! standalone instance, and the realm root. Lookup walks the chain
//! explicitly, one prototype link at a time.

use crate::augment::{self, StackEntry};
use crate::definition::Definition;
use crate::error::{Error, Result};
use crate::extend;
use crate::function::Function;
use crate::realm::{Realm, RealmInner};
use crate::types::{Type, TypeInner};
use crate::value::Value;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Handle to a member table with an optional prototype link
#[derive(Clone)]
pub struct Object(Arc<ObjectData>);

struct ObjectData {
    /// Chain parent; `None` only for a realm root
    proto: Option<Object>,

    /// Own members in insertion order
    members: RwLock<IndexMap<String, Value>>,

    /// Bookkeeping of running augment chains, created on first use
    augment_stack: OnceCell<Mutex<Vec<StackEntry>>>,

    /// One-shot initialization sentinel
    init_claimed: AtomicBool,

    /// Type whose shared prototype this is
    owner: OnceCell<Weak<TypeInner>>,

    realm: RealmLink,
}

/// Roots hold their realm weakly (the realm owns them), everything else strongly
enum RealmLink {
    Root(Weak<RealmInner>),
    Member(Realm),
}

impl Object {
    pub(crate) fn root(realm: Weak<RealmInner>) -> Self {
        Self::build(None, RealmLink::Root(realm))
    }

    /// Create object whose lookups fall through to `proto`
    ///
    /// # Errors
    /// `RealmDropped` if `proto` outlived its realm
    pub fn with_prototype(proto: &Object) -> Result<Self> {
        let realm = proto.realm()?;
        Ok(Self::build(Some(proto.clone()), RealmLink::Member(realm)))
    }

    fn build(proto: Option<Object>, realm: RealmLink) -> Self {
        Self(Arc::new(ObjectData {
            proto,
            members: RwLock::new(IndexMap::new()),
            augment_stack: OnceCell::new(),
            init_claimed: AtomicBool::new(false),
            owner: OnceCell::new(),
            realm,
        }))
    }

    /// Prototype this object delegates to
    #[inline]
    #[must_use]
    pub fn prototype(&self) -> Option<&Object> {
        self.0.proto.as_ref()
    }

    /// Realm this object belongs to
    ///
    /// # Errors
    /// `RealmDropped` if the realm no longer exists
    pub fn realm(&self) -> Result<Realm> {
        match &self.0.realm {
            RealmLink::Root(weak) => Realm::upgrade(weak).ok_or(Error::RealmDropped),
            RealmLink::Member(realm) => Ok(realm.clone()),
        }
    }

    /// Look up a member along the prototype chain
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        let mut current = Some(self);
        while let Some(object) = current {
            if let Some(value) = object.get_own(name) {
                return value;
            }
            current = object.prototype();
        }
        Value::Undefined
    }

    /// Look up an own member only
    #[must_use]
    pub fn get_own(&self, name: &str) -> Option<Value> {
        self.0.members.read().get(name).cloned()
    }

    /// Check if this object itself holds `name`
    #[inline]
    #[must_use]
    pub fn has_own(&self, name: &str) -> bool {
        self.0.members.read().contains_key(name)
    }

    /// Check if `name` resolves anywhere in the chain
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(object) = current {
            if object.has_own(name) {
                return true;
            }
            current = object.prototype();
        }
        false
    }

    /// Set an own member, shadowing anything inherited
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        self.0.members.write().insert(name.to_string(), value.into());
    }

    /// Remove an own member, uncovering the inherited one
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.0.members.write().shift_remove(name)
    }

    /// Own member names in insertion order
    #[must_use]
    pub fn own_keys(&self) -> Vec<String> {
        self.0.members.read().keys().cloned().collect()
    }

    /// Invoke a member with this object as receiver
    ///
    /// # Errors
    /// `MissingImplementation` if the member is absent, `NotCallable` if it
    /// is data, otherwise whatever the member returns
    pub fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self.get(name) {
            Value::Function(f) => f.call(&Value::Object(self.clone()), args),
            Value::Undefined => Err(Error::missing(name)),
            other => Err(Error::NotCallable {
                member: name.to_string(),
                found: other.type_name(),
            }),
        }
    }

    /// Install a definition onto this object
    ///
    /// Plain keys are assigned in order. Tagged keys wrap, in order of
    /// preference, the plain entry of the same definition, this object's
    /// own member, or the inherited one (resolved at call time). Entries
    /// before a failing one stay installed.
    ///
    /// # Errors
    /// `UnknownModifier` for an unregistered tag, or whatever a modifier
    /// reports
    pub fn extend(&self, definition: Definition) -> Result<Self> {
        extend::extend(self, &definition)?;
        Ok(self.clone())
    }

    /// Apply a named modifier to one member
    ///
    /// Same as extending with the single entry `modifier$member`.
    ///
    /// # Errors
    /// `UnknownModifier` if the modifier is not registered, or whatever the
    /// modifier reports
    pub fn modify(&self, modifier: &str, member: &str, supplied: impl Into<Value>) -> Result<Self> {
        extend::apply_modifier(self, modifier, member, supplied.into())?;
        Ok(self.clone())
    }

    /// Run `f` before the current implementation of `member`
    ///
    /// # Errors
    /// See [`Object::modify`]
    pub fn before(&self, member: &str, f: Function) -> Result<Self> {
        self.modify("before", member, f)
    }

    /// Run `f` after the current implementation of `member`
    ///
    /// # Errors
    /// See [`Object::modify`]
    pub fn after(&self, member: &str, f: Function) -> Result<Self> {
        self.modify("after", member, f)
    }

    /// Wrap `member` so `f` receives the bound original as first argument
    ///
    /// # Errors
    /// See [`Object::modify`]
    pub fn around(&self, member: &str, f: Function) -> Result<Self> {
        self.modify("around", member, f)
    }

    /// Add `f` as the next inner level of `member`
    ///
    /// # Errors
    /// See [`Object::modify`]
    pub fn augment(&self, member: &str, f: Function) -> Result<Self> {
        self.modify("augment", member, f)
    }

    /// Check if `ty`'s prototype is on this object's chain
    #[must_use]
    pub fn isa(&self, ty: &Type) -> bool {
        let target = ty.prototype();
        let mut current = self.prototype();
        while let Some(object) = current {
            if object.ptr_eq(target) {
                return true;
            }
            current = object.prototype();
        }
        false
    }

    /// Type this object is an instance of (nearest owned prototype)
    #[must_use]
    pub fn type_of(&self) -> Option<Type> {
        let mut current = self.prototype();
        while let Some(object) = current {
            if let Some(ty) = object.owner_type() {
                return Some(ty);
            }
            current = object.prototype();
        }
        None
    }

    /// Type this object is the shared prototype of
    #[must_use]
    pub fn owner_type(&self) -> Option<Type> {
        self.0.owner.get().and_then(Type::upgrade)
    }

    pub(crate) fn bind_owner(&self, owner: Weak<TypeInner>) {
        // a prototype belongs to exactly one type
        let _ = self.0.owner.set(owner);
    }

    /// Mark initialization as done; `true` only for the first caller
    pub(crate) fn claim_init(&self) -> bool {
        !self.0.init_claimed.swap(true, Ordering::AcqRel)
    }

    /// Number of augment levels waiting for `inner`, across all running chains
    #[must_use]
    pub fn augment_depth(&self) -> usize {
        self.0
            .augment_stack
            .get()
            .map_or(0, |stack| augment::pending_levels(&stack.lock()))
    }

    /// Run `f` on the augment stack, creating it on first use
    ///
    /// The lock is held only for the duration of `f`, never across user code.
    pub(crate) fn with_augment_stack<R>(&self, f: impl FnOnce(&mut Vec<StackEntry>) -> R) -> R {
        let mut stack = self
            .0
            .augment_stack
            .get_or_init(|| Mutex::new(Vec::new()))
            .lock();
        f(&mut stack)
    }

    /// Own data members as a JSON object; functions and references are skipped
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let members = self.0.members.read();
        let map = members
            .iter()
            .filter(|(_, value)| {
                matches!(value, Value::Bool(_) | Value::Number(_) | Value::Str(_) | Value::Null)
            })
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Identity comparison
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // members may point back at this object, so only the keys are shown
        f.debug_struct("Object")
            .field("id", &Arc::as_ptr(&self.0))
            .field("keys", &self.own_keys())
            .finish()
    }
}
