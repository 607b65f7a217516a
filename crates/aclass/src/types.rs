//! Derived types
//!
//! A [`Type`] pairs a shared prototype with a table of type-level (static)
//! members. Types are created by [`Realm::derive`](crate::Realm::derive).

use crate::definition::{Body, Definition};
use crate::error::{Error, Result};
use crate::function::Function;
use crate::object::Object;
use crate::value::Value;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// A derived definition: shared prototype plus static members
#[derive(Clone)]
pub struct Type(Arc<TypeInner>);

pub(crate) struct TypeInner {
    id: u64,
    name: String,
    parent: Option<Type>,
    prototype: Object,
    statics: RwLock<IndexMap<String, Value>>,
}

/// Outcome of constructing a type
///
/// `init` may hand back a different value (a cached instance, say), in
/// which case the freshly allocated object is discarded.
#[derive(Debug, Clone)]
pub enum Constructed {
    /// The newly allocated instance
    New(Object),

    /// Value returned by `init` in place of the new instance
    Existing(Value),
}

impl Constructed {
    /// The resulting value, whichever variant
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::New(object) => Value::Object(object),
            Self::Existing(value) => value,
        }
    }

    /// Resulting object, if it is one
    #[must_use]
    pub fn into_object(self) -> Option<Object> {
        match self {
            Self::New(object) | Self::Existing(Value::Object(object)) => Some(object),
            Self::Existing(_) => None,
        }
    }

    /// Check if a new instance was produced
    #[inline]
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

impl Type {
    pub(crate) fn create(name: String, parent: Option<Type>, prototype: Object) -> Self {
        Self(Arc::new_cyclic(|weak: &Weak<TypeInner>| {
            prototype.bind_owner(weak.clone());
            TypeInner {
                id: NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed),
                name,
                parent,
                prototype,
                statics: RwLock::new(IndexMap::new()),
            }
        }))
    }

    pub(crate) fn upgrade(weak: &Weak<TypeInner>) -> Option<Self> {
        weak.upgrade().map(Self)
    }

    /// Unique id within the process
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Diagnostic name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Parent type, `None` for types derived from the root
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&Type> {
        self.0.parent.as_ref()
    }

    /// Shared prototype of all instances
    #[inline]
    #[must_use]
    pub fn prototype(&self) -> &Object {
        &self.0.prototype
    }

    /// Prototype `super` resolves to: the parent's, or the realm root
    #[must_use]
    pub fn super_prototype(&self) -> Option<&Object> {
        self.0.prototype.prototype()
    }

    /// Derive a child type
    ///
    /// # Errors
    /// See [`Realm::derive`](crate::Realm::derive)
    pub fn derive(&self, body: impl Into<Body>) -> Result<Type> {
        self.0.prototype.realm()?.derive(Some(self), body)
    }

    /// Allocate an instance without initializing it
    ///
    /// # Errors
    /// `RealmDropped` if the realm is gone
    pub fn allocate(&self) -> Result<Object> {
        Object::with_prototype(&self.0.prototype)
    }

    /// Run `init` on `instance` unless it already ran
    ///
    /// # Errors
    /// `NotCallable` if `init` is data, otherwise whatever `init` returns
    pub fn initialize(&self, instance: &Object, args: &[Value]) -> Result<Constructed> {
        if !instance.claim_init() {
            return Ok(Constructed::New(instance.clone()));
        }
        match instance.get("init") {
            Value::Undefined => Ok(Constructed::New(instance.clone())),
            Value::Function(init) => {
                match init.call(&Value::Object(instance.clone()), args)? {
                    Value::Undefined => Ok(Constructed::New(instance.clone())),
                    replacement => Ok(Constructed::Existing(replacement)),
                }
            }
            other => Err(Error::NotCallable {
                member: "init".to_string(),
                found: other.type_name(),
            }),
        }
    }

    /// Construct with explicit allocation
    ///
    /// # Errors
    /// See [`Type::initialize`]
    pub fn instantiate(&self, args: &[Value]) -> Result<Constructed> {
        let instance = self.allocate()?;
        self.initialize(&instance, args)
    }

    /// Construct by plain invocation
    ///
    /// Behaves exactly like [`Type::instantiate`]; safe to call from inside
    /// this type's own `init`.
    ///
    /// # Errors
    /// See [`Type::initialize`]
    pub fn call(&self, args: &[Value]) -> Result<Constructed> {
        self.instantiate(args)
    }

    /// Call the parent's implementation of `member` on `receiver`
    ///
    /// # Errors
    /// `MissingImplementation` if no ancestor defines it
    pub fn super_call(&self, receiver: &Value, member: &str, args: &[Value]) -> Result<Value> {
        let inherited = self
            .super_prototype()
            .map(|proto| proto.get(member))
            .unwrap_or_default();
        match inherited {
            Value::Function(f) => f.call(receiver, args),
            Value::Undefined => Err(Error::missing(member)),
            other => Err(Error::NotCallable {
                member: member.to_string(),
                found: other.type_name(),
            }),
        }
    }

    /// Check if this type is `other` or derives from it
    #[must_use]
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty.ptr_eq(other) {
                return true;
            }
            current = ty.parent();
        }
        false
    }

    /// Install a definition on the prototype
    ///
    /// # Errors
    /// See [`Object::extend`]
    pub fn extend(&self, definition: Definition) -> Result<Self> {
        self.0.prototype.extend(definition)?;
        Ok(self.clone())
    }

    /// Apply a named modifier on the prototype
    ///
    /// # Errors
    /// See [`Object::modify`]
    pub fn modify(&self, modifier: &str, member: &str, supplied: impl Into<Value>) -> Result<Self> {
        self.0.prototype.modify(modifier, member, supplied)?;
        Ok(self.clone())
    }

    /// `before` on the prototype
    ///
    /// # Errors
    /// See [`Object::modify`]
    pub fn before(&self, member: &str, f: Function) -> Result<Self> {
        self.modify("before", member, f)
    }

    /// `after` on the prototype
    ///
    /// # Errors
    /// See [`Object::modify`]
    pub fn after(&self, member: &str, f: Function) -> Result<Self> {
        self.modify("after", member, f)
    }

    /// `around` on the prototype
    ///
    /// # Errors
    /// See [`Object::modify`]
    pub fn around(&self, member: &str, f: Function) -> Result<Self> {
        self.modify("around", member, f)
    }

    /// `augment` on the prototype
    ///
    /// # Errors
    /// See [`Object::modify`]
    pub fn augment(&self, member: &str, f: Function) -> Result<Self> {
        self.modify("augment", member, f)
    }

    /// Define a type-level member through the `static` modifier
    ///
    /// Functions are bound to the prototype.
    ///
    /// # Errors
    /// See [`Object::modify`]
    pub fn static_member(&self, member: &str, value: impl Into<Value>) -> Result<Self> {
        self.modify("static", member, value)
    }

    /// Type-level member
    #[must_use]
    pub fn get_static(&self, name: &str) -> Option<Value> {
        self.0.statics.read().get(name).cloned()
    }

    /// Set a type-level member directly
    pub fn set_static(&self, name: &str, value: impl Into<Value>) {
        self.0.statics.write().insert(name.to_string(), value.into());
    }

    /// Invoke a type-level member
    ///
    /// Static members are tried first. `extend` takes an object whose own
    /// members form the definition. Registered modifier names fall back to
    /// the prototype's installer, `(member, supplied)`. Both return this type
    /// for chaining.
    ///
    /// # Errors
    /// `MissingImplementation` if nothing handles `name`
    pub fn call_static(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self.get_static(name) {
            Some(Value::Function(f)) => f.call(&Value::Type(self.clone()), args),
            Some(other) => Err(Error::NotCallable {
                member: name.to_string(),
                found: other.type_name(),
            }),
            None if name == "extend" => {
                let source = crate::value::arg(args, 0);
                let source = source.as_object().ok_or_else(|| {
                    Error::InvalidArgument("`extend` expects an object of members".to_string())
                })?;
                let definition = source
                    .own_keys()
                    .into_iter()
                    .filter_map(|key| source.get_own(&key).map(|value| (key, value)))
                    .collect::<Definition>();
                self.extend(definition)?;
                Ok(Value::Type(self.clone()))
            }
            None => {
                let realm = self.0.prototype.realm()?;
                if !realm.registry().contains(name) {
                    return Err(Error::missing(name));
                }
                let member = crate::value::arg(args, 0);
                let member = member.as_str().ok_or_else(|| {
                    Error::InvalidArgument(format!("`{name}` expects a member name"))
                })?;
                self.modify(name, member, crate::value::arg(args, 1))?;
                Ok(Value::Type(self.clone()))
            }
        }
    }

    /// Identity comparison
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Type) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Type")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("parent", &self.0.parent.as_ref().map(Type::name))
            .finish()
    }
}
