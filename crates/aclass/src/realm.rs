//! Realms: root prototype, modifier registry and configuration
//!
//! Every object belongs to exactly one realm. The process-wide realm behind
//! [`Realm::global`] is what the free functions [`crate::derive`] and
//! [`crate::register_modifier`] use; isolated realms are mostly for tests.

use crate::augment;
use crate::config::RealmConfig;
use crate::definition::Body;
use crate::error::{Error, Result};
use crate::function::Function;
use crate::modifier::{Modifier, ModifierRegistry};
use crate::object::Object;
use crate::types::Type;
use crate::value::{arg, Value};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::{Arc, Weak};

static GLOBAL: Lazy<Realm> = Lazy::new(Realm::new);

/// Owner of a root prototype and the modifiers available to its types
#[derive(Clone)]
pub struct Realm(Arc<RealmInner>);

pub(crate) struct RealmInner {
    config: RealmConfig,
    registry: ModifierRegistry,
    root: Object,
}

impl Realm {
    /// Create realm with default configuration and built-in modifiers
    #[must_use]
    pub fn new() -> Self {
        Self::build(RealmConfig::default())
    }

    /// Create realm with custom configuration
    ///
    /// # Errors
    /// `Config` if the configuration fails validation
    pub fn with_config(config: RealmConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Process-wide realm
    #[must_use]
    pub fn global() -> &'static Realm {
        &GLOBAL
    }

    fn build(config: RealmConfig) -> Self {
        let realm = Self(Arc::new_cyclic(|weak| RealmInner {
            config,
            registry: ModifierRegistry::with_builtins(),
            root: Object::root(weak.clone()),
        }));

        let root = realm.root();
        root.set("isa", Function::new("isa", isa));
        root.set("inner", Function::new("inner", augment::call_inner));
        for name in realm.registry().names() {
            root.set(&name, installer(&name));
        }
        realm
    }

    pub(crate) fn upgrade(weak: &Weak<RealmInner>) -> Option<Self> {
        weak.upgrade().map(Self)
    }

    /// Root prototype every chain ends at
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Object {
        &self.0.root
    }

    /// Registered modifiers
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ModifierRegistry {
        &self.0.registry
    }

    /// Realm configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RealmConfig {
        &self.0.config
    }

    /// Register a modifier and its installer member
    ///
    /// The installer `name(member, supplied)` is placed on the root
    /// prototype, so every existing and future type and instance gains it.
    /// Re-registering a name replaces the previous modifier.
    pub fn register_modifier(&self, name: &str, modifier: impl Modifier + 'static) {
        if self.registry().register(name, modifier).is_some() {
            tracing::warn!(modifier = name, "modifier replaced");
        } else {
            tracing::debug!(modifier = name, "modifier registered");
        }
        self.root().set(name, installer(name));
    }

    /// Derive a new type
    ///
    /// # Errors
    /// See [`Realm::derive_named`]
    pub fn derive(&self, parent: Option<&Type>, body: impl Into<Body>) -> Result<Type> {
        let name = match parent {
            Some(parent) => format!("{}+", parent.name()),
            None => "Type".to_string(),
        };
        self.derive_named(&name, parent, body)
    }

    /// Derive a new type with a diagnostic name
    ///
    /// The prototype chains to `parent`'s prototype (or the root), gets a
    /// `super` member pointing at it, and receives `body` through `extend`.
    ///
    /// # Errors
    /// - `InvalidArgument` if `parent` belongs to another realm
    /// - any error raised while extending with `body`
    pub fn derive_named(
        &self,
        name: &str,
        parent: Option<&Type>,
        body: impl Into<Body>,
    ) -> Result<Type> {
        let parent_proto = match parent {
            Some(parent) => {
                if !parent.prototype().realm()?.ptr_eq(self) {
                    return Err(Error::InvalidArgument(format!(
                        "parent `{}` belongs to another realm",
                        parent.name()
                    )));
                }
                parent.prototype().clone()
            }
            None => self.root().clone(),
        };

        let prototype = Object::with_prototype(&parent_proto)?;
        prototype.set("super", Value::Object(parent_proto));
        let ty = Type::create(name.to_string(), parent.cloned(), prototype);

        tracing::debug!(
            id = ty.id(),
            name,
            parent = parent.map(Type::name),
            "derived type"
        );

        ty.extend(body.into().into_definition())
    }

    /// Identity comparison
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Realm) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("config", &self.0.config)
            .field("registry", &self.0.registry)
            .finish_non_exhaustive()
    }
}

/// Root member `name(member, supplied)` applying the named modifier to the receiver
fn installer(name: &str) -> Function {
    let modifier = name.to_string();
    Function::new(name, move |this, args| {
        let member = arg(args, 0);
        let member = member.as_str().ok_or_else(|| {
            Error::InvalidArgument(format!("`{modifier}` expects a member name"))
        })?;
        match this {
            Value::Object(object) => {
                object.modify(&modifier, member, arg(args, 1))?;
            }
            Value::Type(ty) => {
                ty.modify(&modifier, member, arg(args, 1))?;
            }
            other => {
                return Err(Error::InvalidArgument(format!(
                    "`{modifier}` called on {}",
                    other.type_name()
                )))
            }
        }
        Ok(this.clone())
    })
}

/// Root member `isa(type)`
fn isa(this: &Value, args: &[Value]) -> Result<Value> {
    let candidate = arg(args, 0);
    let ty = candidate
        .as_type()
        .ok_or_else(|| Error::InvalidArgument("`isa` expects a type".to_string()))?;
    let result = match this {
        Value::Object(object) => object.isa(ty),
        Value::Type(own) => own.is_subtype_of(ty),
        _ => false,
    };
    Ok(Value::Bool(result))
}
