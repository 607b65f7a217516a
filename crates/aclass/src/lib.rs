//! aclass
//!
//! Single inheritance over explicit prototype chains, with method modifiers
//! that rewrite members at definition time.
//!
//! # Core Concepts
//!
//! - [`Type`]: shared prototype plus type-level members, created by [`derive`]
//! - [`Object`]: member table with a prototype link (instances, prototypes)
//! - [`Value`] / [`Function`]: dynamic values; functions take their receiver explicitly
//! - [`Definition`]: ordered member map; keys may be tagged `modifier$member`
//! - [`Modifier`]: combinator turning an existing member into a replacement
//! - [`Realm`]: root prototype, [`ModifierRegistry`] and [`RealmConfig`]
//!
//! # Example
//!
//! ```rust,ignore
//! use aclass::{derive, Definition, Value};
//!
//! let base = derive(None, Definition::new()
//!     .method("greet", |_, args| Ok(Value::from(format!("hi {}", args[0])))))?;
//!
//! let loud = base.derive(Definition::new()
//!     .method("around$greet", |_, args| {
//!         let greeting = args[0].call(&args[1..])?;
//!         Ok(Value::from(format!("{greeting}!")))
//!     }))?;
//!
//! let instance = loud.call(&[])?.into_value();
//! assert_eq!(instance.call_method("greet", &["bob".into()])?, "hi bob!".into());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod augment;
mod config;
mod definition;
mod error;
mod extend;
mod function;
mod modifier;
mod object;
mod realm;
mod types;
mod value;

// Re-exports
pub use config::RealmConfig;
pub use definition::{Body, Definition};
pub use error::{Error, Result};
pub use function::Function;
pub use modifier::{
    After, Around, Augment, Before, Modifier, ModifierContext, ModifierRegistry, Static,
};
pub use object::Object;
pub use realm::Realm;
pub use types::{Constructed, Type};
pub use value::{arg, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Derive a type in the process-wide realm
///
/// # Errors
/// See [`Realm::derive`]
pub fn derive(parent: Option<&Type>, body: impl Into<Body>) -> Result<Type> {
    Realm::global().derive(parent, body)
}

/// Register a modifier in the process-wide realm
///
/// Last registration for a name wins; there is no unregister.
pub fn register_modifier(name: &str, modifier: impl Modifier + 'static) {
    Realm::global().register_modifier(name, modifier);
}
