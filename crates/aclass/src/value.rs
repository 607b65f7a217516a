//! Dynamic values stored in member tables and passed to members
//!
//! Provides [`Value`], the single currency of the object model.

use crate::error::{Error, Result};
use crate::function::Function;
use crate::object::Object;
use crate::types::Type;
use std::fmt;
use std::sync::Arc;

/// Dynamically typed value
///
/// Reference kinds (`Function`, `Object`, `Type`) compare by identity,
/// primitives by value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Undefined,

    /// Explicit empty value
    Null,

    /// Boolean
    Bool(bool),

    /// Double precision number
    Number(f64),

    /// Immutable string
    Str(Arc<str>),

    /// Callable
    Function(Function),

    /// Instance or prototype
    Object(Object),

    /// Derived type
    Type(Type),
}

impl Value {
    /// Short name of the value kind, used in diagnostics
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Function(_) => "function",
            Self::Object(_) => "object",
            Self::Type(_) => "type",
        }
    }

    /// Check for `Undefined`
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Check if value can be invoked
    #[inline]
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    /// Borrow as function
    #[inline]
    #[must_use]
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Borrow as object
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrow as type
    #[inline]
    #[must_use]
    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Self::Type(t) => Some(t),
            _ => None,
        }
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Read as number
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Read as bool
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert into function or report what was found instead
    ///
    /// # Errors
    /// `NotCallable` if the value is not a function
    pub fn into_function(self, member: &str) -> Result<Function> {
        match self {
            Self::Function(f) => Ok(f),
            other => Err(Error::NotCallable {
                member: member.to_string(),
                found: other.type_name(),
            }),
        }
    }

    /// Look up a member
    ///
    /// Objects walk their prototype chain, types read their static table.
    /// Everything else yields `Undefined`.
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        match self {
            Self::Object(o) => o.get(name),
            Self::Type(t) => t.get_static(name).unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    /// Set an own member on an object receiver
    ///
    /// # Errors
    /// `InvalidArgument` if the receiver is not an object
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        match self {
            Self::Object(o) => {
                o.set(name, value);
                Ok(())
            }
            Self::Type(t) => {
                t.set_static(name, value);
                Ok(())
            }
            other => Err(Error::InvalidArgument(format!(
                "cannot set `{name}` on {}",
                other.type_name()
            ))),
        }
    }

    /// Invoke a member with this value as receiver
    ///
    /// # Errors
    /// Propagates lookup and call errors
    pub fn call_method(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self {
            Self::Object(o) => o.call_method(name, args),
            Self::Type(t) => t.call_static(name, args),
            other => Err(Error::InvalidArgument(format!(
                "cannot call `{name}` on {}",
                other.type_name()
            ))),
        }
    }

    /// Invoke this value as a function without a receiver
    ///
    /// Used for continuations that carry their own receiver, such as the
    /// bound original handed to `around` or the `inner` of `augment`.
    ///
    /// # Errors
    /// `NotCallable` if the value is not a function
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match self {
            Self::Function(f) => f.call(&Value::Undefined, args),
            other => Err(Error::NotCallable {
                member: "<value>".to_string(),
                found: other.type_name(),
            }),
        }
    }

    /// Identity comparison
    #[must_use]
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Type(a), Self::Type(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Convert plain JSON data into a value
    ///
    /// Arrays and maps have no counterpart and become `Null`.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::from(s.as_str()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Self::Null,
        }
    }

    /// Convert data values into JSON
    ///
    /// Reference kinds have no JSON form and map to `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Str(s) => serde_json::Value::String(s.to_string()),
            _ => serde_json::Value::Null,
        }
    }
}

/// Argument at `index`, `Undefined` when absent
#[inline]
#[must_use]
pub fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Function(func) => write!(f, "{func:?}"),
            Self::Object(o) => write!(f, "{o:?}"),
            Self::Type(t) => write!(f, "{t:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
            Self::Function(func) => write!(f, "[function {}]", func.name()),
            Self::Object(_) => f.write_str("[object]"),
            Self::Type(t) => write!(f, "[type {}]", t.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Self::Function(f)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

impl From<Type> for Value {
    fn from(t: Type) -> Self {
        Self::Type(t)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Undefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_undefined() {
        assert!(Value::default().is_undefined());
    }

    #[test]
    fn primitives_compare_by_value() {
        assert_eq!(Value::from("ab"), Value::from(String::from("ab")));
        assert_eq!(Value::from(3), Value::from(3.0));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_ne!(Value::Null, Value::Undefined);
    }

    #[test]
    fn functions_compare_by_identity() {
        let f = Function::new("f", |_, _| Ok(Value::Undefined));
        let g = Function::new("f", |_, _| Ok(Value::Undefined));
        assert_eq!(Value::from(f.clone()), Value::from(f.clone()));
        assert_ne!(Value::from(f), Value::from(g));
    }

    #[test]
    fn into_function_reports_kind() {
        let err = Value::from(1).into_function("run").unwrap_err();
        assert_eq!(
            err,
            Error::NotCallable {
                member: "run".to_string(),
                found: "number"
            }
        );
    }

    #[test]
    fn arg_defaults_to_undefined() {
        let args = [Value::from(1)];
        assert_eq!(arg(&args, 0), Value::from(1));
        assert!(arg(&args, 3).is_undefined());
    }

    #[test]
    fn json_bridge() {
        let json = serde_json::json!("text");
        assert_eq!(Value::from_json(&json), Value::from("text"));
        assert_eq!(Value::from(2.5).to_json(), serde_json::json!(2.5));
        assert_eq!(Value::from_json(&serde_json::json!([1])), Value::Null);
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::Undefined.to_string(), "undefined");
        assert_eq!(Value::from(4).to_string(), "4");
    }

    #[test]
    fn set_on_primitive_fails() {
        assert!(matches!(
            Value::from(1).set("x", 2),
            Err(Error::InvalidArgument(_))
        ));
    }
}
