//! Member definitions handed to `derive` and `extend`
//!
//! Provides [`Definition`] (ordered member map) and [`Body`] (what a new
//! type is derived with).

use crate::error::Result;
use crate::function::Function;
use crate::value::Value;
use indexmap::IndexMap;

/// Ordered mapping from member key to value
///
/// Keys are either plain member names or tagged as
/// `<modifier><separator><member>`, e.g. `around$init`.
/// The first value given for a key wins; repeats are ignored.
#[derive(Debug, Clone, Default)]
pub struct Definition {
    entries: IndexMap<String, Value>,
}

impl Definition {
    /// Create empty definition
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member value
    #[must_use]
    pub fn member(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add a member implemented by a closure taking `(receiver, args)`
    #[must_use]
    pub fn method<F>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let key = key.into();
        let function = Function::new(key.clone(), f);
        self.member(key, function)
    }

    /// Insert unless the key is already present
    ///
    /// Returns `false` when an earlier value was kept.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        match self.entries.entry(key.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
        }
    }

    /// Value stored under an exact key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if definition is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Definition
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut definition = Self::new();
        for (key, value) in iter {
            definition.insert(key, value);
        }
        definition
    }
}

/// What a type is derived with
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// No members
    #[default]
    Empty,

    /// A single function, installed as `init`
    Init(Function),

    /// A full member definition
    Members(Definition),
}

impl Body {
    /// Body consisting of an initializer closure
    pub fn init<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::Init(Function::new("init", f))
    }

    /// Normalize into a definition
    #[must_use]
    pub fn into_definition(self) -> Definition {
        match self {
            Self::Empty => Definition::new(),
            Self::Init(f) => Definition::new().member("init", f),
            Self::Members(definition) => definition,
        }
    }
}

impl From<Definition> for Body {
    fn from(definition: Definition) -> Self {
        Self::Members(definition)
    }
}

impl From<Function> for Body {
    fn from(f: Function) -> Self {
        Self::Init(f)
    }
}

impl From<()> for Body {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

/// A definition key split into optional modifier and member name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MemberKey<'a> {
    pub(crate) modifier: Option<&'a str>,
    pub(crate) member: &'a str,
}

impl<'a> MemberKey<'a> {
    /// Split at the first separator
    ///
    /// Empty halves mean the key is not tagged (`$x`, `x$` are plain names).
    pub(crate) fn parse(key: &'a str, separator: char) -> Self {
        match key.split_once(separator) {
            Some((modifier, member)) if !modifier.is_empty() && !member.is_empty() => Self {
                modifier: Some(modifier),
                member,
            },
            _ => Self {
                modifier: None,
                member: key,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_wins() {
        let definition = Definition::new().member("x", 1).member("x", 2);
        assert_eq!(definition.len(), 1);
        assert_eq!(definition.get("x"), Some(&Value::from(1)));
    }

    #[test]
    fn iteration_keeps_order() {
        let definition: Definition = [("b", 1), ("a", 2), ("c", 3)].into_iter().collect();
        let keys: Vec<&str> = definition.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn init_body_becomes_init_member() {
        let definition = Body::init(|_, _| Ok(Value::Undefined)).into_definition();
        assert!(definition.get("init").is_some_and(Value::is_callable));
        assert!(Body::Empty.into_definition().is_empty());
    }

    #[test]
    fn parse_tagged_key() {
        let key = MemberKey::parse("around$init", '$');
        assert_eq!(key.modifier, Some("around"));
        assert_eq!(key.member, "init");
    }

    #[test]
    fn parse_splits_at_first_separator() {
        let key = MemberKey::parse("before$a$b", '$');
        assert_eq!(key.modifier, Some("before"));
        assert_eq!(key.member, "a$b");
    }

    #[test]
    fn parse_untagged_keys() {
        for raw in ["init", "$init", "init$", "$"] {
            let key = MemberKey::parse(raw, '$');
            assert_eq!(key.modifier, None, "{raw}");
            assert_eq!(key.member, raw);
        }
    }

    #[test]
    fn parse_custom_separator() {
        let key = MemberKey::parse("after:save", ':');
        assert_eq!(key.modifier, Some("after"));
        assert_eq!(MemberKey::parse("after$save", ':').modifier, None);
    }
}
