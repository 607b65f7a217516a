//! Realm configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Settings shared by every type of a realm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmConfig {
    /// Character splitting `modifier` from `member` in definition keys
    pub tag_separator: char,
    /// Maximum entries on one object's augment stack: pending levels plus one per running chain
    pub max_augment_depth: usize,
}

impl RealmConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With tag separator
    #[inline]
    #[must_use]
    pub fn with_tag_separator(mut self, separator: char) -> Self {
        self.tag_separator = separator;
        self
    }

    /// With maximum augment depth
    #[inline]
    #[must_use]
    pub fn with_max_augment_depth(mut self, depth: usize) -> Self {
        self.max_augment_depth = depth;
        self
    }

    /// Parse from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// `Config` if the text is not valid TOML or fails validation
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings are usable
    ///
    /// # Errors
    /// `Config` if the separator could appear in a member name or the
    /// augment depth is zero
    pub fn validate(&self) -> Result<()> {
        if self.tag_separator.is_alphanumeric()
            || self.tag_separator == '_'
            || self.tag_separator.is_whitespace()
        {
            return Err(Error::Config(format!(
                "tag separator `{}` may appear in member names",
                self.tag_separator
            )));
        }
        if self.max_augment_depth == 0 {
            return Err(Error::Config("max_augment_depth must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            tag_separator: '$',
            max_augment_depth: 1024,
        }
    }
}
