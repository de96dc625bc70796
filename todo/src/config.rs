//! Configuration for the to-do list.
//!
//! Loaded from environment variables with defaults matching the existing
//! deployment.
//!
//! | Variable                    | Default                          |
//! |-----------------------------|----------------------------------|
//! | `TODOBOARD_ADMIN_NAMES`     | the five original administrators |
//! | `TODOBOARD_COLLECTION`      | `todos`                          |
//! | `TODOBOARD_TIMESTAMP_ZONE`  | `local`                          |

use std::collections::BTreeSet;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Display names allowed into admin mode when nothing is configured
pub const DEFAULT_ADMIN_NAMES: [&str; 5] = ["김진중", "김남희", "한승오", "김선정", "김명원"];

/// Default collection name
pub const DEFAULT_COLLECTION: &str = "todos";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set to a value that cannot be parsed
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name
        key: String,
        /// Offending value
        value: String,
    },

    /// Values parsed but do not make sense together
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

/// Zone in which creation timestamps are written
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimestampZone {
    /// Machine-local wall clock
    #[default]
    Local,
    /// UTC
    Utc,
}

impl FromStr for TimestampZone {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "utc" => Ok(Self::Utc),
            _ => Err(ConfigError::InvalidValue {
                key: "TODOBOARD_TIMESTAMP_ZONE".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Display names allowed to switch into admin mode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminAllowList(BTreeSet<String>);

impl AdminAllowList {
    /// Build from names; blank entries are dropped
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            names
                .into_iter()
                .map(|name| name.as_ref().trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }

    /// Parse a comma-separated list
    #[must_use]
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Whether `display_name` may enter admin mode
    #[must_use]
    pub fn contains(&self, display_name: &str) -> bool {
        self.0.contains(display_name)
    }

    /// Number of allowed names
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nobody may enter admin mode
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for AdminAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_NAMES)
    }
}

/// Application configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoConfig {
    /// Name of the remote collection holding the items
    pub collection: String,
    /// Who may switch into admin mode
    pub admins: AdminAllowList,
    /// Zone for creation timestamps
    pub timestamp_zone: TimestampZone,
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            admins: AdminAllowList::default(),
            timestamp_zone: TimestampZone::default(),
        }
    }
}

impl TodoConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a variable holds an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a variable holds an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let collection = lookup("TODOBOARD_COLLECTION")
            .map_or_else(|| DEFAULT_COLLECTION.to_string(), |s| s.trim().to_string());

        let admins = lookup("TODOBOARD_ADMIN_NAMES")
            .map_or_else(AdminAllowList::default, |s| AdminAllowList::parse(&s));

        let timestamp_zone = lookup("TODOBOARD_TIMESTAMP_ZONE")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or_default();

        let config = Self {
            collection,
            admins,
            timestamp_zone,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot work
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the collection name is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.is_empty() {
            return Err(ConfigError::Validation(
                "collection name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
