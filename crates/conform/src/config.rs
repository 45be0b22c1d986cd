//! Form configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default name of the hidden field carrying a serialized intent.
pub const DEFAULT_INTENT_NAME: &str = "__intent__";

/// Default name of the hidden field carrying the serialized form state.
pub const DEFAULT_STATE_NAME: &str = "__state__";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("reserved field name for {0} must not be empty")]
    EmptyName(&'static str),
    #[error("reserved field name {0:?} is used more than once")]
    Collision(String),
}

/// Settings shared by the submission parser, the reducer and the form
/// controller.
///
/// Every field has a default, so a partial TOML or JSON document is enough:
///
/// ```
/// use conform::FormConfig;
///
/// let config: FormConfig = serde_json::from_str(r#"{"intent_name": "_action"}"#).unwrap();
/// assert_eq!(config.intent_name, "_action");
/// assert_eq!(config.state_name, "__state__");
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormConfig {
    pub intent_name: String,
    pub state_name: String,
    /// Collapse single-element leaf arrays when a result is written for the
    /// wire.
    pub collapse_leaf_arrays: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            intent_name: DEFAULT_INTENT_NAME.to_string(),
            state_name: DEFAULT_STATE_NAME.to_string(),
            collapse_leaf_arrays: false,
        }
    }
}

impl FormConfig {
    /// Check the reserved names.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyName`] if either reserved name is empty
    /// - [`ConfigError::Collision`] if both reserved names are the same
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.intent_name.is_empty() {
            return Err(ConfigError::EmptyName("intent"));
        }
        if self.state_name.is_empty() {
            return Err(ConfigError::EmptyName("state"));
        }
        if self.intent_name == self.state_name {
            return Err(ConfigError::Collision(self.intent_name.clone()));
        }
        Ok(())
    }

    /// Returns `true` for the reserved intent and state field names.
    pub fn is_reserved(&self, name: &str) -> bool {
        name == self.intent_name || name == self.state_name
    }

    /// Reject a user field that shadows a reserved name.
    pub fn check_field(&self, name: &str) -> Result<(), ConfigError> {
        if self.is_reserved(name) {
            return Err(ConfigError::Collision(name.to_string()));
        }
        Ok(())
    }
}
