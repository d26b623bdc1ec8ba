//! Site configuration entries stored in the database

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::ValidationError;

static CONFIG_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_.-]{1,100}$").expect("invalid config key regex"));

string_enum! {
    /// Declared type of a configuration value
    pub enum ConfigType("config_type") {
        String => "string",
        Boolean => "boolean",
        Number => "number",
        Json => "json",
        Array => "array",
    }
}

impl Default for ConfigType {
    fn default() -> Self {
        Self::String
    }
}

impl ConfigType {
    /// Check that `value` has the JSON shape this type declares.
    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        let ok = match self {
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Number => value.is_number(),
            Self::Array => value.is_array(),
            Self::Json => true,
        };
        if ok {
            Ok(())
        } else {
            Err(ValidationError::InvalidFormat {
                field: "config_value",
                reason: "value does not match config_type",
            })
        }
    }
}

/// Validated configuration key such as `site.title`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigKey(String);

impl ConfigKey {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "config_key" });
        }
        if s.len() > 100 {
            return Err(ValidationError::TooLong {
                field: "config_key",
                max: 100,
            });
        }
        if !CONFIG_KEY_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "config_key",
                reason: "must be lowercase letters, digits, '_', '.' or '-'",
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
