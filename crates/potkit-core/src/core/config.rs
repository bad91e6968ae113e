use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// How an atom-type charge whose unit is not a charge is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChargePolicy {
    /// Keep the bare numeric value, reinterpret it as elementary charge, and warn.
    #[default]
    Coerce,
    /// Reject the value.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct ValidationConfig {
    pub charge_policy: ChargePolicy,
    /// Treat bonded member-type names that match no registered atom type as errors.
    pub strict_members: bool,
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

impl ValidationConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| ConfigLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[derive(Default)]
pub struct ValidationConfigBuilder {
    charge_policy: Option<ChargePolicy>,
    strict_members: Option<bool>,
}

impl ValidationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. one loaded from a file.
    pub fn from_config(config: ValidationConfig) -> Self {
        Self {
            charge_policy: Some(config.charge_policy),
            strict_members: Some(config.strict_members),
        }
    }

    pub fn charge_policy(mut self, policy: ChargePolicy) -> Self {
        self.charge_policy = Some(policy);
        self
    }

    pub fn strict_members(mut self, strict: bool) -> Self {
        self.strict_members = Some(strict);
        self
    }

    pub fn build(self) -> ValidationConfig {
        let defaults = ValidationConfig::default();
        ValidationConfig {
            charge_policy: self.charge_policy.unwrap_or(defaults.charge_policy),
            strict_members: self.strict_members.unwrap_or(defaults.strict_members),
        }
    }
}
