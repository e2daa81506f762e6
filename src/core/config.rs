//! Configuration resolution for the Hex plugin
//!
//! Raw host configuration is loosely typed. `ConfigParser` coerces it into
//! typed values with environment fallbacks, and `HexConfig::resolve` builds
//! the record the rest of the plugin works with. Resolution never validates;
//! call `HexConfig::validate` for that.

use crate::core::error::PublishError;
use crate::core::traits::RawConfig;
use crate::security::input_validator::{validate_organization, validate_work_dir};
use crate::security::token_manager::{HEX_API_KEY_ENV, mask_token};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::collections::HashMap;

/// Environment variable holding the default organization
pub const HEX_ORGANIZATION_ENV: &str = "HEX_ORGANIZATION";

/// Default working directory for `mix`
pub const DEFAULT_WORK_DIR: &str = ".";

/// Typed accessor over a raw configuration map
pub struct ConfigParser<'a> {
    raw: &'a RawConfig,
    env: &'a HashMap<String, String>,
}

impl<'a> ConfigParser<'a> {
    pub fn new(raw: &'a RawConfig, env: &'a HashMap<String, String>) -> Self {
        Self { raw, env }
    }

    /// Resolve a string value
    ///
    /// Priority (high to low):
    /// 1. Non-empty string under `key`
    /// 2. Non-empty environment variable `env_key`
    /// 3. `default`
    pub fn get_string(&self, key: &str, env_key: Option<&str>, default: &str) -> String {
        if let Some(Value::String(value)) = self.raw.get(key)
            && !value.is_empty()
        {
            return value.clone();
        }

        if let Some(value) = env_key.and_then(|name| self.env.get(name))
            && !value.is_empty()
        {
            return value.clone();
        }

        default.to_string()
    }

    /// Resolve a boolean value
    ///
    /// Accepts JSON booleans and the exact strings `"true"` / `"false"`.
    /// Anything else falls back to `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.raw.get(key) {
            Some(Value::Bool(value)) => *value,
            Some(Value::String(value)) if value == "true" => true,
            Some(Value::String(value)) if value == "false" => false,
            _ => default,
        }
    }
}

/// Resolved plugin configuration
#[derive(Debug)]
pub struct HexConfig {
    /// Hex API key; empty when not configured
    pub api_key: SecretString,
    /// Hex organization for private packages; empty for public packages
    pub organization: String,
    /// Pass `--replace` to overwrite an existing version
    pub replace: bool,
    /// Pass `--yes` to skip the confirmation prompt
    pub yes: bool,
    /// Directory `mix` runs in
    pub work_dir: String,
}

impl HexConfig {
    /// Merge raw configuration with environment fallbacks and defaults
    pub fn resolve(raw: &RawConfig, env: &HashMap<String, String>) -> Self {
        let parser = ConfigParser::new(raw, env);

        let config = Self {
            api_key: SecretString::new(
                parser
                    .get_string("api_key", Some(HEX_API_KEY_ENV), "")
                    .into(),
            ),
            organization: parser.get_string("organization", Some(HEX_ORGANIZATION_ENV), ""),
            replace: parser.get_bool("replace", false),
            yes: parser.get_bool("yes", true),
            work_dir: parser.get_string("work_dir", None, DEFAULT_WORK_DIR),
        };

        log::debug!(
            "resolved hex config: api_key={} organization={:?} replace={} yes={} work_dir={:?}",
            config.masked_api_key(),
            config.organization,
            config.replace,
            config.yes,
            config.work_dir
        );

        config
    }

    /// Check the values that reach the subprocess
    ///
    /// `work_dir` is checked before `organization`; the first failure wins.
    pub fn validate(&self) -> Result<(), PublishError> {
        validate_work_dir(&self.work_dir)?;
        validate_organization(&self.organization)?;
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }

    /// API key in a form safe for logs
    pub fn masked_api_key(&self) -> String {
        if self.has_api_key() {
            mask_token(self.api_key.expose_secret())
        } else {
            "<unset>".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{OrganizationError, PathError};
    use serde_json::json;

    fn raw(value: Value) -> RawConfig {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_defaults() {
        let config = HexConfig::resolve(&RawConfig::new(), &HashMap::new());

        assert_eq!(config.api_key.expose_secret(), "");
        assert!(!config.has_api_key());
        assert_eq!(config.organization, "");
        assert!(!config.replace);
        assert!(config.yes);
        assert_eq!(config.work_dir, ".");
    }

    #[test]
    fn test_explicit_api_key_wins_over_env() {
        let config = HexConfig::resolve(
            &raw(json!({"api_key": "config-key"})),
            &env(&[("HEX_API_KEY", "env-key")]),
        );

        assert_eq!(config.api_key.expose_secret(), "config-key");
    }

    #[test]
    fn test_env_fallbacks() {
        let config = HexConfig::resolve(
            &RawConfig::new(),
            &env(&[("HEX_API_KEY", "env-key"), ("HEX_ORGANIZATION", "env-org")]),
        );

        assert_eq!(config.api_key.expose_secret(), "env-key");
        assert_eq!(config.organization, "env-org");
    }

    #[test]
    fn test_empty_string_falls_through_to_env() {
        let config = HexConfig::resolve(
            &raw(json!({"organization": ""})),
            &env(&[("HEX_ORGANIZATION", "env-org")]),
        );

        assert_eq!(config.organization, "env-org");
    }

    #[test]
    fn test_work_dir_has_no_env_fallback() {
        let config = HexConfig::resolve(&RawConfig::new(), &env(&[("WORK_DIR", "elsewhere")]));
        assert_eq!(config.work_dir, ".");

        let config = HexConfig::resolve(&raw(json!({"work_dir": "apps/core"})), &HashMap::new());
        assert_eq!(config.work_dir, "apps/core");
    }

    #[test]
    fn test_bool_coercion() {
        let config = HexConfig::resolve(
            &raw(json!({"replace": "true", "yes": "false"})),
            &HashMap::new(),
        );
        assert!(config.replace);
        assert!(!config.yes);

        let config =
            HexConfig::resolve(&raw(json!({"replace": true, "yes": false})), &HashMap::new());
        assert!(config.replace);
        assert!(!config.yes);
    }

    #[test]
    fn test_bool_coercion_is_case_sensitive() {
        let config = HexConfig::resolve(
            &raw(json!({"replace": "TRUE", "yes": "False"})),
            &HashMap::new(),
        );

        assert!(!config.replace);
        assert!(config.yes);
    }

    #[test]
    fn test_incompatible_types_use_defaults() {
        let config = HexConfig::resolve(
            &raw(json!({"organization": 42, "replace": 1, "work_dir": ["a"]})),
            &env(&[("HEX_ORGANIZATION", "env-org")]),
        );

        assert_eq!(config.organization, "env-org");
        assert!(!config.replace);
        assert_eq!(config.work_dir, ".");
    }

    #[test]
    fn test_validate_checks_work_dir_first() {
        let config = HexConfig::resolve(
            &raw(json!({"work_dir": "/abs", "organization": "bad org"})),
            &HashMap::new(),
        );

        assert!(matches!(
            config.validate(),
            Err(PublishError::InvalidPath(PathError::AbsolutePath))
        ));
    }

    #[test]
    fn test_validate_organization() {
        let config = HexConfig::resolve(&raw(json!({"organization": "bad org"})), &HashMap::new());

        assert!(matches!(
            config.validate(),
            Err(PublishError::InvalidOrganization(
                OrganizationError::InvalidCharacters
            ))
        ));
    }

    #[test]
    fn test_debug_does_not_leak_api_key() {
        let config = HexConfig::resolve(&raw(json!({"api_key": "super-secret-key"})), &HashMap::new());

        assert!(!format!("{:?}", config).contains("super-secret-key"));
        assert_eq!(config.masked_api_key(), "sup...key");
    }
}
