//! Builds the `mix hex.publish` invocation

use crate::core::config::HexConfig;
use crate::security::token_manager::HEX_API_KEY_ENV;
use secrecy::{ExposeSecret, SecretString};

/// Build tool program name
pub const MIX_PROGRAM: &str = "mix";

/// Publish subcommand passed to `mix`
pub const PUBLISH_TASK: &str = "hex.publish";

/// Strip a single leading `v` from a release version
///
/// ```
/// use hex_publisher::plugins::normalize_version;
///
/// assert_eq!(normalize_version("v1.2.3"), "1.2.3");
/// assert_eq!(normalize_version("1.2.3"), "1.2.3");
/// ```
pub fn normalize_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

/// Fully resolved arguments and environment for one `mix` call
#[derive(Debug)]
pub struct InvocationPlan {
    version: String,
    args: Vec<String>,
    env: Vec<(String, SecretString)>,
}

impl InvocationPlan {
    /// Build the argument list for `config` and normalize `version`
    ///
    /// Arguments are always emitted in the same order:
    /// `hex.publish [--organization ORG] [--replace] [--yes]`.
    /// The plan carries no environment until [`with_credential`] is called.
    ///
    /// [`with_credential`]: InvocationPlan::with_credential
    pub fn build(config: &HexConfig, version: &str) -> Self {
        let mut args = vec![PUBLISH_TASK.to_string()];

        if !config.organization.is_empty() {
            args.push("--organization".to_string());
            args.push(config.organization.clone());
        }

        if config.replace {
            args.push("--replace".to_string());
        }

        if config.yes {
            args.push("--yes".to_string());
        }

        Self {
            version: normalize_version(version).to_string(),
            args,
            env: Vec::new(),
        }
    }

    /// Add the `HEX_API_KEY` assignment needed for a real publish
    pub fn with_credential(mut self, api_key: &SecretString) -> Self {
        self.env.push((
            HEX_API_KEY_ENV.to_string(),
            SecretString::new(api_key.expose_secret().into()),
        ));
        self
    }

    pub fn program(&self) -> &'static str {
        MIX_PROGRAM
    }

    /// Version with any leading `v` removed
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &[(String, SecretString)] {
        &self.env
    }

    /// Human-readable command, e.g. `mix hex.publish --yes`
    pub fn command_line(&self) -> String {
        format!("{} {}", MIX_PROGRAM, self.args.join(" "))
    }
}
