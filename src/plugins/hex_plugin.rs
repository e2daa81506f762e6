//! Hex Plugin - publishes Elixir packages to Hex.pm
//!
//! This module provides the `post-publish` hook:
//! - configuration resolution with environment fallbacks
//! - work_dir / organization safety checks
//! - dry-run preview of the `mix hex.publish` command
//! - API key check and the real publish call
//!
//! Every other hook is acknowledged and ignored.

use crate::core::config::{ConfigParser, DEFAULT_WORK_DIR, HEX_ORGANIZATION_ENV, HexConfig};
use crate::core::error::PublishError;
use crate::core::state_machine::{PublishPhase, PublishStateMachine};
use crate::core::traits::{
    ExecuteRequest, ExecuteResponse, Hook, Plugin, PluginInfo, RawConfig, ReleaseContext,
    ValidateResponse, ValidationError,
};
use crate::plugins::hex_command::InvocationPlan;
use crate::security::command_executor::{CommandExecutor, SystemCommandExecutor};
use crate::security::input_validator::{validate_organization, validate_work_dir};
use crate::security::token_manager::{HEX_API_KEY_ENV, mask_secret_in};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const PLUGIN_NAME: &str = "hex";
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PLUGIN_DESCRIPTION: &str = "Publish packages to Hex.pm (Elixir)";
pub const PLUGIN_AUTHOR: &str = "Relicta Team";

/// Read `keys` from the process environment
///
/// Unset or non-UTF-8 values are left out.
fn lookup_env(keys: &[&str]) -> HashMap<String, String> {
    keys.iter()
        .filter_map(|key| {
            std::env::var(key)
                .ok()
                .map(|value| (key.to_string(), value))
        })
        .collect()
}

/// Log a workflow failure and turn it into a response
fn report_failure(err: &PublishError) -> ExecuteResponse {
    log::warn!("[{}] {}", err.code(), err);
    for action in err.suggested_actions() {
        log::info!("  hint: {}", action);
    }
    ExecuteResponse::failure(err)
}

/// Hex.pm publishing plugin
pub struct HexPlugin {
    executor: Arc<dyn CommandExecutor>,
    /// Environment snapshot; `None` reads the process environment per call
    env: Option<HashMap<String, String>>,
}

impl Default for HexPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl HexPlugin {
    /// Create a plugin that runs the real `mix` binary
    pub fn new() -> Self {
        Self {
            executor: Arc::new(SystemCommandExecutor),
            env: None,
        }
    }

    /// Replace the command executor
    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Use a fixed environment instead of the process environment
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    fn environment(&self) -> HashMap<String, String> {
        match &self.env {
            Some(env) => env.clone(),
            None => lookup_env(&[HEX_API_KEY_ENV, HEX_ORGANIZATION_ENV]),
        }
    }

    /// JSON Schema for the recognised configuration keys
    pub fn config_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "api_key": {
                    "type": "string",
                    "description": "Hex.pm API key (or use HEX_API_KEY env)",
                    "secret": true
                },
                "organization": {
                    "type": "string",
                    "description": "Hex.pm organization for private packages (or use HEX_ORGANIZATION env)"
                },
                "replace": {
                    "type": "boolean",
                    "description": "Replace existing package version",
                    "default": false
                },
                "yes": {
                    "type": "boolean",
                    "description": "Skip confirmation prompt",
                    "default": true
                },
                "work_dir": {
                    "type": "string",
                    "description": "Working directory for mix command",
                    "default": DEFAULT_WORK_DIR
                }
            }
        })
    }

    /// Run `mix hex.publish` for the release
    async fn publish(
        &self,
        cancel: &CancellationToken,
        config: &HexConfig,
        release: &ReleaseContext,
        dry_run: bool,
    ) -> anyhow::Result<ExecuteResponse> {
        let mut machine = PublishStateMachine::new();
        machine.transition(PublishPhase::Validating)?;

        if let Err(err) = config.validate() {
            machine.transition(PublishPhase::Errored)?;
            return Ok(report_failure(&err));
        }

        let plan = InvocationPlan::build(config, &release.version);

        if dry_run {
            machine.transition(PublishPhase::DryRunPreview)?;
            let outputs = HashMap::from([
                ("command".to_string(), json!(plan.command_line())),
                ("version".to_string(), json!(plan.version())),
                ("organization".to_string(), json!(config.organization)),
                ("replace".to_string(), json!(config.replace)),
            ]);
            return Ok(
                ExecuteResponse::success("Would publish package to Hex.pm").with_outputs(outputs)
            );
        }

        machine.transition(PublishPhase::CredentialCheck)?;
        if !config.has_api_key() {
            machine.transition(PublishPhase::Errored)?;
            return Ok(report_failure(&PublishError::MissingCredential));
        }

        let plan = plan.with_credential(&config.api_key);

        machine.transition(PublishPhase::Executing)?;
        log::info!(
            "publishing {} to Hex.pm: {} (work_dir {:?})",
            plan.version(),
            plan.command_line(),
            config.work_dir
        );

        let result = self
            .executor
            .run(
                cancel,
                plan.program(),
                plan.args(),
                plan.env(),
                &config.work_dir,
            )
            .await;

        match result {
            Ok(output) => {
                machine.transition(PublishPhase::Done)?;
                let output = String::from_utf8_lossy(&output).into_owned();
                let outputs = HashMap::from([
                    ("version".to_string(), json!(plan.version())),
                    ("organization".to_string(), json!(config.organization)),
                    ("output".to_string(), json!(output)),
                ]);
                Ok(ExecuteResponse::success(format!(
                    "Published package v{} to Hex.pm",
                    plan.version()
                ))
                .with_outputs(outputs))
            }
            Err(source) => {
                machine.transition(PublishPhase::Errored)?;
                let output =
                    mask_secret_in(&String::from_utf8_lossy(source.output()), &config.api_key);
                Ok(report_failure(&PublishError::SubprocessFailure {
                    source,
                    output,
                }))
            }
        }
    }
}

#[async_trait]
impl Plugin for HexPlugin {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: PLUGIN_NAME.to_string(),
            version: PLUGIN_VERSION.to_string(),
            description: PLUGIN_DESCRIPTION.to_string(),
            author: PLUGIN_AUTHOR.to_string(),
            hooks: vec![Hook::PostPublish],
            config_schema: Self::config_schema(),
        }
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        request: ExecuteRequest,
    ) -> anyhow::Result<ExecuteResponse> {
        match request.hook {
            Hook::PostPublish => {
                let config = HexConfig::resolve(&request.config, &self.environment());
                self.publish(cancel, &config, &request.context, request.dry_run)
                    .await
            }
            hook => Ok(ExecuteResponse::success(format!("Hook {} not handled", hook))),
        }
    }

    async fn validate(&self, config: &RawConfig) -> anyhow::Result<ValidateResponse> {
        let env = self.environment();
        let parser = ConfigParser::new(config, &env);

        let work_dir = parser.get_string("work_dir", None, DEFAULT_WORK_DIR);
        let organization = parser.get_string("organization", Some(HEX_ORGANIZATION_ENV), "");

        let failures: [Option<PublishError>; 2] = [
            validate_work_dir(&work_dir).err().map(PublishError::from),
            validate_organization(&organization)
                .err()
                .map(PublishError::from),
        ];

        let errors = failures
            .into_iter()
            .flatten()
            .map(|err| ValidationError {
                field: err.field().unwrap_or_default().to_string(),
                message: match err {
                    PublishError::InvalidPath(e) => e.to_string(),
                    PublishError::InvalidOrganization(e) => e.to_string(),
                    other => other.to_string(),
                },
            })
            .collect();

        Ok(ValidateResponse::from_errors(errors))
    }
}
