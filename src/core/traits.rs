//! Core traits and types shared with the release host
//!
//! This module defines the request/response records exchanged with the host
//! orchestrator and the `Plugin` trait it drives.

use crate::core::error::PublishError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Untyped configuration mapping as supplied by the host
pub type RawConfig = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Hooks
// ============================================================================

/// Lifecycle events in the host's release pipeline
///
/// Names the host adds later land in `Other` with the raw name kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Hook {
    PreInit,
    PostInit,
    PrePlan,
    PostPlan,
    PreVersion,
    PostVersion,
    PreNotes,
    PostNotes,
    PreApprove,
    PostApprove,
    PrePublish,
    PostPublish,
    OnSuccess,
    OnError,
    #[serde(untagged)]
    Other(String),
}

impl Hook {
    pub fn as_str(&self) -> &str {
        match self {
            Hook::PreInit => "pre-init",
            Hook::PostInit => "post-init",
            Hook::PrePlan => "pre-plan",
            Hook::PostPlan => "post-plan",
            Hook::PreVersion => "pre-version",
            Hook::PostVersion => "post-version",
            Hook::PreNotes => "pre-notes",
            Hook::PostNotes => "post-notes",
            Hook::PreApprove => "pre-approve",
            Hook::PostApprove => "post-approve",
            Hook::PrePublish => "pre-publish",
            Hook::PostPublish => "post-publish",
            Hook::OnSuccess => "on-success",
            Hook::OnError => "on-error",
            Hook::Other(name) => name,
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Release information supplied by the host
///
/// Only `version` is consumed by the publish step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseContext {
    /// Release version, possibly prefixed with `v`
    pub version: String,
    pub previous_version: String,
    pub tag_name: String,
    pub branch: String,
    pub commit_sha: String,
    pub changelog: String,
    pub release_notes: String,
    pub repository_url: String,
}

/// A lifecycle invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub hook: Hook,
    #[serde(default)]
    pub config: RawConfig,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub context: ReleaseContext,
}

// ============================================================================
// Responses
// ============================================================================

/// Outcome of a lifecycle invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<HashMap<String, serde_json::Value>>,
}

impl ExecuteResponse {
    /// Successful response without outputs
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            outputs: None,
        }
    }

    /// Failed response describing `error`
    pub fn failure(error: &PublishError) -> Self {
        Self {
            success: false,
            message: error.summary().to_string(),
            error: Some(error.to_string()),
            outputs: None,
        }
    }

    /// Attach named outputs
    pub fn with_outputs(mut self, outputs: HashMap<String, serde_json::Value>) -> Self {
        self.outputs = Some(outputs);
        self
    }
}

/// Validation error attributed to a configuration key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Result of configuration validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<ValidationError>,
}

impl ValidateResponse {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

// ============================================================================
// Plugin Trait
// ============================================================================

/// Declared plugin metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub hooks: Vec<Hook>,
    /// JSON Schema describing the recognised configuration keys
    pub config_schema: serde_json::Value,
}

/// Trait implemented by release plugins
///
/// The `Err` arm of both async methods is reserved for transport-level
/// failures. Anything that goes wrong inside the plugin's own logic is
/// reported through a response with `success`/`valid` set to false.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Plugin metadata
    fn info(&self) -> PluginInfo;

    /// Run the plugin for one lifecycle event
    ///
    /// # Arguments
    ///
    /// * `cancel` - Fires when the host gives up on the invocation
    /// * `request` - Hook, raw configuration, dry-run flag and release context
    async fn execute(
        &self,
        cancel: &CancellationToken,
        request: ExecuteRequest,
    ) -> anyhow::Result<ExecuteResponse>;

    /// Validate raw configuration without running anything
    async fn validate(&self, config: &RawConfig) -> anyhow::Result<ValidateResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PathError;

    #[test]
    fn test_hook_serialization() {
        let json = serde_json::to_string(&Hook::PostPublish).unwrap();
        assert_eq!(json, r#""post-publish""#);

        let hook: Hook = serde_json::from_str(r#""on-error""#).unwrap();
        assert_eq!(hook, Hook::OnError);
        assert_eq!(Hook::PrePlan.to_string(), "pre-plan");
    }

    #[test]
    fn test_unknown_hook_keeps_its_name() {
        let request: ExecuteRequest =
            serde_json::from_value(serde_json::json!({"hook": "post-deploy"})).unwrap();

        assert_eq!(request.hook, Hook::Other("post-deploy".to_string()));
        assert_eq!(request.hook.to_string(), "post-deploy");
        assert_eq!(
            serde_json::to_string(&request.hook).unwrap(),
            r#""post-deploy""#
        );
    }

    #[test]
    fn test_execute_request_defaults() {
        let request: ExecuteRequest =
            serde_json::from_str(r#"{"hook": "post-publish", "context": {"version": "v1.2.3"}}"#)
                .unwrap();

        assert_eq!(request.hook, Hook::PostPublish);
        assert!(request.config.is_empty());
        assert!(!request.dry_run);
        assert_eq!(request.context.version, "v1.2.3");
        assert!(request.context.branch.is_empty());
    }

    #[test]
    fn test_failure_response() {
        let response = ExecuteResponse::failure(&PublishError::InvalidPath(PathError::PathTraversal));

        assert!(!response.success);
        assert_eq!(response.message, "Invalid Hex configuration");
        assert!(response.error.unwrap().starts_with("invalid work_dir: "));
        assert!(response.outputs.is_none());
    }

    #[test]
    fn test_response_serialization_skips_empty_fields() {
        let json = serde_json::to_string(&ExecuteResponse::success("ok")).unwrap();
        assert_eq!(json, r#"{"success":true,"message":"ok"}"#);
    }

    #[test]
    fn test_validate_response_from_errors() {
        assert!(ValidateResponse::from_errors(vec![]).valid);

        let response = ValidateResponse::from_errors(vec![ValidationError {
            field: "work_dir".to_string(),
            message: "absolute paths are not allowed".to_string(),
        }]);
        assert!(!response.valid);
        assert_eq!(response.errors[0].field, "work_dir");
    }
}
