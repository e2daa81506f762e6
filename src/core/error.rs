//! Error handling for Hex publishing
//!
//! Every failure the plugin can hit is a variant here. None of them escape as
//! a transport error: the plugin turns each one into a failed
//! `ExecuteResponse` so the host can show it to the operator.

use crate::security::command_executor::CommandError;
use thiserror::Error;

/// Maximum organization name length accepted by the validator
pub const MAX_ORGANIZATION_LEN: usize = 128;

/// Why a `work_dir` value was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    #[error("absolute paths are not allowed")]
    AbsolutePath,

    #[error("path traversal detected: cannot use '..' to escape working directory")]
    PathTraversal,
}

/// Why an `organization` value was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizationError {
    #[error("organization name too long (max {max} characters)")]
    NameTooLong { max: usize },

    #[error(
        "organization name contains invalid characters: only alphanumeric, hyphens, and underscores are allowed"
    )]
    InvalidCharacters,
}

/// Main error type for the publish workflow
#[derive(Error, Debug)]
pub enum PublishError {
    // Validation errors
    #[error("invalid work_dir: {0}")]
    InvalidPath(PathError),

    #[error("invalid organization: {0}")]
    InvalidOrganization(OrganizationError),

    // Credential errors
    #[error(
        "HEX_API_KEY is required: set api_key in config or HEX_API_KEY environment variable"
    )]
    MissingCredential,

    // Execution errors
    #[error("mix hex.publish failed: {source}\nOutput: {output}")]
    SubprocessFailure {
        #[source]
        source: CommandError,
        output: String,
    },
}

impl From<PathError> for PublishError {
    fn from(err: PathError) -> Self {
        Self::InvalidPath(err)
    }
}

impl From<OrganizationError> for PublishError {
    fn from(err: OrganizationError) -> Self {
        Self::InvalidOrganization(err)
    }
}

impl PublishError {
    /// Configuration key this error is attributed to, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidPath(_) => Some("work_dir"),
            Self::InvalidOrganization(_) => Some("organization"),
            Self::MissingCredential => Some("api_key"),
            Self::SubprocessFailure { .. } => None,
        }
    }

    /// Short, single-line description used as the response message
    pub fn summary(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) | Self::InvalidOrganization(_) => "Invalid Hex configuration",
            Self::MissingCredential => "Hex API key not configured",
            Self::SubprocessFailure { .. } => "Failed to publish package to Hex.pm",
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidPath(_) => vec![
                "Use a path relative to the project root",
                "Remove any '..' segments from work_dir",
            ],
            Self::InvalidOrganization(_) => vec![
                "Use only letters, digits, hyphens and underscores",
                "Keep the organization name at 128 characters or fewer",
            ],
            Self::MissingCredential => vec![
                "Set api_key in the plugin configuration",
                "Export HEX_API_KEY in the release environment",
            ],
            Self::SubprocessFailure { .. } => vec![
                "Check the mix output included in the error",
                "Make sure Elixir and the hex archive are installed",
                "Run with --replace if this version was already published",
            ],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "INVALID_PATH",
            Self::InvalidOrganization(_) => "INVALID_ORGANIZATION",
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::SubprocessFailure { .. } => "SUBPROCESS_FAILURE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_path_error() {
        let error = PublishError::from(PathError::AbsolutePath);

        assert_eq!(error.field(), Some("work_dir"));
        assert_eq!(error.code(), "INVALID_PATH");
        assert_eq!(
            error.to_string(),
            "invalid work_dir: absolute paths are not allowed"
        );
    }

    #[test]
    fn test_invalid_organization_error() {
        let error = PublishError::from(OrganizationError::NameTooLong {
            max: MAX_ORGANIZATION_LEN,
        });

        assert_eq!(error.field(), Some("organization"));
        assert_eq!(error.code(), "INVALID_ORGANIZATION");
        assert_eq!(
            error.to_string(),
            "invalid organization: organization name too long (max 128 characters)"
        );
    }

    #[test]
    fn test_missing_credential_mentions_both_routes() {
        let error = PublishError::MissingCredential;
        let display = error.to_string();

        assert!(display.contains("api_key"));
        assert!(display.contains("HEX_API_KEY"));
        assert_eq!(error.summary(), "Hex API key not configured");
        assert!(error.suggested_actions().len() >= 2);
    }

    #[test]
    fn test_subprocess_failure_embeds_output() {
        let error = PublishError::SubprocessFailure {
            source: CommandError::ExitStatus {
                code: Some(1),
                output: b"** (Mix) package already exists".to_vec(),
            },
            output: "** (Mix) package already exists".to_string(),
        };

        let display = error.to_string();
        assert!(display.starts_with("mix hex.publish failed: "));
        assert!(display.contains("exit status 1"));
        assert!(display.ends_with("Output: ** (Mix) package already exists"));
        assert_eq!(error.field(), None);
        assert_eq!(error.code(), "SUBPROCESS_FAILURE");
    }
}
