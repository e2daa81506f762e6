//! Safety checks for configuration values that reach the subprocess
//!
//! Both checks are pure and never touch the filesystem.

use crate::core::error::{MAX_ORGANIZATION_LEN, OrganizationError, PathError};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Component, Path};

lazy_static! {
    static ref ORGANIZATION_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// Validate the working directory handed to `mix`.
///
/// Empty means "use the default" and is accepted. Otherwise the path must be
/// relative and must not contain a `..` component anywhere, even one that
/// would cancel out lexically (`a/../b`).
///
/// # Examples
///
/// ```
/// use hex_publisher::security::validate_work_dir;
///
/// assert!(validate_work_dir("apps/core").is_ok());
/// assert!(validate_work_dir("../outside").is_err());
/// ```
pub fn validate_work_dir(path: &str) -> Result<(), PathError> {
    if path.is_empty() {
        return Ok(());
    }

    let path = Path::new(path);
    if path.is_absolute() || path.has_root() {
        return Err(PathError::AbsolutePath);
    }

    for component in path.components() {
        match component {
            Component::ParentDir => return Err(PathError::PathTraversal),
            Component::Prefix(_) | Component::RootDir => return Err(PathError::AbsolutePath),
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(())
}

/// Validate a Hex organization name.
///
/// Empty is accepted. Names are limited to 128 characters drawn from
/// `[A-Za-z0-9_-]`; the length check runs first.
pub fn validate_organization(name: &str) -> Result<(), OrganizationError> {
    if name.is_empty() {
        return Ok(());
    }

    if name.chars().count() > MAX_ORGANIZATION_LEN {
        return Err(OrganizationError::NameTooLong {
            max: MAX_ORGANIZATION_LEN,
        });
    }

    if !ORGANIZATION_RE.is_match(name) {
        return Err(OrganizationError::InvalidCharacters);
    }

    Ok(())
}
