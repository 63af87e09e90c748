// Feature identity: distinguishes shimmed actions that share a profile directory.

use std::fmt;

use crate::constants::{path, variables};
use crate::errors::{Result, ShimError};
use crate::util::var_util::VarUtil;

/// A non-empty feature identifier, e.g. `my-tool`.
///
/// Only ASCII letters, digits, `-`, `_` and `.` are accepted, so the id can
/// never name a path outside the profile directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ShimError::configuration(format!(
                "{} must be a non-empty feature identifier",
                variables::FEATURE_ID
            )));
        }
        if let Some(bad) = raw
            .chars()
            .find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(ShimError::configuration(format!(
                "{} '{}' contains invalid character {:?}",
                variables::FEATURE_ID,
                raw,
                bad
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized form used inside variable names (`my-tool` → `MY_TOOL`).
    pub fn env_name(&self) -> String {
        VarUtil::to_env_name(&self.0)
    }

    /// Prefix of this feature's build-option variables (`_BUILD_ARG_MY_TOOL`).
    pub fn option_prefix(&self) -> String {
        format!("{}{}", variables::BUILD_ARG_PREFIX, self.env_name())
    }

    /// Name of the environment fragment file (`action-my-tool-env.sh`).
    pub fn fragment_file_name(&self) -> String {
        format!(
            "{}{}{}",
            path::FRAGMENT_FILE_PREFIX,
            self.0,
            path::FRAGMENT_FILE_SUFFIX
        )
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
