// ShimSettings: everything an invocation needs from its environment.

use std::path::PathBuf;

use crate::constants::{self, variables};
use crate::errors::{Result, ShimError};
use crate::feature::FeatureId;

#[derive(Debug, Clone)]
pub struct ShimSettings {
    /// Directory containing `action.yml` and the lifecycle scripts.
    pub action_path: PathBuf,
    pub feature: FeatureId,
    /// Directory the environment fragment is written into.
    pub profile_dir: PathBuf,
    /// Interpreter that launches each lifecycle script.
    pub node: String,
}

impl ShimSettings {
    /// Build settings from a variable lookup (usually the resolved environment).
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let feature = FeatureId::new(get(variables::FEATURE_ID).ok_or_else(|| {
            ShimError::configuration(format!("{} is not set", variables::FEATURE_ID))
        })?)?;

        let action_path = get(variables::ACTION_PATH).map(PathBuf::from).ok_or_else(|| {
            ShimError::configuration(format!("{} is not set", variables::ACTION_PATH))
        })?;

        let profile_dir = get(variables::PROFILE_DIR).map(PathBuf::from).ok_or_else(|| {
            ShimError::configuration(format!("{} is not set", variables::PROFILE_DIR))
        })?;

        let node = get(variables::NODE).unwrap_or_else(|| constants::DEFAULT_NODE.to_string());

        Ok(Self {
            action_path,
            feature,
            profile_dir,
            node,
        })
    }

    /// Full path of the fragment this invocation produces.
    pub fn fragment_path(&self) -> PathBuf {
        self.profile_dir.join(self.feature.fragment_file_name())
    }
}
