// Well-known names shared by the shim crates.

/// Environment variables read to configure a shim invocation.
pub mod variables {
    /// Directory holding `action.yml` and the lifecycle scripts.
    pub const ACTION_PATH: &str = "GITHUB_ACTION_PATH";
    /// Lower-kebab identifier of the feature being shimmed.
    pub const FEATURE_ID: &str = "ACTIONS_SHIM_FEATURE_ID";
    /// Directory the environment fragment is written to.
    pub const PROFILE_DIR: &str = "ACTION_SHIM_PROFILE_D";
    /// Interpreter used to launch lifecycle scripts.
    pub const NODE: &str = "ACTION_SHIM_NODE";

    pub const GITHUB_ACTIONS: &str = "GITHUB_ACTIONS";
    pub const CI: &str = "CI";
    pub const PATH: &str = "PATH";

    /// Prefix of the per-input variables a runner hands to an action.
    pub const INPUT_PREFIX: &str = "INPUT_";
    /// Prefix of build-option variables, followed by the normalized feature id.
    pub const BUILD_ARG_PREFIX: &str = "_BUILD_ARG_";
}

pub mod path {
    pub const ACTION_MANIFEST_YML_FILE: &str = "action.yml";
    pub const ACTION_MANIFEST_YAML_FILE: &str = "action.yaml";

    pub const FRAGMENT_FILE_PREFIX: &str = "action-";
    pub const FRAGMENT_FILE_SUFFIX: &str = "-env.sh";
}

/// Interpreter used when `ACTION_SHIM_NODE` is not set.
pub const DEFAULT_NODE: &str = "node";

/// `runs.using` values handled by the Node script handler.
pub const NODE_RUNTIMES: &[&str] = &["node12", "node16", "node20", "node24"];
