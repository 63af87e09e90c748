// shim-common: Shared services for the action shim.
// Depends on nothing shim-specific; provides settings, the error type and the
// translation of workflow commands into a shell environment fragment.

pub mod action_command;
pub mod constants;
pub mod env_fragment;
pub mod errors;
pub mod feature;
pub mod settings;
pub mod util;

// ---------------------------------------------------------------------------
// Re-exports for convenient access
// ---------------------------------------------------------------------------

pub use action_command::ActionCommand;
pub use env_fragment::{translate, EnvironmentFragment};
pub use errors::{Result, ShimError};
pub use feature::FeatureId;
pub use settings::ShimSettings;
pub use util::var_util::VarUtil;
