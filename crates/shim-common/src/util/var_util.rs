// VarUtil: naming rules for the environment variables the shim reads and writes.

use crate::constants::variables;

/// Naming helpers for derived environment variable names.
pub struct VarUtil;

impl VarUtil {
    /// Normalize an identifier for use as a variable-name component:
    /// upper-case, hyphens replaced with underscores.
    pub fn to_env_name(identifier: &str) -> String {
        identifier.to_uppercase().replace('-', "_")
    }

    /// `INPUT_<NAME>` for an action input. Only the case changes; hyphens are
    /// kept, matching what the runner exports.
    pub fn input_variable(input_name: &str) -> String {
        format!("{}{}", variables::INPUT_PREFIX, input_name.to_uppercase())
    }

    /// `<option_prefix>_<NAME>` build-option variable for an action input.
    pub fn build_option_variable(option_prefix: &str, input_name: &str) -> String {
        format!("{option_prefix}_{}", Self::to_env_name(input_name))
    }

    /// Variable consulted for a `${{ <expr> }}` context reference:
    /// upper-case, dots replaced with underscores.
    pub fn context_variable(expression: &str) -> String {
        expression.trim().to_uppercase().replace('.', "_")
    }
}
