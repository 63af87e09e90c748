// Context interpolation for manifest defaults.
//
// Replaces every `${{ <expr> }}` placeholder with the environment variable
// named by upper-casing `<expr>` and turning dots into underscores, so
// `${{ github.token }}` reads `GITHUB_TOKEN`. Only dotted-name lookup is
// supported: no operators, functions or conditionals.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_yaml::Value;

use shim_common::VarUtil;

use crate::environment::ResolvedEnvironment;

static CONTEXT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{\{([^}]+)\}\}").expect("context pattern is a valid regex"));

/// Substitute context placeholders in a string. Unset variables become the
/// empty string; substituted text is never expanded again.
pub fn resolve_str(value: &str, env: &ResolvedEnvironment) -> String {
    CONTEXT_PATTERN
        .replace_all(value, |caps: &Captures<'_>| {
            let name = VarUtil::context_variable(&caps[1]);
            env.get(&name).unwrap_or_default().to_string()
        })
        .into_owned()
}

/// Substitute context placeholders in a manifest value. Non-string values
/// pass through unchanged.
pub fn resolve_contexts(value: &Value, env: &ResolvedEnvironment) -> Value {
    match value {
        Value::String(s) => Value::String(resolve_str(s, env)),
        other => other.clone(),
    }
}
