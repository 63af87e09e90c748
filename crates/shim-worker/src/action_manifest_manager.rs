// ActionManifestManager: loads action.yml / action.yaml into the parts the
// Node script handler needs (declared inputs and lifecycle entry points).

use std::path::Path;

use serde_yaml::Value;
use shim_common::constants;
use shim_common::errors::{Result, ShimError};

/// Parsed action manifest. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ActionManifest {
    pub name: String,

    /// Declared inputs, in declaration order.
    pub inputs: Vec<InputDefinition>,

    pub runs: RunsConfiguration,
}

/// One entry of the `inputs:` mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDefinition {
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
    /// Raw default. Strings go through context resolution; other scalars pass through.
    pub default: Option<Value>,
}

/// The `runs:` section. Keys other than these are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunsConfiguration {
    pub using: Option<String>,
    pub main: Option<String>,
    pub pre: Option<String>,
    pub post: Option<String>,
    pub pre_if: Option<String>,
    pub post_if: Option<String>,
}

/// Validated lifecycle scripts of a Node action, relative to the action directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoints {
    pub pre: Option<String>,
    pub main: String,
    pub post: Option<String>,
}

impl RunsConfiguration {
    /// Check that this is a Node action with a `main` script.
    pub fn entry_points(&self) -> Result<EntryPoints> {
        if let Some(using) = self.using.as_deref() {
            if !constants::NODE_RUNTIMES.contains(&using) {
                return Err(ShimError::configuration(format!(
                    "runs.using '{using}' is not supported; only Node actions ({}) can be shimmed",
                    constants::NODE_RUNTIMES.join(", ")
                )));
            }
        }

        let main = self
            .main
            .clone()
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ShimError::configuration("action manifest has no runs.main entry"))?;

        Ok(EntryPoints {
            pre: self.pre.clone().filter(|p| !p.is_empty()),
            main,
            post: self.post.clone().filter(|p| !p.is_empty()),
        })
    }
}

/// Manages loading and parsing of action manifest files.
pub struct ActionManifestManager;

impl ActionManifestManager {
    /// Load the manifest from an action directory.
    ///
    /// Tries `action.yml` first, then `action.yaml`.
    pub fn load_action(action_directory: &Path) -> Result<ActionManifest> {
        let yml_path = action_directory.join(constants::path::ACTION_MANIFEST_YML_FILE);
        let yaml_path = action_directory.join(constants::path::ACTION_MANIFEST_YAML_FILE);

        let manifest_path = if yml_path.exists() || !yaml_path.exists() {
            yml_path
        } else {
            yaml_path
        };

        let content = std::fs::read_to_string(&manifest_path)
            .map_err(|e| ShimError::manifest_load(&manifest_path, e))?;

        tracing::debug!(path = %manifest_path.display(), "Loaded action manifest");

        Self::parse_action_yaml(&content)
            .map_err(|e| match e {
                ShimError::ManifestLoad { source, .. } => {
                    ShimError::manifest_load(&manifest_path, source)
                }
                other => other,
            })
    }

    /// Parse manifest text. `ManifestLoad` errors carry an empty path; callers
    /// that know the file fill it in.
    pub fn parse_action_yaml(content: &str) -> Result<ActionManifest> {
        let yaml: Value =
            serde_yaml::from_str(content).map_err(|e| ShimError::manifest_load("", e))?;

        if !yaml.is_mapping() {
            return Err(ShimError::manifest_load(
                "",
                "manifest root must be a mapping",
            ));
        }

        let name = yaml
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown Action")
            .to_string();

        let mut inputs = Vec::new();
        if let Some(inputs_map) = yaml.get("inputs").and_then(Value::as_mapping) {
            for (key, value) in inputs_map {
                let Some(name) = scalar_to_string(key) else {
                    continue;
                };
                inputs.push(parse_input(name, value));
            }
        }

        let runs_yaml = yaml
            .get("runs")
            .filter(|v| !v.is_null())
            .ok_or_else(|| ShimError::configuration("action manifest has no runs section"))?;

        let runs: RunsConfiguration = serde_yaml::from_value(runs_yaml.clone())
            .map_err(|e| ShimError::manifest_load("", e))?;

        Ok(ActionManifest { name, inputs, runs })
    }
}

fn parse_input(name: String, value: &Value) -> InputDefinition {
    let required = match value.get("required") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    };

    InputDefinition {
        name,
        description: get_string(value, "description"),
        required,
        default: value.get("default").filter(|v| !v.is_null()).cloned(),
    }
}

fn get_string(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Text of a scalar YAML value; `None` for null, sequences and mappings.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
