// InputResolver: gives every declared input its `INPUT_<NAME>` value.
//
// Precedence, first match wins:
//   1. a non-empty `INPUT_<NAME>` already in the environment
//   2. the feature's build option `<prefix>_<NAME>` (set, even if empty)
//   3. the manifest default, after context interpolation
//   4. nothing; the input stays unset

use shim_common::{FeatureId, VarUtil};

use crate::action_manifest_manager::{scalar_to_string, InputDefinition};
use crate::environment::ResolvedEnvironment;
use crate::expressions;

/// Which rule produced an input's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    AlreadySet,
    BuildOption { variable: String },
    Default,
    Unset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputResolution {
    pub input: String,
    pub variable: String,
    pub outcome: InputOutcome,
}

pub struct InputResolver {
    option_prefix: String,
}

impl InputResolver {
    pub fn new(feature: &FeatureId) -> Self {
        Self {
            option_prefix: feature.option_prefix(),
        }
    }

    pub fn option_prefix(&self) -> &str {
        &self.option_prefix
    }

    /// Resolve all inputs in declaration order, writing into `env`.
    pub fn resolve_all(
        &self,
        inputs: &[InputDefinition],
        env: &mut ResolvedEnvironment,
    ) -> Vec<InputResolution> {
        inputs.iter().map(|input| self.resolve(input, env)).collect()
    }

    pub fn resolve(&self, input: &InputDefinition, env: &mut ResolvedEnvironment) -> InputResolution {
        let variable = VarUtil::input_variable(&input.name);

        let outcome = if let Some(existing) = env.get_non_empty(&variable) {
            tracing::info!("Input {} already set to {}", input.name, existing);
            InputOutcome::AlreadySet
        } else {
            let option = VarUtil::build_option_variable(&self.option_prefix, &input.name);
            if let Some(value) = env.get(&option).map(str::to_string) {
                tracing::info!("Input {} set to {}", input.name, value);
                env.set(variable.clone(), value);
                InputOutcome::BuildOption { variable: option }
            } else if let Some(value) = input
                .default
                .as_ref()
                .map(|d| expressions::resolve_contexts(d, env))
                .and_then(|d| scalar_to_string(&d))
            {
                tracing::info!("Setting {} to default {}", input.name, value);
                env.set(variable.clone(), value);
                InputOutcome::Default
            } else {
                if input.required {
                    tracing::warn!(
                        "Input {} is required but has no value, default or build option",
                        input.name
                    );
                } else {
                    tracing::debug!("Input {} left unset", input.name);
                }
                InputOutcome::Unset
            }
        };

        InputResolution {
            input: input.name.clone(),
            variable,
            outcome,
        }
    }
}
