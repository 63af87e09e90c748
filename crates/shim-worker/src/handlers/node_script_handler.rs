// NodeScriptActionHandler: emulates a runner executing a Node action.
//
// Init → InputsResolved → pre? → main → post? → Translated → Persisted.
// Any failure aborts the remaining steps and nothing is written.

use std::path::PathBuf;

use shim_common::errors::Result;
use shim_common::{EnvironmentFragment, ShimSettings};

use crate::action_manifest_manager::{ActionManifest, ActionManifestManager};
use crate::environment::ResolvedEnvironment;
use crate::handlers::lifecycle::PreStage;
use crate::handlers::step_host::{NodeStepHost, StepHost};
use crate::input_resolver::{InputResolution, InputResolver};

/// What a successful invocation produced.
#[derive(Debug, Clone)]
pub struct ShimReport {
    pub inputs: Vec<InputResolution>,
    pub captured_output: String,
    pub fragment: EnvironmentFragment,
    pub fragment_path: PathBuf,
}

pub struct NodeScriptActionHandler<H: StepHost> {
    settings: ShimSettings,
    host: H,
}

impl NodeScriptActionHandler<NodeStepHost> {
    /// Handler that runs scripts with the configured interpreter.
    pub fn new(settings: ShimSettings) -> Self {
        let host = NodeStepHost::new(settings.action_path.clone(), settings.node.clone());
        Self::with_host(settings, host)
    }
}

impl<H: StepHost> NodeScriptActionHandler<H> {
    pub fn with_host(settings: ShimSettings, host: H) -> Self {
        Self { settings, host }
    }

    pub fn settings(&self) -> &ShimSettings {
        &self.settings
    }

    /// Run the whole action against `env`, which receives the `INPUT_*`
    /// values and the CI markers.
    pub async fn run(&self, env: &mut ResolvedEnvironment) -> Result<ShimReport> {
        let manifest = ActionManifestManager::load_action(&self.settings.action_path)?;
        let entry = manifest.runs.entry_points()?;
        tracing::info!(
            feature = %self.settings.feature,
            action = %manifest.name,
            "Loaded action manifest"
        );
        warn_unevaluated_conditions(&manifest);

        let inputs =
            InputResolver::new(&self.settings.feature).resolve_all(&manifest.inputs, env);
        env.mark_as_ci();
        let env: &ResolvedEnvironment = env;

        let captured = PreStage::new(&entry)
            .run(&self.host, env)
            .await?
            .run(&self.host, env)
            .await?
            .run(&self.host, env)
            .await?
            .into_string();

        let fragment = EnvironmentFragment::from_output(&captured);
        let fragment_path = self.settings.fragment_path();
        fragment.persist(&fragment_path)?;

        tracing::info!(
            path = %fragment_path.display(),
            exports = fragment.exports().len(),
            paths = fragment.paths().len(),
            "Wrote environment fragment"
        );

        Ok(ShimReport {
            inputs,
            captured_output: captured,
            fragment,
            fragment_path,
        })
    }
}

/// `pre-if` / `post-if` are not evaluated; the scripts always run.
fn warn_unevaluated_conditions(manifest: &ActionManifest) {
    let runs = &manifest.runs;
    if let (Some(condition), Some(_)) = (&runs.pre_if, &runs.pre) {
        tracing::warn!("Ignoring pre-if condition '{}'; pre runs unconditionally", condition);
    }
    if let (Some(condition), Some(_)) = (&runs.post_if, &runs.post) {
        tracing::warn!("Ignoring post-if condition '{}'; post runs unconditionally", condition);
    }
}
