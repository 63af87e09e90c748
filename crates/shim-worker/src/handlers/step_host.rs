// StepHost: runs one lifecycle script and hands back its captured output.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use shim_common::constants::variables;
use shim_common::errors::{Result, ShimError};
use shim_sdk::{
    OutputForwarder, ProcessError, ProcessInvoker, StdioForwarder, TraceWriter, TracingTraceWriter,
    WhichUtil,
};

use crate::environment::ResolvedEnvironment;

/// Executes a lifecycle script to completion.
///
/// Implementations resolve `script` relative to the action directory, pass the
/// full resolved environment to the child, and return the combined
/// stdout+stderr text. A non-zero exit or signal is a `ScriptExecution` error
/// carrying the output captured so far.
#[async_trait]
pub trait StepHost: Send + Sync {
    async fn run_script(&self, script: &str, env: &ResolvedEnvironment) -> Result<String>;
}

/// Runs scripts on the host with a Node-compatible interpreter.
pub struct NodeStepHost {
    action_path: PathBuf,
    interpreter: String,
    invoker: ProcessInvoker,
}

impl NodeStepHost {
    /// A host that forwards script output to this process's stdout / stderr.
    pub fn new(action_path: impl Into<PathBuf>, interpreter: impl Into<String>) -> Self {
        Self::with_io(
            action_path,
            interpreter,
            Arc::new(TracingTraceWriter::new("step_host")),
            Arc::new(StdioForwarder),
        )
    }

    pub fn with_io(
        action_path: impl Into<PathBuf>,
        interpreter: impl Into<String>,
        trace: Arc<dyn TraceWriter>,
        forwarder: Arc<dyn OutputForwarder>,
    ) -> Self {
        Self {
            action_path: action_path.into(),
            interpreter: interpreter.into(),
            invoker: ProcessInvoker::new(trace, forwarder),
        }
    }

    /// Locate the interpreter on the `PATH` the child will see.
    fn resolve_interpreter(&self, env: &ResolvedEnvironment) -> Result<PathBuf> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        WhichUtil::which_in(&self.interpreter, env.get_os(variables::PATH), &cwd).map_err(|e| {
            ShimError::ScriptSpawn {
                program: self.interpreter.clone(),
                source: Box::new(e),
            }
        })
    }

    fn script_path(&self, script: &str) -> PathBuf {
        self.action_path.join(script)
    }
}

#[async_trait]
impl StepHost for NodeStepHost {
    async fn run_script(&self, script: &str, env: &ResolvedEnvironment) -> Result<String> {
        let script_path = self.script_path(script);
        tracing::info!("Executing {}", script_path.display());

        let interpreter = self.resolve_interpreter(env)?;
        let arguments = vec![script_path.to_string_lossy().into_owned()];

        let output = self
            .invoker
            .execute(None, &interpreter, &arguments, &env.snapshot())
            .await
            .map_err(|e| spawn_error(&interpreter, e))?;

        let text = output.combined_text();
        if output.termination.success() {
            return Ok(text);
        }

        Err(ShimError::ScriptExecution {
            script: script.to_string(),
            exit_code: output.termination.exit_code(),
            signal: output.termination.signal_name(),
            partial_output: text,
        })
    }
}

fn spawn_error(interpreter: &Path, error: ProcessError) -> ShimError {
    ShimError::ScriptSpawn {
        program: interpreter.display().to_string(),
        source: Box::new(error),
    }
}
