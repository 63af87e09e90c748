// Error kinds surfaced by a shim invocation. Every one of them is fatal: the
// remaining lifecycle is skipped and no environment fragment is written.

use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used across the shim crates.
pub type Result<T> = std::result::Result<T, ShimError>;

#[derive(Debug, thiserror::Error)]
pub enum ShimError {
    /// The manifest is missing or could not be parsed.
    #[error("Failed to load action manifest {}: {source}", .path.display())]
    ManifestLoad {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    /// The interpreter or script could not be started.
    #[error("Failed to start '{program}': {source}")]
    ScriptSpawn {
        program: String,
        #[source]
        source: BoxError,
    },

    /// A lifecycle script exited non-zero or was killed by a signal.
    #[error("{}", describe_execution_failure(.script, .exit_code, .signal))]
    ScriptExecution {
        script: String,
        exit_code: Option<i32>,
        signal: Option<String>,
        /// Everything captured in this invocation up to and including the failing script.
        partial_output: String,
    },

    /// Required settings are absent or the manifest declares something unsupported.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ShimError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ShimError::Configuration(message.into())
    }

    pub fn manifest_load(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        ShimError::ManifestLoad {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Prepend output captured by earlier lifecycle stages to a script failure.
    pub fn with_prior_output(self, prior: &str) -> Self {
        match self {
            ShimError::ScriptExecution {
                script,
                exit_code,
                signal,
                partial_output,
            } if !prior.is_empty() => ShimError::ScriptExecution {
                script,
                exit_code,
                signal,
                partial_output: format!("{prior}{partial_output}"),
            },
            other => other,
        }
    }

    /// Exit code the shim process should terminate with for this error.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            ShimError::ScriptExecution {
                exit_code: Some(code),
                ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

fn describe_execution_failure(
    script: &str,
    exit_code: &Option<i32>,
    signal: &Option<String>,
) -> String {
    match (exit_code, signal) {
        (_, Some(signal)) => format!("Script '{script}' terminated by signal {signal}"),
        (Some(code), None) => format!("Script '{script}' failed with non-zero exit code: {code}"),
        (None, None) => format!("Script '{script}' failed"),
    }
}
