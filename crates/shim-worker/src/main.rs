// Entry point for the action shim.
//
// Configuration comes from the environment (`GITHUB_ACTION_PATH`,
// `ACTIONS_SHIM_FEATURE_ID`, `ACTION_SHIM_PROFILE_D`, `ACTION_SHIM_NODE`);
// command-line flags override those values. The process exits with the
// failing script's exit code, or 1 for any other failure.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;

use shim_common::constants::variables;
use shim_common::{ShimError, ShimSettings};
use shim_worker::environment::ResolvedEnvironment;
use shim_worker::handlers::node_script_handler::NodeScriptActionHandler;

/// Command-line arguments for the shim.
#[derive(Parser, Debug)]
#[command(
    name = "action-shim",
    version,
    about = "Run a Node action's lifecycle scripts and export its environment changes"
)]
struct Args {
    /// Directory containing action.yml and the action's scripts.
    #[arg(long)]
    action_path: Option<String>,

    /// Identifier of the feature wrapping the action.
    #[arg(long)]
    feature_id: Option<String>,

    /// Directory the environment fragment is written to.
    #[arg(long)]
    profile_dir: Option<String>,

    /// Interpreter used to launch the lifecycle scripts.
    #[arg(long)]
    node: Option<String>,
}

impl Args {
    fn apply(self, env: &mut ResolvedEnvironment) {
        let overrides = [
            (variables::ACTION_PATH, self.action_path),
            (variables::FEATURE_ID, self.feature_id),
            (variables::PROFILE_DIR, self.profile_dir),
            (variables::NODE, self.node),
        ];
        for (name, value) in overrides {
            if let Some(value) = value {
                env.set(name, value);
            }
        }
    }
}

fn main() {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the scripts' own output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let exit_code = match start(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Action shim failed to start: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

fn start(args: Args) -> Result<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    Ok(runtime.block_on(async move { run(args).await }))
}

async fn run(args: Args) -> i32 {
    let mut env = ResolvedEnvironment::from_process();
    args.apply(&mut env);

    let settings = match ShimSettings::from_lookup(|name| env.get(name).map(str::to_string)) {
        Ok(settings) => settings,
        Err(e) => return fail(e),
    };

    tracing::info!(
        feature = %settings.feature,
        action_path = %settings.action_path.display(),
        "Action shim starting"
    );

    let handler = NodeScriptActionHandler::new(settings);
    match handler.run(&mut env).await {
        Ok(report) => {
            tracing::info!(
                "Action shim completed; {} input(s) resolved, fragment at {}",
                report.inputs.len(),
                report.fragment_path.display()
            );
            0
        }
        Err(e) => fail(e),
    }
}

fn fail(error: ShimError) -> i32 {
    tracing::error!("{}", error);
    if let ShimError::ScriptExecution { partial_output, .. } = &error {
        if !partial_output.is_empty() {
            let mut stderr = std::io::stderr().lock();
            let _ = stderr.write_all(partial_output.as_bytes());
            let _ = stderr.flush();
        }
    }
    error.process_exit_code()
}
