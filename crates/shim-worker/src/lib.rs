// shim-worker: runs a Node action's lifecycle scripts outside a runner.
// Depends on `shim-sdk` and `shim-common`.
//
// Architecture:
//   main → ShimSettings::from_lookup → NodeScriptActionHandler::run
//     → InputResolver::resolve_all → PreStage → MainStage → PostStage
//     → EnvironmentFragment::persist

pub mod action_manifest_manager;
pub mod environment;
pub mod expressions;
pub mod handlers;
pub mod input_resolver;
