// Handlers module - runs a Node action's lifecycle scripts and persists the result.

pub mod lifecycle;
pub mod node_script_handler;
pub mod step_host;
