// shim-sdk: Foundation layer for the action shim.
// This crate has ZERO dependencies on other shim crates and provides the
// tracing seam and the child process invoker used to run lifecycle scripts.

pub mod process_invoker;
pub mod trace;
pub mod which_util;

// Re-export commonly used items at crate root
pub use process_invoker::{
    NullForwarder, OutputForwarder, OutputStream, ProcessError, ProcessInvoker, ProcessOutput,
    ProcessTermination, StdioForwarder,
};
pub use trace::{NullTraceWriter, TraceWriter, TracingTraceWriter};
pub use which_util::WhichUtil;
