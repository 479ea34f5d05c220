//! # System Interaction Layer
//!
//! This module is the boundary between the orchestration logic and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: Spawns one lifecycle script (`start.sh`, `stop.cmd`, ...) as a child
//!   process, streams its output and maps its exit status to a `ProcessFailure`.
//! - **`backend`**: The `LifecycleBackend` trait controllers depend on, and the
//!   `ShellBackend` that forwards to `executor`.
//! - **`output`**: The `OutputSink` trait that receives script output, plus the console
//!   and in-memory sinks.

pub mod backend;
pub mod executor;
pub mod output;
