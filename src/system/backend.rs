// src/system/backend.rs

use async_trait::async_trait;
use std::fmt;

use crate::system::executor::{self, Platform, ProcessFailure, ScriptInvocation};
use crate::system::output::OutputSink;

/// The capability controllers use to run lifecycle scripts.
///
/// Orchestration logic only ever talks to this trait, so it can be exercised
/// without spawning real processes.
#[async_trait]
pub trait LifecycleBackend: Send + Sync + fmt::Debug {
    async fn run(
        &self,
        invocation: &ScriptInvocation,
        sink: Option<&dyn OutputSink>,
    ) -> Result<(), ProcessFailure>;
}

/// Runs scripts as real child processes through the platform shell.
#[derive(Debug, Clone, Copy)]
pub struct ShellBackend {
    platform: Platform,
}

impl ShellBackend {
    pub fn new() -> Self {
        Self {
            platform: Platform::current(),
        }
    }

    pub fn with_platform(platform: Platform) -> Self {
        Self { platform }
    }
}

impl Default for ShellBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LifecycleBackend for ShellBackend {
    async fn run(
        &self,
        invocation: &ScriptInvocation,
        sink: Option<&dyn OutputSink>,
    ) -> Result<(), ProcessFailure> {
        executor::run_script(invocation, self.platform, sink).await
    }
}
