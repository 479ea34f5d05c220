// src/testing.rs

//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::constants::{
    SCRIPT_GENERATE, SCRIPT_IS_GENERATED, SCRIPT_IS_RUNNING, SCRIPT_START, SCRIPT_STOP,
    SCRIPT_TEARDOWN,
};
use crate::system::backend::LifecycleBackend;
use crate::system::executor::{ProcessFailure, ScriptInvocation};
use crate::system::output::{LogType, OutputSink};

/// A backend that simulates a network instead of spawning processes.
///
/// Every invocation is recorded. `start` marks the network running, `stop` and
/// `teardown` mark it stopped, `generate` marks it generated. Scripts listed
/// with [`FakeBackend::fail`] exit with code 1 without side effects.
#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    calls: Mutex<Vec<ScriptInvocation>>,
    failing: Mutex<HashSet<String>>,
    running: AtomicBool,
    generated: AtomicBool,
}

impl FakeBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail(&self, script: &str) {
        self.failing.lock().unwrap().insert(script.to_string());
    }

    pub(crate) fn succeed(&self, script: &str) {
        self.failing.lock().unwrap().remove(script);
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub(crate) fn set_generated(&self, generated: bool) {
        self.generated.store(generated, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<ScriptInvocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Script names in invocation order.
    pub(crate) fn scripts(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.script).collect()
    }

    /// Script names in invocation order, ignoring the status checks.
    pub(crate) fn lifecycle_scripts(&self) -> Vec<String> {
        self.scripts()
            .into_iter()
            .filter(|s| s != SCRIPT_IS_RUNNING && s != SCRIPT_IS_GENERATED)
            .collect()
    }

    pub(crate) fn count(&self, script: &str) -> usize {
        self.calls().iter().filter(|c| c.script == script).count()
    }

    fn failure(script: &str) -> ProcessFailure {
        ProcessFailure::NonZeroExit {
            script: script.to_string(),
            code: Some(1),
            output: format!("{} failed\n", script),
        }
    }
}

#[async_trait]
impl LifecycleBackend for FakeBackend {
    async fn run(
        &self,
        invocation: &ScriptInvocation,
        sink: Option<&dyn OutputSink>,
    ) -> Result<(), ProcessFailure> {
        self.calls.lock().unwrap().push(invocation.clone());
        let script = invocation.script.as_str();

        if script == SCRIPT_IS_RUNNING {
            // Stay pending for a few polls so concurrent callers overlap.
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
        }

        if self.failing.lock().unwrap().contains(script) {
            return Err(Self::failure(script));
        }

        if let Some(sink) = sink {
            sink.log(LogType::Info, &format!("running {}", script), None);
        }

        match script {
            SCRIPT_IS_RUNNING if !self.running.load(Ordering::SeqCst) => Err(Self::failure(script)),
            SCRIPT_IS_GENERATED if !self.generated.load(Ordering::SeqCst) => {
                Err(Self::failure(script))
            }
            SCRIPT_GENERATE => {
                self.generated.store(true, Ordering::SeqCst);
                Ok(())
            }
            SCRIPT_START => {
                self.running.store(true, Ordering::SeqCst);
                Ok(())
            }
            SCRIPT_STOP => {
                self.running.store(false, Ordering::SeqCst);
                Ok(())
            }
            SCRIPT_TEARDOWN => {
                self.running.store(false, Ordering::SeqCst);
                self.generated.store(false, Ordering::SeqCst);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
