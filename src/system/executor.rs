// src/system/executor.rs

use crate::constants::{CHAINCODE_MODE_DEV, ENV_CHAINCODE_MODE, ENV_CHAINCODE_TIMEOUT};
use crate::system::output::{LogType, OutputSink};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum ProcessFailure {
    #[error("Script '{script}' could not be started: {source}")]
    Spawn {
        script: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Script '{script}' could not be awaited: {source}")]
    Wait {
        script: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Script '{script}' exited with code {}.", display_code(.code))]
    NonZeroExit {
        script: String,
        /// `None` when the process was terminated by a signal.
        code: Option<i32>,
        output: String,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

impl ProcessFailure {
    pub fn script(&self) -> &str {
        match self {
            Self::Spawn { script, .. } | Self::Wait { script, .. } | Self::NonZeroExit { script, .. } => {
                script
            }
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => *code,
            _ => None,
        }
    }

    /// Output captured before the script failed (empty for spawn failures).
    pub fn output(&self) -> &str {
        match self {
            Self::NonZeroExit { output, .. } => output,
            _ => "",
        }
    }
}

/// How a lifecycle script gets launched on a given OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Posix
        }
    }
}

/// One run of a lifecycle script inside an environment directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInvocation {
    pub script: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Variables layered over the inherited process environment.
    pub env: HashMap<String, String>,
}

impl ScriptInvocation {
    pub fn new(script: impl Into<String>, args: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            args,
            cwd: cwd.into(),
            env: HashMap::new(),
        }
    }

    /// Adds the chaincode overrides every lifecycle script runs with.
    pub fn with_chaincode_overlay(mut self, timeout_secs: u64) -> Self {
        self.env
            .insert(ENV_CHAINCODE_MODE.to_string(), CHAINCODE_MODE_DEV.to_string());
        self.env
            .insert(ENV_CHAINCODE_TIMEOUT.to_string(), format!("{}s", timeout_secs));
        self
    }

    /// Resolves the program and argument list for the given platform.
    /// POSIX runs `/bin/sh <script>.sh`, Windows runs `cmd /c <script>.cmd`.
    pub fn command_line(&self, platform: Platform) -> (String, Vec<String>) {
        let (program, mut args) = match platform {
            Platform::Posix => ("/bin/sh".to_string(), vec![format!("{}.sh", self.script)]),
            Platform::Windows => (
                "cmd".to_string(),
                vec!["/c".to_string(), format!("{}.cmd", self.script)],
            ),
        };
        args.extend(self.args.iter().cloned());
        (program, args)
    }
}

/// Runs a lifecycle script to completion, streaming its output line by line.
///
/// Stdout lines are logged as [`LogType::Info`], stderr lines as
/// [`LogType::Warning`]. Both streams are also captured so a failure can carry
/// the full output back to the caller.
pub async fn run_script(
    invocation: &ScriptInvocation,
    platform: Platform,
    sink: Option<&dyn OutputSink>,
) -> Result<(), ProcessFailure> {
    let (program, args) = invocation.command_line(platform);
    let clean_cwd = dunce::simplified(&invocation.cwd);

    if log::log_enabled!(log::Level::Debug) {
        let printable = shlex::try_join(
            std::iter::once(program.as_str()).chain(args.iter().map(String::as_str)),
        )
        .unwrap_or_else(|_| format!("{} {}", program, args.join(" ")));
        log::debug!("Running '{}' in '{}'", printable, clean_cwd.display());
    }

    let mut child = Command::new(&program)
        .args(&args)
        .current_dir(clean_cwd)
        .envs(&invocation.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProcessFailure::Spawn {
            script: invocation.script.clone(),
            source,
        })?;

    let captured = Mutex::new(String::new());
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (status, (), ()) = tokio::join!(
        child.wait(),
        pump_lines(stdout, LogType::Info, sink, &captured),
        pump_lines(stderr, LogType::Warning, sink, &captured),
    );

    let status = status.map_err(|source| ProcessFailure::Wait {
        script: invocation.script.clone(),
        source,
    })?;
    log::debug!("Script '{}' finished with {}", invocation.script, status);

    if status.success() {
        return Ok(());
    }
    let output = captured.into_inner().unwrap_or_default();
    Err(ProcessFailure::NonZeroExit {
        script: invocation.script.clone(),
        code: status.code(),
        output,
    })
}

/// Forwards a stream to the sink line by line until EOF.
///
/// Bytes that are not UTF-8 are replaced, not rejected. The stream is always
/// drained to the end: dropping the pipe early would kill the script with SIGPIPE.
async fn pump_lines<R>(
    stream: Option<R>,
    kind: LogType,
    sink: Option<&dyn OutputSink>,
    captured: &Mutex<String>,
) where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };
    let mut reader = BufReader::new(stream);
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw).await {
            Ok(0) => return,
            Ok(_) => {
                let line = String::from_utf8_lossy(trim_line_ending(&raw));
                if let Some(sink) = sink {
                    sink.log(kind, &line, None);
                }
                if let Ok(mut buffer) = captured.lock() {
                    buffer.push_str(&line);
                    buffer.push('\n');
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::warn!("Could not read script output: {}", e);
                let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
                return;
            }
        }
    }
}

fn trim_line_ending(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}
