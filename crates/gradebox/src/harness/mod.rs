//! Execution harness
//!
//! Runs one entry point call per invocation. Every invocation gets its own
//! scratch directory, interpreter process and capture buffers, so a crash,
//! a timeout or stray output in one case cannot leak into the next.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::capture::CapturedOutput;
use crate::config::RuntimeConfig;
use crate::monitor::ResourceUsage;
use crate::request::Submission;
use crate::runner::SetupError;
use crate::types::ResourceLimits;

pub use crate::harness::process::{ProcessOutcome, describe_exit, run_with_deadline};
pub use crate::harness::protocol::{DriverReport, DriverRequest, ProtocolError};
pub use crate::harness::synthesize::{is_identifier, synthesize};
pub use crate::harness::workspace::Workspace;

mod process;
mod protocol;
mod synthesize;
mod workspace;

/// Driver script run by the interpreter for every invocation
pub const DRIVER_SOURCE: &str = include_str!("driver.py");

const DRIVER_FILE: &str = "driver.py";
const SOURCE_FILE: &str = "submission.py";
const REQUEST_FILE: &str = "request.json";
const RESULT_FILE: &str = "result.json";

/// Errors of the harness itself, as opposed to faults of the submission
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to create scratch directory: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("runtime command is empty")]
    EmptyCommand,

    #[error("failed to spawn interpreter '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode driver request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why an invocation produced no value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionFault {
    /// The entry point (or loading the source) raised an exception
    #[error("{}", raised_text(.kind, .message))]
    Raised { kind: String, message: String },

    /// The invocation ran past its wall clock deadline and was killed
    #[error("time limit exceeded ({:.3}s)", .limit.as_secs_f64())]
    Timeout { limit: Duration },

    /// The measured memory growth was above the limit (megabytes)
    #[error("memory limit exceeded ({used:.2} MB used, limit {limit:.2} MB)")]
    MemoryLimit { used: f64, limit: f64 },

    /// The interpreter died without producing a usable report
    #[error("runtime crashed: {message}")]
    Crashed { message: String },
}

fn raised_text(kind: &str, message: &str) -> String {
    if message.is_empty() {
        kind.to_string()
    } else {
        format!("{kind}: {message}")
    }
}

/// Source text ready to run, and the callable to invoke in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub source: String,
    pub entry_point: String,
}

/// Turn a submission into a runnable program.
///
/// Free-form code must define `entry_point`; a named-function submission
/// gets its signature synthesized and is invoked by its own name.
pub fn prepare(submission: &Submission, entry_point: &str) -> Result<Program, SetupError> {
    match submission {
        Submission::FreeForm { code } => Ok(Program {
            source: code.clone(),
            entry_point: entry_point.to_string(),
        }),
        Submission::NamedFunction { name, args, body } => Ok(Program {
            source: synthesize(name, args, body)?,
            entry_point: name.clone(),
        }),
    }
}

/// Result of one entry point call
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Returned value, or why there is none
    pub outcome: Result<Value, ExecutionFault>,

    pub usage: ResourceUsage,

    /// Everything written to stdout/stderr during this call only
    pub diagnostics: CapturedOutput,
}

/// Runs a program's entry point with already coerced arguments
pub trait Executor: Send + Sync {
    /// Display name of the runtime, reported with each batch
    fn runtime_name(&self) -> &str;

    fn invoke(
        &self,
        program: &Program,
        args: &[Value],
        limits: &ResourceLimits,
    ) -> impl Future<Output = Result<Invocation, HarnessError>> + Send;
}

/// Executor running every invocation in a fresh interpreter process
#[derive(Debug, Clone)]
pub struct SubprocessExecutor {
    runtime: RuntimeConfig,
}

impl SubprocessExecutor {
    pub fn new(runtime: RuntimeConfig) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }

    async fn run_in(
        &self,
        workspace: &Workspace,
        program: &Program,
        args: &[Value],
        limits: &ResourceLimits,
    ) -> Result<Invocation, HarnessError> {
        let request = DriverRequest {
            entry_point: &program.entry_point,
            args,
        };
        workspace.write_file(DRIVER_FILE, DRIVER_SOURCE.as_bytes()).await?;
        workspace.write_file(SOURCE_FILE, program.source.as_bytes()).await?;
        workspace.write_file(REQUEST_FILE, &request.to_bytes()?).await?;

        let command = self.runtime.expand_command(
            &path_arg(workspace, DRIVER_FILE)?,
            &path_arg(workspace, SOURCE_FILE)?,
            &path_arg(workspace, REQUEST_FILE)?,
            &path_arg(workspace, RESULT_FILE)?,
        );

        let outcome = run_with_deadline(workspace, &command, &self.runtime, limits).await?;
        let wall_clock = ResourceUsage::wall_clock(outcome.elapsed);

        if outcome.timed_out() {
            let limit = limits.deadline().unwrap_or(outcome.elapsed);
            return Ok(Invocation {
                outcome: Err(ExecutionFault::Timeout { limit }),
                usage: wall_clock,
                diagnostics: outcome.output,
            });
        }

        let report = if workspace.file_exists(RESULT_FILE).await? {
            Some(DriverReport::parse(&workspace.read_file(RESULT_FILE).await?))
        } else {
            None
        };

        let invocation = match report {
            Some(Ok(report)) => Invocation {
                usage: report.usage().unwrap_or(wall_clock),
                outcome: report.into_outcome(),
                diagnostics: outcome.output,
            },
            Some(Err(err)) => {
                warn!(error = %err, "driver report unusable");
                Invocation {
                    outcome: Err(ExecutionFault::Crashed {
                        message: err.to_string(),
                    }),
                    usage: wall_clock,
                    diagnostics: outcome.output,
                }
            }
            None => {
                let mut message = outcome
                    .status
                    .map(describe_exit)
                    .unwrap_or_else(|| "no exit status".to_string());
                if let Some(tail) = outcome.output.stderr_tail() {
                    message = format!("{message}: {tail}");
                }
                Invocation {
                    outcome: Err(ExecutionFault::Crashed { message }),
                    usage: wall_clock,
                    diagnostics: outcome.output,
                }
            }
        };

        Ok(invocation)
    }
}

impl Default for SubprocessExecutor {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Executor for SubprocessExecutor {
    fn runtime_name(&self) -> &str {
        &self.runtime.name
    }

    #[instrument(skip_all, fields(entry_point = %program.entry_point, args = args.len()))]
    async fn invoke(
        &self,
        program: &Program,
        args: &[Value],
        limits: &ResourceLimits,
    ) -> Result<Invocation, HarnessError> {
        let workspace = Workspace::create()?;
        let result = self.run_in(&workspace, program, args, limits).await;
        workspace.cleanup()?;

        if let Ok(invocation) = &result {
            debug!(
                ok = invocation.outcome.is_ok(),
                time_ms = invocation.usage.time_ms,
                memory_mb = invocation.usage.memory_mb,
                "invocation complete"
            );
        }
        result
    }
}

fn path_arg(workspace: &Workspace, name: &str) -> Result<String, HarnessError> {
    Ok(workspace.file_path(name)?.to_string_lossy().into_owned())
}
