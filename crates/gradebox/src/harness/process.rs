//! Interpreter process supervision
//!
//! Spawns the interpreter inside a workspace in its own process group,
//! captures its output, and kills the whole group once the wall clock
//! deadline passes or the interpreter exits.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, instrument, warn};

use crate::capture::{CapturedOutput, OutputCapture};
use crate::config::RuntimeConfig;
use crate::harness::HarnessError;
use crate::harness::workspace::Workspace;
use crate::monitor::Stopwatch;
use crate::types::ResourceLimits;

/// How long to keep draining output after the interpreter is gone.
///
/// A descendant that left the process group can hold the pipes open
/// indefinitely.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// How the interpreter process ended
#[derive(Debug)]
pub struct ProcessOutcome {
    /// Exit status, or `None` if the process was killed at the deadline
    pub status: Option<ExitStatus>,

    /// Host wall clock time from spawn to exit
    pub elapsed: Duration,

    pub output: CapturedOutput,
}

impl ProcessOutcome {
    pub fn timed_out(&self) -> bool {
        self.status.is_none()
    }
}

/// Run the interpreter to completion or until the deadline
#[instrument(skip_all, fields(program = args.first().map(String::as_str)))]
pub async fn run_with_deadline(
    workspace: &Workspace,
    args: &[String],
    runtime: &RuntimeConfig,
    limits: &ResourceLimits,
) -> Result<ProcessOutcome, HarnessError> {
    let program = args.first().ok_or(HarnessError::EmptyCommand)?;

    debug!(?args, "spawning interpreter");

    let mut command = Command::new(program);
    command
        .args(&args[1..])
        .current_dir(workspace.path())
        .env_clear()
        .env("PATH", &runtime.path)
        .envs(&runtime.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Own process group, so everything the submission starts can be killed with it
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|source| HarnessError::SpawnFailed {
        program: program.clone(),
        source,
    })?;
    let group = child.id();

    let capture = OutputCapture::new(limits.max_output_bytes())
        .attach(child.stdout.take(), child.stderr.take());
    let stopwatch = Stopwatch::start();

    let status = match limits.deadline() {
        Some(deadline) => match tokio::time::timeout(deadline, child.wait()).await {
            Ok(status) => Some(status?),
            Err(_) => {
                warn!(?deadline, "deadline passed, killing interpreter");
                kill_process_group(group);
                child.kill().await?;
                None
            }
        },
        None => Some(child.wait().await?),
    };
    let elapsed = stopwatch.elapsed();

    // Descendants left running after a normal exit end with the invocation too
    kill_process_group(group);

    let output = capture.finish_within(DRAIN_GRACE).await?;

    debug!(?status, ?elapsed, "interpreter finished");

    Ok(ProcessOutcome {
        status,
        elapsed,
        output,
    })
}

/// Send SIGKILL to every process left in the interpreter's group
#[cfg(unix)]
fn kill_process_group(group: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pgid) = group.and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => warn!(%err, pgid, "failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_group: Option<u32>) {}

/// Human-readable description of an abnormal exit
pub fn describe_exit(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit code {code}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("killed by signal {signal}");
        }
    }
    "terminated abnormally".to_string()
}
