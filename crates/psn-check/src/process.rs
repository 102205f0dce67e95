use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::warn;

/// How long a pipe reader may block before the process group is killed.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Captured streams of a finished child process.
#[derive(Debug)]
pub(crate) struct Captured {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

impl Captured {
    /// Stdout and stderr, each trimmed, stdout first.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (false, false) => format!("{stdout}\n{stderr}"),
            (false, true) => stdout.to_string(),
            _ => stderr.to_string(),
        }
    }
}

#[derive(Debug)]
pub(crate) enum RunError {
    Spawn(io::Error),
    Wait(io::Error),
    TimedOut(Duration),
}

/// Runs `command` to completion, killing its whole process group once
/// `limit` elapses or waiting fails.
pub(crate) fn run_captured(
    mut command: Command,
    limit: Option<Duration>,
) -> Result<Captured, RunError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(RunError::Spawn)?;
    runtime.block_on(supervise(tokio::process::Command::from(command), limit))
}

async fn supervise(
    mut command: tokio::process::Command,
    limit: Option<Duration>,
) -> Result<Captured, RunError> {
    let mut child = command.kill_on_drop(true).spawn().map_err(RunError::Spawn)?;
    let pid = child.id();
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let outcome = match limit {
        Some(limit) => match timeout(limit, child.wait()).await {
            Ok(waited) => waited.map_err(RunError::Wait),
            Err(_) => Err(RunError::TimedOut(limit)),
        },
        None => child.wait().await.map_err(RunError::Wait),
    };
    if outcome.is_err() {
        kill_group(pid);
        let _ = child.kill().await;
    }

    let stdout = collect(stdout, pid).await;
    let stderr = collect(stderr, pid).await;
    outcome.map(|status| Captured {
        stdout,
        stderr,
        status,
    })
}

/// Sends `SIGKILL` to every process in the group led by `pid`.
#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    let Some(pid) = pid else { return };
    let group = format!("-{pid}");
    match Command::new("kill").args(["-KILL", "--", &group]).status() {
        Ok(status) if status.success() => {}
        Ok(status) => warn!(pid, %status, "process group kill reported failure"),
        Err(err) => warn!(pid, %err, "failed to signal process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

fn drain<R>(stream: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = Vec::new();
        if let Some(mut stream) = stream {
            let _ = stream.read_to_end(&mut buffer).await;
        }
        buffer
    })
}

/// Joins a pipe reader. A reader still blocked after the grace period means a
/// leftover process holds the pipe, so the group is killed before retrying.
async fn collect(mut handle: JoinHandle<Vec<u8>>, pid: Option<u32>) -> String {
    let joined = match timeout(DRAIN_GRACE, &mut handle).await {
        Ok(joined) => Some(joined),
        Err(_) => {
            warn!("checker left a process holding its output open");
            kill_group(pid);
            timeout(DRAIN_GRACE, handle).await.ok()
        }
    };
    let bytes = match joined {
        Some(Ok(bytes)) => bytes,
        Some(Err(err)) => {
            warn!(%err, "pipe reader failed");
            Vec::new()
        }
        None => Vec::new(),
    };
    String::from_utf8_lossy(&bytes).into_owned()
}
