//! Runs child processes side by side and tears them all down together.
//!
//! The first child to exit decides the outcome; every sibling still running
//! is then stopped. A shutdown future resolving first does the same, with an
//! `Interrupted` outcome. Stopping sends SIGTERM on unix and kills the child
//! only if it is still running after the grace period.

use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinSet;

/// A process to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSpec {
    /// Label used in logs and outcomes
    pub name: String,
    pub program: OsString,
    pub args: Vec<OsString>,
    /// Working directory; inherited when unset
    pub cwd: Option<PathBuf>,
}

impl ChildSpec {
    pub fn new(name: impl Into<String>, program: impl Into<OsString>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

/// How a supervision run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A child exited on its own. `code` is absent when it was killed by a
    /// signal or could not be waited on.
    Exited {
        name: String,
        code: Option<i32>,
        signal: Option<i32>,
    },
    /// A child could not be started
    SpawnFailed { name: String },
    /// The shutdown future resolved first
    Interrupted,
}

impl Outcome {
    /// Exit code for a supervisor of several children: the child's own code,
    /// 1 when it has none or failed to start, 0 when interrupted.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Exited { code, .. } => code.unwrap_or(1),
            Outcome::SpawnFailed { .. } => 1,
            Outcome::Interrupted => 0,
        }
    }

    /// Exit code for a transparent wrapper: like [`Outcome::exit_code`], but a
    /// child killed by a signal maps to `128 + signal`, as a shell reports it.
    pub fn forwarded_exit_code(&self) -> i32 {
        match self {
            Outcome::Exited {
                code: None,
                signal: Some(signal),
                ..
            } => 128 + signal,
            other => other.exit_code(),
        }
    }

    fn exited(name: String, status: ExitStatus) -> Self {
        Outcome::Exited {
            name,
            code: status.code(),
            signal: exit_signal(status),
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: ExitStatus) -> Option<i32> {
    None
}

/// Spawn every spec, then wait for the first child exit or for `shutdown`.
/// All remaining children are stopped before this returns; each gets
/// `grace` to exit after SIGTERM.
pub async fn supervise<F>(specs: Vec<ChildSpec>, shutdown: F, grace: Duration) -> Outcome
where
    F: Future<Output = ()>,
{
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut running = JoinSet::new();

    for spec in specs {
        match spec.command().spawn() {
            Ok(child) => {
                tracing::info!(child = %spec.name, pid = ?child.id(), "process started");
                running.spawn(watch_child(spec.name, child, stop_rx.clone(), grace));
            }
            Err(e) => {
                tracing::error!(child = %spec.name, program = ?spec.program, error = %e, "failed to start process");
                stop_all(&stop_tx, &mut running).await;
                return Outcome::SpawnFailed { name: spec.name };
            }
        }
    }

    // A Ctrl+C reaches the children too; the signal wins over their exit.
    let outcome = tokio::select! {
        biased;
        _ = shutdown => {
            tracing::info!("shutdown requested, stopping processes");
            Outcome::Interrupted
        }
        joined = running.join_next() => match joined {
            Some(Ok(ChildEnd::Exited(outcome))) => outcome,
            Some(Ok(ChildEnd::Stopped)) => Outcome::Interrupted,
            Some(Err(e)) => {
                tracing::error!(error = %e, "process watcher failed");
                Outcome::Exited { name: "unknown".to_string(), code: None, signal: None }
            }
            None => {
                tracing::debug!("nothing to supervise");
                Outcome::Interrupted
            }
        },
    };

    if let Outcome::Exited { name, code, signal } = &outcome {
        tracing::info!(child = %name, ?code, ?signal, "process exited, stopping siblings");
    }

    stop_all(&stop_tx, &mut running).await;
    outcome
}

enum ChildEnd {
    Exited(Outcome),
    Stopped,
}

async fn watch_child(
    name: String,
    mut child: Child,
    mut stop: watch::Receiver<bool>,
    grace: Duration,
) -> ChildEnd {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => ChildEnd::Exited(Outcome::exited(name, status)),
            Err(e) => {
                tracing::error!(child = %name, error = %e, "failed to wait for process");
                ChildEnd::Exited(Outcome::Exited { name, code: None, signal: None })
            }
        },
        _ = stop_requested(&mut stop) => {
            stop_child(&name, &mut child, grace).await;
            ChildEnd::Stopped
        }
    }
}

async fn stop_child(name: &str, child: &mut Child, grace: Duration) {
    if request_termination(name, child) {
        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(child = %name, %status, "process stopped");
                return;
            }
            Ok(Err(e)) => {
                tracing::warn!(child = %name, error = %e, "failed to wait for process");
            }
            Err(_) => {
                tracing::warn!(child = %name, ?grace, "process still running after SIGTERM, killing");
            }
        }
    }

    match child.kill().await {
        Ok(()) => tracing::info!(child = %name, "process killed"),
        Err(e) => tracing::debug!(child = %name, error = %e, "process already gone"),
    }
}

/// Ask the child to exit with SIGTERM; false when no signal was delivered.
#[cfg(unix)]
fn request_termination(name: &str, child: &Child) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return false;
    };

    match kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(child = %name, pid, error = %e, "failed to send SIGTERM");
            false
        }
    }
}

#[cfg(not(unix))]
fn request_termination(_name: &str, _child: &Child) -> bool {
    false
}

async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    // A closed channel also means stop.
    let _ = stop.wait_for(|stopped| *stopped).await;
}

async fn stop_all(stop_tx: &watch::Sender<bool>, running: &mut JoinSet<ChildEnd>) {
    let _ = stop_tx.send(true);
    while running.join_next().await.is_some() {}
}
