//! Stopping a probed server together with everything it started.
//!
//! Servers are often launched through a wrapper (`sh -c`, `npx`,
//! `cmd /c npx`) that forks the real server. Signalling only the direct
//! child would leave that process running, so probes are spawned as the
//! leader of their own process group (Unix) and the whole group or tree is
//! stopped.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::{Child, Command};

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{Signal, killpg};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use tokio::time::{sleep, timeout};

/// Poll interval while waiting for the rest of a process group to exit.
#[cfg(unix)]
const GROUP_POLL: Duration = Duration::from_millis(20);

/// Make the spawned process the root of a tree that can be stopped as one.
pub fn isolate(cmd: &mut Command) {
    #[cfg(unix)]
    cmd.process_group(0);

    #[cfg(not(unix))]
    let _ = cmd;
}

/// Stop the process tree rooted at `child` and reap `child`.
///
/// `leader` is the pid captured at spawn time; it is still needed when
/// `child` has already exited but left descendants behind.
///
/// # Platform behavior
/// - Unix: SIGTERM to the process group, wait up to `grace` for the group
///   to empty, then SIGKILL the group
/// - Windows: `taskkill /T /F` on the tree, then kill the child handle
pub async fn shutdown_tree(
    child: &mut Child,
    leader: Option<u32>,
    grace: Duration,
) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        shutdown_group(child, leader, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        if let Some(pid) = leader {
            kill_tree(pid).await;
        }
        // Already gone if taskkill reached it.
        let _ = child.start_kill();
        child.wait().await
    }
}

#[cfg(unix)]
async fn shutdown_group(
    child: &mut Child,
    leader: Option<u32>,
    grace: Duration,
) -> io::Result<ExitStatus> {
    let Some(pgid) = leader
        .and_then(|pid| i32::try_from(pid).ok())
        .map(Pid::from_raw)
    else {
        return child.wait().await;
    };

    if !signal_group(pgid, Some(Signal::SIGTERM))? {
        return child.wait().await;
    }

    let drained = timeout(grace, async {
        let status = child.wait().await;
        while signal_group(pgid, None).unwrap_or(false) {
            sleep(GROUP_POLL).await;
        }
        status
    })
    .await;
    if let Ok(status) = drained {
        return status;
    }

    tracing::debug!(pgid = pgid.as_raw(), "Process group outlived SIGTERM, sending SIGKILL");
    signal_group(pgid, Some(Signal::SIGKILL))?;
    child.wait().await
}

/// Send `signal` to the group. `None` only checks that the group exists.
///
/// Returns `false` when no process is left in the group.
#[cfg(unix)]
fn signal_group(pgid: Pid, signal: Option<Signal>) -> io::Result<bool> {
    match killpg(pgid, signal) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(io::Error::other(e)),
    }
}

#[cfg(not(unix))]
async fn kill_tree(pid: u32) {
    let status = Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await;
    match status {
        Ok(status) if status.success() => {}
        Ok(status) => tracing::debug!(pid, %status, "taskkill did not stop the process tree"),
        Err(e) => tracing::warn!(pid, error = %e, "Failed to run taskkill"),
    }
}
