// src/exec/process.rs

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::LoopEvent;
use crate::errors::{DevloopError, Result};

/// Monotonic number identifying one launch of the artifact.
///
/// Exit events carry it so that a late exit from a replaced instance is not
/// mistaken for the current one stopping.
pub type Generation = u64;

/// A running child process owned by the supervisor.
pub trait ProcessHandle: Send {
    /// OS process id, or `None` once the process has been reaped.
    fn id(&self) -> Option<u32>;

    /// Ask the process to stop with the platform's terminate signal.
    ///
    /// Does not wait for the process to exit. A process that has already
    /// been reaped is not signalled.
    fn terminate(&mut self) -> Result<()>;
}

/// Trait abstracting how the artifact is started.
///
/// Production code uses [`ProcessLauncher`]; tests record launches and
/// terminations without spawning anything.
pub trait Launcher: Send {
    fn launch(
        &mut self,
        artifact: &Path,
        args: &[String],
        generation: Generation,
    ) -> Result<Box<dyn ProcessHandle>>;
}

/// Spawns the artifact with `tokio::process`.
///
/// - stdout is inherited.
/// - stderr is copied verbatim to our stdout, chunk by chunk.
/// - when the child exits, `LoopEvent::ProcessExited` is sent into the loop.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    workdir: PathBuf,
    loop_tx: mpsc::Sender<LoopEvent>,
}

impl ProcessLauncher {
    pub fn new(workdir: impl Into<PathBuf>, loop_tx: mpsc::Sender<LoopEvent>) -> Self {
        Self {
            workdir: workdir.into(),
            loop_tx,
        }
    }
}

impl Launcher for ProcessLauncher {
    fn launch(
        &mut self,
        artifact: &Path,
        args: &[String],
        generation: Generation,
    ) -> Result<Box<dyn ProcessHandle>> {
        let mut cmd = Command::new(artifact);
        cmd.args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| DevloopError::Spawn {
            path: artifact.to_path_buf(),
            source,
        })?;

        let pid = child.id();
        info!(?pid, generation, artifact = ?artifact, "process started");

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                if let Err(err) = forward_output(stderr, tokio::io::stdout()).await {
                    debug!(generation, error = %err, "stderr forwarding stopped");
                }
            });
        }

        // 0 once the child is reaped; pid 0 is never a child.
        let live_pid = Arc::new(AtomicU32::new(pid.unwrap_or(0)));
        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();
        let loop_tx = self.loop_tx.clone();
        let reaped = Arc::clone(&live_pid);
        tokio::spawn(async move {
            // The signal is sent from here so it can only reach our own
            // child: `child.id()` is `None` after reaping. A dropped handle
            // disables the kill branch instead of firing it.
            let status = tokio::select! {
                status = child.wait() => status,
                Ok(()) = &mut kill_rx => {
                    if let Err(err) = signal_terminate(&mut child) {
                        warn!(generation, error = %err, "failed to signal process");
                    }
                    child.wait().await
                }
            };
            reaped.store(0, Ordering::SeqCst);

            let code = match status {
                Ok(status) => status.code(),
                Err(err) => {
                    warn!(generation, error = %err, "failed to wait for process");
                    None
                }
            };

            let _ = loop_tx
                .send(LoopEvent::ProcessExited { generation, code })
                .await;
        });

        Ok(Box::new(ChildHandle {
            pid: live_pid,
            generation,
            kill_tx: Some(kill_tx),
        }))
    }
}

#[cfg(unix)]
fn signal_terminate(child: &mut Child) -> std::io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(());
    };

    debug!(pid, "sending SIGTERM");
    match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(std::io::Error::from(errno)),
    }
}

#[cfg(not(unix))]
fn signal_terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}

/// Copy `reader` to `writer` chunk by chunk, flushing after each chunk.
///
/// Used to pass the supervised process's stderr through to our stdout
/// unchanged. Returns the number of bytes copied.
pub async fn forward_output<R, W>(mut reader: R, mut writer: W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
        writer.flush().await?;
        total += n as u64;
    }
    Ok(total)
}

/// Handle to a child spawned by [`ProcessLauncher`].
#[derive(Debug)]
pub struct ChildHandle {
    pid: Arc<AtomicU32>,
    generation: Generation,
    kill_tx: Option<oneshot::Sender<()>>,
}

impl ProcessHandle for ChildHandle {
    fn id(&self) -> Option<u32> {
        match self.pid.load(Ordering::SeqCst) {
            0 => None,
            pid => Some(pid),
        }
    }

    fn terminate(&mut self) -> Result<()> {
        let Some(tx) = self.kill_tx.take() else {
            return Ok(());
        };

        debug!(pid = ?self.id(), generation = self.generation, "requesting termination");
        if tx.send(()).is_err() {
            debug!(generation = self.generation, "process already reaped; not signalling");
        }
        Ok(())
    }
}
