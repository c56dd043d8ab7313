// src/exec/supervisor.rs

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::errors::{DevloopError, Result};
use crate::exec::process::{Generation, Launcher, ProcessHandle};

/// Lifecycle state of the supervised artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    NotRunning,
    Running,
}

/// The single running instance of the built artifact.
pub struct SupervisedProcess {
    generation: Generation,
    handle: Box<dyn ProcessHandle>,
}

impl SupervisedProcess {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn id(&self) -> Option<u32> {
        self.handle.id()
    }
}

impl std::fmt::Debug for SupervisedProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisedProcess")
            .field("generation", &self.generation)
            .field("pid", &self.handle.id())
            .finish()
    }
}

/// Owns at most one running instance of the artifact.
///
/// All mutations go through `&mut self`, and the engine holds the only
/// supervisor, so no locking is involved.
pub struct Supervisor<L: Launcher> {
    launcher: L,
    artifact: PathBuf,
    args: Vec<String>,
    current: Option<SupervisedProcess>,
    launches: Generation,
}

impl<L: Launcher> Supervisor<L> {
    pub fn new(launcher: L, artifact: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            launcher,
            artifact: artifact.into(),
            args,
            current: None,
            launches: 0,
        }
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn state(&self) -> SupervisorState {
        if self.current.is_some() {
            SupervisorState::Running
        } else {
            SupervisorState::NotRunning
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&SupervisedProcess> {
        self.current.as_ref()
    }

    /// Stop the current instance (if any) and launch a fresh one.
    ///
    /// The old instance is asked to terminate and forgotten without waiting
    /// for it to exit, so for a short while both may be alive. A spawn failure is
    /// logged and leaves the supervisor `NotRunning`.
    ///
    /// TODO: wait for the old instance to exit (bounded by a timeout) before
    /// spawning, so services holding a port do not race their replacement.
    pub fn restart(&mut self) -> Option<&SupervisedProcess> {
        self.terminate();

        self.launches += 1;
        let generation = self.launches;

        match self.launcher.launch(&self.artifact, &self.args, generation) {
            Ok(handle) => {
                info!(generation, pid = ?handle.id(), "artifact launched");
                self.current = Some(SupervisedProcess { generation, handle });
            }
            Err(err) => {
                error!(generation, artifact = ?self.artifact, error = %err, "failed to launch artifact");
            }
        }

        self.current.as_ref()
    }

    /// Send the terminate signal to the current instance, if any, and mark
    /// the supervisor `NotRunning` right away.
    pub fn terminate(&mut self) {
        let Some(mut process) = self.current.take() else {
            return;
        };

        info!(generation = process.generation, pid = ?process.id(), "terminating process");
        if let Err(err) = process.handle.terminate() {
            warn!(generation = process.generation, error = %err, "failed to signal process");
        }
    }

    /// Record that the process launched as `generation` exited on its own.
    ///
    /// Returns `true` if that was the current instance. Exits of instances
    /// already replaced by [`restart`](Self::restart) are ignored.
    pub fn handle_exit(&mut self, generation: Generation, code: Option<i32>) -> bool {
        match &self.current {
            Some(process) if process.generation == generation => {
                warn!(generation, ?code, "process exited; waiting for the next change to relaunch");
                self.current = None;
                true
            }
            _ => {
                info!(generation, ?code, "previous process exited");
                false
            }
        }
    }
}

impl<L: Launcher> std::fmt::Debug for Supervisor<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("artifact", &self.artifact)
            .field("current", &self.current)
            .field("launches", &self.launches)
            .finish_non_exhaustive()
    }
}

/// Path of the artifact built in `root`.
///
/// With no override, the artifact is named after the root directory itself
/// (`/src/weather` builds `/src/weather/weather`), with `.exe` appended on
/// Windows. An override is used as-is when absolute and resolved against
/// `root` otherwise.
pub fn artifact_path(root: &Path, override_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(root.join(path));
    }

    let name = root.file_name().ok_or_else(|| {
        DevloopError::Config(format!(
            "cannot derive an artifact name from project root {:?}",
            root
        ))
    })?;

    let mut file_name = name.to_os_string();
    if cfg!(windows) {
        file_name.push(".exe");
    }

    Ok(root.join(file_name))
}
