// src/build/runner.rs

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::build::outcome::BuildOutcome;
use crate::config::BuildSection;

/// Trait abstracting how the project is built.
///
/// Production code uses [`BuildRunner`]; tests provide scripted outcomes.
/// Implementations are never called concurrently with themselves; the
/// engine serializes build cycles.
pub trait BuildStep: Send {
    /// Run one full build and classify it. Runs to completion; there is no
    /// cancellation and no timeout.
    fn build(&mut self) -> Pin<Box<dyn Future<Output = BuildOutcome> + Send + '_>>;
}

/// Runs the external build command in the project root.
#[derive(Debug, Clone)]
pub struct BuildRunner {
    root: PathBuf,
    cmd: String,
    args: Vec<String>,
}

impl BuildRunner {
    pub fn new(root: impl Into<PathBuf>, cmd: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            root: root.into(),
            cmd: cmd.into(),
            args,
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, section: &BuildSection) -> Self {
        Self::new(root, section.cmd.clone(), section.args.clone())
    }

    /// Human readable form of the command, e.g. `go build`.
    pub fn command_line(&self) -> String {
        std::iter::once(self.cmd.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn run(&self) -> BuildOutcome {
        let command_line = self.command_line();
        info!(cmd = %command_line, root = ?self.root, "building");
        let started = Instant::now();

        let output = Command::new(&self.cmd)
            .args(&self.args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(err) => {
                warn!(cmd = %command_line, error = %err, "failed to start build command");
                return BuildOutcome::spawn_failure(format!(
                    "failed to run `{command_line}`: {err}"
                ));
            }
        };

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!("build stdout: {}", line);
        }

        let outcome = BuildOutcome::from_stderr_bytes(&output.stderr);

        if outcome.is_success() && !output.status.success() {
            warn!(
                status = %output.status,
                "build exited unsuccessfully without writing to stderr; treating as success"
            );
        }

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            status = %output.status,
            success = outcome.is_success(),
            "build finished"
        );

        outcome
    }
}

impl BuildStep for BuildRunner {
    fn build(&mut self) -> Pin<Box<dyn Future<Output = BuildOutcome> + Send + '_>> {
        Box::pin(self.run())
    }
}
