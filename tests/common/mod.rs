#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt};

use devloop::build::{BuildOutcome, BuildStep};
use devloop::errors::{DevloopError, Result};
use devloop::exec::{Generation, Launcher, ProcessHandle};
use devloop::report::Notifier;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Hook run at the start of each fake build, given the 1-based call number.
pub type BuildHook = Box<dyn FnMut(usize) + Send>;

/// A fake build step that:
/// - replays scripted outcomes (then `Success` once the script runs out)
/// - counts invocations
/// - optionally runs a hook, e.g. to inject events "during" the build.
pub struct FakeBuilder {
    script: VecDeque<BuildOutcome>,
    calls: Arc<Mutex<usize>>,
    hook: Option<BuildHook>,
}

impl FakeBuilder {
    pub fn new(script: Vec<BuildOutcome>) -> Self {
        Self {
            script: script.into(),
            calls: Arc::new(Mutex::new(0)),
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: BuildHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn calls(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.calls)
    }
}

impl BuildStep for FakeBuilder {
    fn build(&mut self) -> Pin<Box<dyn Future<Output = BuildOutcome> + Send + '_>> {
        let call = {
            let mut guard = self.calls.lock().unwrap();
            *guard += 1;
            *guard
        };
        if let Some(hook) = self.hook.as_mut() {
            hook(call);
        }
        let outcome = self.script.pop_front().unwrap_or(BuildOutcome::Success);
        Box::pin(async move { outcome })
    }
}

pub fn failure(lines: &[&str]) -> BuildOutcome {
    BuildOutcome::Failure {
        diagnostic_lines: lines.iter().map(|s| s.to_string()).collect(),
    }
}

/// Everything the fake launcher observed.
#[derive(Debug, Default)]
pub struct LaunchLog {
    /// Generations that were launched successfully.
    pub launched: Vec<Generation>,
    /// Generations that received a terminate signal, in order.
    pub terminated: Vec<Generation>,
    /// Artifact paths passed to `launch`.
    pub artifacts: Vec<PathBuf>,
}

impl LaunchLog {
    /// Generations launched and never signalled.
    pub fn alive(&self) -> Vec<Generation> {
        self.launched
            .iter()
            .copied()
            .filter(|g| !self.terminated.contains(g))
            .collect()
    }
}

/// A fake launcher that records launches and terminations instead of
/// spawning processes. Clearing `artifact_present` makes launches fail the
/// way a missing binary does.
#[derive(Clone)]
pub struct FakeLauncher {
    pub log: Arc<Mutex<LaunchLog>>,
    pub artifact_present: Arc<AtomicBool>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(LaunchLog::default())),
            artifact_present: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_artifact_present(&self, present: bool) {
        self.artifact_present.store(present, Ordering::SeqCst);
    }
}

impl Launcher for FakeLauncher {
    fn launch(
        &mut self,
        artifact: &Path,
        _args: &[String],
        generation: Generation,
    ) -> Result<Box<dyn ProcessHandle>> {
        if !self.artifact_present.load(Ordering::SeqCst) {
            return Err(DevloopError::Spawn {
                path: artifact.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }

        let mut log = self.log.lock().unwrap();
        log.launched.push(generation);
        log.artifacts.push(artifact.to_path_buf());

        Ok(Box::new(FakeHandle {
            generation,
            log: Arc::clone(&self.log),
        }))
    }
}

pub struct FakeHandle {
    generation: Generation,
    log: Arc<Mutex<LaunchLog>>,
}

impl ProcessHandle for FakeHandle {
    fn id(&self) -> Option<u32> {
        Some(10_000 + self.generation as u32)
    }

    fn terminate(&mut self) -> Result<()> {
        self.log.lock().unwrap().terminated.push(self.generation);
        Ok(())
    }
}

/// Records every notification; optionally fails after recording.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        if self.fail {
            anyhow::bail!("notification daemon unavailable");
        }
        Ok(())
    }
}

/// In-memory log sink for asserting on formatted tracing output.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Run `f` with a plain-text subscriber writing into this buffer.
    pub fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
