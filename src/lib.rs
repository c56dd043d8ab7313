// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod watch;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::build::BuildRunner;
use crate::cli::CliArgs;
use crate::config::{ConfigFile, default_config_path, load_or_default};
use crate::engine::{LoopEvent, Runtime, RuntimeOptions};
use crate::exec::{ProcessLauncher, Supervisor, artifact_path};
use crate::report::{DesktopNotifier, DiagnosticReporter, Notifier, NullNotifier};
use crate::watch::{WatchProfile, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - build runner / supervisor / reporter
/// - the file watcher
/// - Ctrl-C handling
/// - the runtime loop
pub async fn run(args: CliArgs) -> Result<()> {
    let root = project_root(args.root.as_deref())?;
    let explicit_config = args.config.is_some();
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&root));
    let cfg = load_or_default(&config_path, explicit_config)?;

    let artifact = artifact_path(&root, cfg.run.artifact.as_deref())?;
    let builder = BuildRunner::from_config(&root, &cfg.build);

    if args.dry_run {
        print_dry_run(&root, &artifact, &builder, &cfg);
        return Ok(());
    }

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<LoopEvent>(64);

    let profile = WatchProfile::new(&cfg.watch.patterns, &cfg.watch.exclude)?;
    let _watcher_handle = spawn_watcher(
        root.clone(),
        profile,
        Duration::from_millis(cfg.watch.debounce_ms),
        rt_tx.clone(),
    )
    .with_context(|| format!("watching {:?}", root))?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(LoopEvent::ShutdownRequested).await;
        });
    }

    let launcher = ProcessLauncher::new(root.clone(), rt_tx.clone());
    let supervisor = Supervisor::new(launcher, artifact, cfg.run.args.clone());

    let notifier: Box<dyn Notifier> = if cfg.notify.enabled {
        Box::new(DesktopNotifier)
    } else {
        Box::new(NullNotifier)
    };
    let reporter = DiagnosticReporter::new(notifier, cfg.notify.title.clone());

    let options = RuntimeOptions {
        launch_on_startup_failure: cfg.run.launch_on_startup_failure,
    };

    info!(root = ?root, "starting devloop");
    let runtime = Runtime::new(builder, supervisor, reporter, options, rt_rx);
    runtime.run().await
}

/// Resolve the project root: `--root` if given, else the current directory.
///
/// The result is canonicalized so the artifact name comes from a real
/// directory name even when the root is given as `.`.
pub fn project_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let root = match explicit {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("reading current directory")?,
    };

    root.canonicalize()
        .with_context(|| format!("resolving project root {:?}", root))
}

/// Simple dry-run output: print the resolved loop settings.
fn print_dry_run(root: &Path, artifact: &Path, builder: &BuildRunner, cfg: &ConfigFile) {
    println!("devloop dry-run");
    println!("  root: {}", root.display());
    println!("  build: {}", builder.command_line());
    println!("  watch: {:?}", cfg.watch.patterns);
    if !cfg.watch.exclude.is_empty() {
        println!("  exclude: {:?}", cfg.watch.exclude);
    }
    println!("  debounce_ms: {}", cfg.watch.debounce_ms);
    println!("  artifact: {}", artifact.display());
    if !cfg.run.args.is_empty() {
        println!("  args: {:?}", cfg.run.args);
    }
    println!(
        "  launch_on_startup_failure: {}",
        cfg.run.launch_on_startup_failure
    );
    println!("  notify: {}", cfg.notify.enabled);

    debug!("dry-run complete (no execution)");
}
