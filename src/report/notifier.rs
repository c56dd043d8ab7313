// src/report/notifier.rs

//! Desktop notification sinks.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;

/// A sink accepting a title/body pair.
///
/// Delivery is best-effort; callers are expected to log and discard errors.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Sends notifications through the platform's command line helper:
/// `osascript` on macOS, `notify-send` on other Unix systems.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<()> {
        let mut cmd = desktop_command(title, body)?;

        // The child is not awaited; tokio reaps it in the background.
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("spawning desktop notification helper")?;

        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn desktop_command(title: &str, body: &str) -> Result<Command> {
    let script = format!(
        "display notification \"{}\" with title \"{}\"",
        applescript_escape(body),
        applescript_escape(title)
    );
    let mut cmd = Command::new("osascript");
    cmd.arg("-e").arg(script);
    Ok(cmd)
}

#[cfg(all(unix, not(target_os = "macos")))]
fn desktop_command(title: &str, body: &str) -> Result<Command> {
    let mut cmd = Command::new("notify-send");
    cmd.arg(title).arg(body);
    Ok(cmd)
}

#[cfg(not(unix))]
fn desktop_command(_title: &str, _body: &str) -> Result<Command> {
    anyhow::bail!("desktop notifications are not supported on this platform")
}

#[cfg(target_os = "macos")]
fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Discards every notification. Used when `[notify].enabled = false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _body: &str) -> Result<()> {
        Ok(())
    }
}
