// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{AccessKind, AccessMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, trace, warn};

use crate::engine::LoopEvent;
use crate::errors::Result;
use crate::watch::patterns::WatchProfile;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and sends one
/// `LoopEvent::ChangeDetected` per burst of matching changes.
///
/// A burst ends once no matching event has been seen for `debounce`. Any
/// subscription failure (unreadable root, OS watch limits) is returned to
/// the caller; without a watcher the loop cannot do its job.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profile: WatchProfile,
    debounce: Duration,
    loop_tx: mpsc::Sender<LoopEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("devloop: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("devloop: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!(root = ?root, patterns = ?profile.patterns(), "file watcher started");

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let Some(first) = first_match(&root, &profile, &event) else {
                continue;
            };
            debug!(path = %first, "change detected; waiting for quiet period");

            let mut deadline = Instant::now() + debounce;
            let mut absorbed = 0usize;
            loop {
                match timeout_at(deadline, event_rx.recv()).await {
                    Ok(Some(event)) => {
                        if let Some(path) = first_match(&root, &profile, &event) {
                            trace!(path = %path, "coalescing change into current burst");
                            absorbed += 1;
                            deadline = Instant::now() + debounce;
                        }
                    }
                    Ok(None) | Err(_) => break,
                }
            }

            debug!(absorbed, "burst settled; sending trigger");
            if let Err(err) = loop_tx.send(LoopEvent::ChangeDetected).await {
                warn!("failed to send LoopEvent::ChangeDetected: {err}");
                // The loop is gone; nothing left to notify.
                return;
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Return the first path of `event` that the profile cares about, relative
/// to `root`.
fn first_match(root: &Path, profile: &WatchProfile, event: &Event) -> Option<String> {
    if !is_change(&event.kind) {
        return None;
    }

    event.paths.iter().find_map(|path| match relative_str(root, path) {
        Some(rel) if profile.matches(&rel) => Some(rel),
        Some(_) => None,
        None => {
            warn!("could not relativize path {:?} against root {:?}", path, root);
            None
        }
    })
}

/// Whether an event kind represents a content change.
///
/// Plain reads are reported as access events by some backends, and the
/// build itself reads every source file.
pub fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(_)
            | EventKind::Remove(_)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if the path is not under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}
