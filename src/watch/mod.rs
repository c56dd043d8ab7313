// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the `watch` / `exclude` glob patterns.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Collapsing bursts of raw events into a single `ChangeDetected` trigger.
//!
//! It does **not** decide what happens on a change; serialization of the
//! resulting build/restart cycles is the engine's job.

pub mod patterns;
pub mod watcher;

pub use patterns::{WatchProfile, build_globset};
pub use watcher::{WatcherHandle, is_change, relative_str, spawn_watcher};
