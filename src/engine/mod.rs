// src/engine/mod.rs

//! Orchestration engine for devloop.
//!
//! This module ties together:
//! - the trigger gate (what happens when changes arrive mid-cycle)
//! - the main runtime event loop that reacts to:
//!   - file-watch triggers
//!   - supervised process exits
//!   - shutdown signals

pub mod gate;
pub mod runtime;

pub use gate::TriggerGate;
pub use runtime::{LoopEvent, Runtime, RuntimeOptions};
