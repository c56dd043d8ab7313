// src/exec/mod.rs

//! Process supervision layer.
//!
//! - [`supervisor`] owns the single running instance of the artifact and
//!   implements kill-then-relaunch.
//! - [`process`] spawns real children with `tokio::process`, forwards their
//!   stderr and reports exits back to the engine.

pub mod process;
pub mod supervisor;

pub use process::{
    ChildHandle, Generation, Launcher, ProcessHandle, ProcessLauncher, forward_output,
};
pub use supervisor::{SupervisedProcess, Supervisor, SupervisorState, artifact_path};
