// src/build/mod.rs

//! Build step: run the external compiler and classify the result.
//!
//! - [`outcome`] holds the pure stderr-based classification.
//! - [`runner`] invokes the configured command via `tokio::process`.

pub mod outcome;
pub mod runner;

pub use outcome::BuildOutcome;
pub use runner::{BuildRunner, BuildStep};
