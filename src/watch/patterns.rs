// src/watch/patterns.rs

use std::fmt;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::{DevloopError, Result};

/// Compiled watch/exclude glob patterns for the project.
///
/// The patterns are relative to the project root. The watcher passes
/// relative, forward-slash paths (e.g. `"pkg/util/util.go"`) into `matches`.
#[derive(Clone)]
pub struct WatchProfile {
    patterns: Vec<String>,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchProfile")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl WatchProfile {
    /// Compile the given watch and exclude lists.
    pub fn new(watch: &[String], exclude: &[String]) -> Result<Self> {
        let watch_set = build_globset(watch)?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude)?)
        };

        Ok(Self {
            patterns: watch.to_vec(),
            watch_set,
            exclude_set,
        })
    }

    /// The raw watch patterns this profile was built from.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if a change to `rel_path` should trigger a rebuild.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Build a GlobSet from simple string patterns.
///
/// `*` never matches a path separator, so `*.go` and `**/*.go` keep their
/// shell meaning.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .map_err(|source| DevloopError::Pattern {
                pattern: pat.clone(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| DevloopError::Pattern {
        pattern: patterns.join(", "),
        source,
    })
}
