// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from `Devloop.toml`.
///
/// Every section is optional; an absent file behaves exactly like an empty
/// one:
///
/// ```toml
/// [build]
/// cmd = "go"
/// args = ["build"]
///
/// [watch]
/// patterns = ["*.go", "**/*.go"]
/// exclude = ["vendor/**"]
/// debounce_ms = 100
///
/// [run]
/// args = ["--port", "8000"]
/// launch_on_startup_failure = true
///
/// [notify]
/// enabled = true
/// title = "Error (build)"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub notify: NotifySection,
}

/// `[build]` section: the external build command.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Program to invoke, looked up on `PATH`.
    #[serde(default = "default_build_cmd")]
    pub cmd: String,

    #[serde(default = "default_build_args")]
    pub args: Vec<String>,
}

fn default_build_cmd() -> String {
    "go".to_string()
}

fn default_build_args() -> Vec<String> {
    vec!["build".to_string()]
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            cmd: default_build_cmd(),
            args: default_build_args(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Glob patterns relative to the project root. `*` does not cross `/`,
    /// so `*.go` only matches files at the root and `**/*.go` matches below it.
    #[serde(default = "default_watch_patterns")]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// Quiet period after the last matching filesystem event before a
    /// single trigger is emitted for the whole burst.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_watch_patterns() -> Vec<String> {
    vec!["*.go".to_string(), "**/*.go".to_string()]
}

fn default_debounce_ms() -> u64 {
    100
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            patterns: default_watch_patterns(),
            exclude: Vec::new(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[run]` section: how the built artifact is launched.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Explicit artifact path. When `None`, the artifact is named after the
    /// project root directory.
    #[serde(default)]
    pub artifact: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Whether the startup cycle launches the artifact even if the initial
    /// build failed (whatever binary is on disk from an earlier build).
    #[serde(default = "default_launch_on_startup_failure")]
    pub launch_on_startup_failure: bool,
}

fn default_launch_on_startup_failure() -> bool {
    true
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            artifact: None,
            args: Vec::new(),
            launch_on_startup_failure: default_launch_on_startup_failure(),
        }
    }
}

/// `[notify]` section: desktop notifications on build failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotifySection {
    #[serde(default = "default_notify_enabled")]
    pub enabled: bool,

    #[serde(default = "default_notify_title")]
    pub title: String,
}

fn default_notify_enabled() -> bool {
    true
}

fn default_notify_title() -> String {
    "Error (build)".to_string()
}

impl Default for NotifySection {
    fn default() -> Self {
        Self {
            enabled: default_notify_enabled(),
            title: default_notify_title(),
        }
    }
}
