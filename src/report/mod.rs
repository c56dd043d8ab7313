// src/report/mod.rs

//! Surfacing build failures to the console and the desktop.

pub mod notifier;

pub use notifier::{DesktopNotifier, Notifier, NullNotifier};

use tracing::{debug, error};

/// Prefix put in front of every diagnostic line on the console.
pub const BUILD_TAG: &str = "Error (build):";

/// Formats build diagnostics and sends one aggregated notification.
pub struct DiagnosticReporter {
    notifier: Box<dyn Notifier>,
    title: String,
}

impl std::fmt::Debug for DiagnosticReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticReporter")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl DiagnosticReporter {
    pub fn new(notifier: Box<dyn Notifier>, title: impl Into<String>) -> Self {
        Self {
            notifier,
            title: title.into(),
        }
    }

    /// Log each diagnostic line at ERROR and send exactly one notification
    /// whose body is all lines joined by newlines.
    ///
    /// A failing notification sink is logged at debug level and otherwise
    /// ignored.
    pub fn report(&self, diagnostic_lines: &[String]) {
        error!("build produced errors");
        for line in diagnostic_lines {
            error!("{BUILD_TAG} {line}");
        }

        let body = diagnostic_lines.join("\n");
        if let Err(err) = self.notifier.notify(&self.title, &body) {
            debug!(error = %err, "desktop notification failed; ignoring");
        }
    }
}
