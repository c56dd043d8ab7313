// src/build/outcome.rs

/// Result of one build invocation.
///
/// Classification looks only at the build's standard error: any output there
/// means `Failure`, regardless of the exit status. This keeps behaviour
/// identical to the classic `go build` wrappers, but it is over-broad: a
/// toolchain that prints warnings to stderr is reported as a failed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failure {
        /// Non-empty stderr lines, in the order they were printed.
        diagnostic_lines: Vec<String>,
    },
}

impl BuildOutcome {
    /// Classify a build from its captured stderr text.
    pub fn from_stderr(stderr: &str) -> Self {
        if stderr.is_empty() {
            return BuildOutcome::Success;
        }

        let diagnostic_lines = stderr
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        BuildOutcome::Failure { diagnostic_lines }
    }

    /// Same as [`from_stderr`](Self::from_stderr) for raw captured bytes.
    pub fn from_stderr_bytes(stderr: &[u8]) -> Self {
        Self::from_stderr(&String::from_utf8_lossy(stderr))
    }

    /// Outcome for a build command that could not be started at all.
    pub fn spawn_failure(message: impl Into<String>) -> Self {
        BuildOutcome::Failure {
            diagnostic_lines: vec![message.into()],
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }

    /// Diagnostic lines of a failed build; empty for `Success`.
    pub fn diagnostic_lines(&self) -> &[String] {
        match self {
            BuildOutcome::Success => &[],
            BuildOutcome::Failure { diagnostic_lines } => diagnostic_lines,
        }
    }
}
