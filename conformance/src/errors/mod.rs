use std::io;
use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use crate::stage::{Stage, StageExit};

/// Errors that stop a suite before any case is evaluated
#[derive(Error, Debug, Diagnostic)]
pub enum SetupError {
    #[error("Failed to create scratch directory {}", .path.display())]
    #[diagnostic(
        code(setup::scratch_dir),
        help("pass --scratch or set C2P_SCRATCH to a writable directory")
    )]
    ScratchDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to list test inputs under {}", .path.display())]
    #[diagnostic(code(setup::discovery))]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Expected output for '{case}' is missing: {}", .path.display())]
    #[diagnostic(
        code(setup::missing_expected),
        help("every test input needs a sibling fixture holding its expected output")
    )]
    MissingExpected { case: String, path: PathBuf },

    #[error("Expected output for '{case}' cannot be read: {}", .path.display())]
    #[diagnostic(code(setup::unreadable_expected))]
    UnreadableExpected {
        case: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid value '{value}' for {name}")]
    #[diagnostic(code(setup::invalid_config))]
    InvalidConfig { name: &'static str, value: String },
}

/// Errors raised while starting or waiting on an external stage
#[derive(Error, Debug, Diagnostic)]
pub enum StageError {
    #[error("Failed to start {}", .program.display())]
    #[diagnostic(
        code(stage::spawn),
        help("check the --compiler / --vm paths and that the file is executable")
    )]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open {} for redirection", .path.display())]
    #[diagnostic(code(stage::redirect))]
    Redirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed while waiting on {}", .program.display())]
    #[diagnostic(code(stage::wait))]
    Wait {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a single case did not pass
#[derive(Error, Debug)]
pub enum CaseFailure {
    #[error("{stage} could not be run: {source}")]
    Invocation {
        stage: Stage,
        #[source]
        source: StageError,
    },

    #[error("{stage} timed out after {}s", .after.as_secs_f64())]
    TimedOut { stage: Stage, after: Duration },

    #[error("{stage} {exit}")]
    Exited {
        stage: Stage,
        exit: StageExit,
        stderr: String,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output mismatch (actual {}, expected {})", .actual.display(), .expected.display())]
    Mismatch { actual: PathBuf, expected: PathBuf },
}

impl CaseFailure {
    /// Captured stderr of the stage that failed, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            CaseFailure::Exited { stderr, .. } if !stderr.is_empty() => Some(stderr.as_str()),
            _ => None,
        }
    }
}
