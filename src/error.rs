//! Error taxonomy shared by the library and the binary.
//!
//! Only a few of these ever abort a run. Graph inconsistencies and oracle
//! failures are logged and degrade the affected rule, fix failures abort a
//! single file's pass, and everything else surfaces at load time.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("{dependent} declares `{configuration}` on unknown project {target}")]
    #[diagnostic(
        code(moduleaudit::graph_inconsistency),
        help("the edge is skipped during traversal; check the project path in the build file")
    )]
    GraphInconsistency {
        dependent: String,
        configuration: String,
        target: String,
    },

    #[error("source set hierarchy of {project} is invalid at `{source_set}`: {reason}")]
    #[diagnostic(code(moduleaudit::source_set_hierarchy))]
    SourceSetCycle {
        project: String,
        source_set: String,
        reason: String,
    },

    #[error("reference data unavailable for {project} ({source_set}): {reason}")]
    #[diagnostic(
        code(moduleaudit::oracle_unavailable),
        severity(Warning),
        help("affected dependencies are treated as used")
    )]
    OracleUnavailable {
        project: String,
        source_set: String,
        reason: String,
    },

    #[error("could not locate `{expected}` in {}", path.display())]
    #[diagnostic(
        code(moduleaudit::fix_span_mismatch),
        help("the build file changed since it was analyzed; no edits were written")
    )]
    FixSpanMismatch { path: PathBuf, expected: String },

    #[error("conflicting edits at offset {offset} in {}", path.display())]
    #[diagnostic(code(moduleaudit::overlapping_edits))]
    OverlappingEdits { path: PathBuf, offset: usize },

    #[error("failed to access {}", path.display())]
    #[diagnostic(code(moduleaudit::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(moduleaudit::config))]
    Config(String),

    #[error("invalid workspace snapshot {}: {message}", path.display())]
    #[diagnostic(code(moduleaudit::snapshot))]
    Snapshot { path: PathBuf, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Errors that only affect one file's fix pass.
    pub fn is_fix_failure(&self) -> bool {
        matches!(
            self,
            Error::FixSpanMismatch { .. } | Error::OverlappingEdits { .. } | Error::Io { .. }
        )
    }
}
