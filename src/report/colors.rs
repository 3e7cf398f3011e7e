//! Centralized color scheme for consistent output formatting

use crate::analysis::Severity;
use colored::{ColoredString, Colorize};

/// Fixed / unfixed markers in the finding table
pub struct FixMarker;

impl FixMarker {
    pub fn fixed() -> ColoredString {
        "✔".green().bold()
    }

    pub fn unfixed() -> ColoredString {
        "X".red().bold()
    }

    pub fn for_finding(fixed: bool) -> ColoredString {
        if fixed {
            Self::fixed()
        } else {
            Self::unfixed()
        }
    }
}

/// Structural element colors
pub struct StructureColors;

impl StructureColors {
    /// Project path header
    pub fn project(text: &str) -> ColoredString {
        text.cyan().bold()
    }

    /// Build file position
    pub fn location(text: &str) -> ColoredString {
        text.dimmed()
    }

    /// Finding name (e.g. unused-dependency)
    pub fn rule_name(text: &str) -> ColoredString {
        text.magenta()
    }

    /// Dependency identifier
    pub fn dependency(text: &str) -> ColoredString {
        text.white().bold()
    }

    /// Table column headers
    pub fn header(text: &str) -> ColoredString {
        text.dimmed().underline()
    }

    /// Count/statistics numbers
    pub fn count(text: &str) -> ColoredString {
        text.white().bold()
    }
}

/// Severity symbols for warnings and failures
pub struct SeveritySymbol;

impl SeveritySymbol {
    pub fn error() -> &'static str {
        "✖"
    }

    pub fn warning() -> &'static str {
        "⚠"
    }

    pub fn info() -> &'static str {
        "ℹ"
    }

    pub fn colored(severity: &Severity) -> ColoredString {
        match severity {
            Severity::Error => Self::error().red().bold(),
            Severity::Warning => Self::warning().yellow(),
            Severity::Info => Self::info().blue(),
        }
    }
}
