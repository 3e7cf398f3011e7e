//! Terminal reporter: one table per project, then a summary line.
//!
//! ```text
//! :app
//!        dependency    name                 source    build file
//!     ✔  :lib1         unused-dependency              app/build.gradle.kts: (6, 5)
//!     X  :lib2         must-be-api                    app/build.gradle.kts: (7, 5)
//!
//! ModuleAudit found 2 issues
//! ```

use crate::analysis::{Finding, RunOutcome};
use crate::report::colors::{FixMarker, SeveritySymbol, StructureColors};
use crate::analysis::Severity;
use colored::Colorize;
use console::{pad_str, Alignment};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

const HEADERS: [&str; 4] = ["dependency", "name", "source", "build file"];

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// Stripped from build file paths for shorter display
    base_path: Option<PathBuf>,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { base_path: None }
    }

    pub fn with_base_path(mut self, base: PathBuf) -> Self {
        self.base_path = Some(base);
        self
    }

    pub fn report(&self, outcome: &RunOutcome) {
        print!("{}", self.render(outcome));
    }

    pub fn render(&self, outcome: &RunOutcome) -> String {
        let mut out = String::new();

        let mut by_project: BTreeMap<_, Vec<&Finding>> = BTreeMap::new();
        for finding in outcome.findings.iter().filter(|f| !f.is_report_only()) {
            by_project.entry(&finding.project).or_default().push(finding);
        }

        for (project, findings) in &by_project {
            let _ = writeln!(out, "{}", StructureColors::project(project.as_str()));
            let rows: Vec<[String; 4]> = findings.iter().map(|f| self.row(f)).collect();
            let widths = column_widths(&rows);

            let header: Vec<String> = HEADERS
                .iter()
                .zip(widths)
                .map(|(h, w)| pad_str(&StructureColors::header(h).to_string(), w, Alignment::Left, None).into_owned())
                .collect();
            let _ = writeln!(out, "       {}", header.join("    ").trim_end());

            for (finding, row) in findings.iter().zip(&rows) {
                let cells = [
                    StructureColors::dependency(&row[0]).to_string(),
                    StructureColors::rule_name(&row[1]).to_string(),
                    row[2].clone(),
                    StructureColors::location(&row[3]).to_string(),
                ];
                let padded: Vec<String> = cells
                    .iter()
                    .zip(widths)
                    .map(|(cell, w)| pad_str(cell, w, Alignment::Left, None).into_owned())
                    .collect();
                let _ = writeln!(
                    out,
                    "    {}  {}",
                    FixMarker::for_finding(finding.fixed),
                    padded.join("    ").trim_end()
                );
            }
            out.push('\n');
        }

        let issues = outcome.issue_count();
        let summary = format!("ModuleAudit found {}", pluralize("issue", issues));
        if issues == 0 {
            let _ = writeln!(out, "{}", summary.green().bold());
        } else {
            let fixed = outcome.fixed_count();
            let _ = write!(out, "{}", summary.yellow().bold());
            if fixed > 0 {
                let _ = write!(out, " ({} auto-corrected)", StructureColors::count(&fixed.to_string()));
            }
            out.push('\n');
        }

        if !outcome.warnings.is_empty() {
            let _ = writeln!(out, "\n{}", "Warnings:".yellow());
            for warning in &outcome.warnings {
                let _ = writeln!(out, "  {} {}", SeveritySymbol::colored(&Severity::Warning), warning);
            }
        }

        if !outcome.failures.is_empty() {
            let _ = writeln!(out, "\n{}", "Fix failures (files left unchanged):".red());
            for failure in &outcome.failures {
                let _ = writeln!(
                    out,
                    "  {} {}: {}",
                    SeveritySymbol::colored(&Severity::Error),
                    failure.project,
                    failure.error
                );
            }
        }

        out
    }

    fn row(&self, finding: &Finding) -> [String; 4] {
        let location = match finding.position {
            Some(position) => format!("{}: {}", self.display_path(&finding.build_file), position),
            None => self.display_path(&finding.build_file),
        };
        [
            finding.dependency_identifier.clone(),
            finding.name.id().to_string(),
            finding.source.clone().unwrap_or_default(),
            location,
        ]
    }

    fn display_path(&self, path: &Path) -> String {
        self.base_path
            .as_ref()
            .and_then(|base| path.strip_prefix(base).ok())
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn column_widths(rows: &[[String; 4]]) -> [usize; 4] {
    let mut widths = HEADERS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(console::measure_text_width(cell));
        }
    }
    widths
}

pub(crate) fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}
