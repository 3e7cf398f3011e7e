mod colors;
mod depth;
mod json;
mod terminal;

pub use depth::{render as render_depths, DepthReporter};
pub use json::{render as render_json, JsonReporter};
pub use terminal::TerminalReporter;

use crate::analysis::RunOutcome;
use crate::error::Result;
use std::path::PathBuf;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Per-project finding tables
    #[default]
    Terminal,
    /// JSON machine-readable format
    Json,
}

/// Options for report generation
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Output file path (for JSON)
    pub output_path: Option<PathBuf>,
    /// Base path to strip from build file paths for shorter display
    pub base_path: Option<PathBuf>,
    /// Print the depth report after the findings
    pub show_depths: bool,
    /// Also write the depth report here
    pub depths_path: Option<PathBuf>,
}

/// Reporter for outputting analysis results
pub struct Reporter {
    format: ReportFormat,
    options: ReportOptions,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            options: ReportOptions {
                output_path,
                ..Default::default()
            },
        }
    }

    pub fn with_options(format: ReportFormat, options: ReportOptions) -> Self {
        Self { format, options }
    }

    pub fn report(&self, outcome: &RunOutcome) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => {
                let mut reporter = TerminalReporter::new();
                if let Some(base) = &self.options.base_path {
                    reporter = reporter.with_base_path(base.clone());
                }
                reporter.report(outcome);
                if self.options.show_depths && !outcome.depths.is_empty() {
                    println!();
                    DepthReporter::new(self.options.depths_path.clone()).report(&outcome.depths)?;
                }
            }
            ReportFormat::Json => {
                JsonReporter::new(self.options.output_path.clone()).report(outcome)?;
                if !outcome.depths.is_empty() {
                    DepthReporter::new(self.options.depths_path.clone()).write(&outcome.depths)?;
                }
            }
        }
        Ok(())
    }
}
