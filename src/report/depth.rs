//! Depth report
//!
//! ```text
//! -- ModuleAudit main source set depth results --
//! depth  modules
//! 0      [:lib1, :lib2]
//! 1      [:app]
//!
//! :app
//!     source set  depth  most expensive dependencies
//!     main        1      [:lib1, :lib2]
//! ```

use crate::analysis::{DepthCalculator, ProjectDepth};
use crate::error::{Error, Result};
use crate::graph::ProjectPath;
use colored::Colorize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;
use tracing::info;

pub struct DepthReporter {
    output_path: Option<PathBuf>,
}

impl DepthReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    /// Prints the report, and also writes it when an output path is set.
    pub fn report(&self, depths: &[ProjectDepth]) -> Result<()> {
        println!("{}", render(depths).cyan());
        self.write(depths)
    }

    /// Writes the report to the output path, if any.
    pub fn write(&self, depths: &[ProjectDepth]) -> Result<()> {
        let Some(path) = &self.output_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(path, render(depths)).map_err(|e| Error::io(path, e))?;
        info!("Depth report written to {}", path.display());
        Ok(())
    }
}

pub fn render(depths: &[ProjectDepth]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "-- ModuleAudit main source set depth results --");
    let _ = writeln!(out, "depth  modules");
    for (depth, modules) in DepthCalculator::modules_by_depth(depths) {
        let _ = writeln!(out, "{:<7}{}", depth, bracketed(&modules));
    }

    let mut by_project: BTreeMap<&ProjectPath, Vec<&ProjectDepth>> = BTreeMap::new();
    for depth in depths {
        by_project.entry(&depth.project).or_default().push(depth);
    }
    for (project, depths) in by_project {
        let width = depths
            .iter()
            .map(|d| d.source_set.as_str().len())
            .max()
            .unwrap_or(0)
            .max("source set".len());
        let _ = writeln!(out, "\n{project}");
        let _ = writeln!(out, "    {:<width$}  depth  most expensive dependencies", "source set");
        for depth in depths {
            let _ = writeln!(
                out,
                "    {:<width$}  {:<5}  {}",
                depth.source_set.as_str(),
                depth.depth,
                bracketed(&depth.most_expensive)
            );
        }
    }
    out
}

fn bracketed(paths: &[ProjectPath]) -> String {
    let joined: Vec<&str> = paths.iter().map(ProjectPath::as_str).collect();
    format!("[{}]", joined.join(", "))
}
