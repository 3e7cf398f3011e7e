//! JSON reporter
//!
//! Pretty-printed findings, depths and fix failures for machine
//! consumption. Findings use the camelCase shape downstream renderers
//! expect.

use crate::analysis::{Finding, ProjectDepth, RunOutcome, Severity};
use crate::error::{Error, Result};
use crate::parser::Position;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFinding<'a> {
    project: &'a str,
    rule_name: &'static str,
    severity: Severity,
    fixed: bool,
    configuration: Option<&'a str>,
    dependency_identifier: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_evidence: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
    build_file_path: &'a Path,
    message: &'a str,
}

impl<'a> From<&'a Finding> for JsonFinding<'a> {
    fn from(finding: &'a Finding) -> Self {
        Self {
            project: finding.project.as_str(),
            rule_name: finding.name.id(),
            severity: finding.severity,
            fixed: finding.fixed,
            configuration: finding.configuration.as_ref().map(|c| c.as_str()),
            dependency_identifier: &finding.dependency_identifier,
            source_evidence: finding.source.as_deref(),
            position: finding.position,
            build_file_path: &finding.build_file,
            message: &finding.message,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFailure {
    project: String,
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    version: &'static str,
    issue_count: usize,
    fixed_count: usize,
    findings: Vec<JsonFinding<'a>>,
    depths: &'a [ProjectDepth],
    failures: Vec<JsonFailure>,
    warnings: Vec<String>,
}

pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    /// Writes to the output path when set, stdout otherwise.
    pub fn report(&self, outcome: &RunOutcome) -> Result<()> {
        let json = render(outcome)?;
        match &self.output_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
                }
                std::fs::write(path, json).map_err(|e| Error::io(path, e))?;
                info!("JSON report written to {}", path.display());
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}

pub fn render(outcome: &RunOutcome) -> Result<String> {
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION"),
        issue_count: outcome.issue_count(),
        fixed_count: outcome.fixed_count(),
        findings: outcome.findings.iter().map(JsonFinding::from).collect(),
        depths: &outcome.depths,
        failures: outcome
            .failures
            .iter()
            .map(|f| JsonFailure {
                project: f.project.to_string(),
                error: f.error.to_string(),
            })
            .collect(),
        warnings: outcome.warnings.iter().map(ToString::to_string).collect(),
    };
    serde_json::to_string_pretty(&report).map_err(|e| Error::Config(format!("failed to serialize report: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FindingName;
    use crate::graph::{ConfiguredDependency, DependencyTarget, PlatformKind, Project};

    fn outcome() -> RunOutcome {
        let app = Project::new(":app", PlatformKind::Jvm, "app/build.gradle.kts");
        let lib1 = ConfiguredDependency::new("implementation", DependencyTarget::project(":lib1"));
        let finding = Finding::for_dependency(FindingName::InheritedDependency, &app, &lib1)
            .with_source(":lib2")
            .with_position(Some(Position { line: 3, column: 5 }));
        RunOutcome {
            findings: vec![finding],
            ..Default::default()
        }
    }

    #[test]
    fn test_json_render_valid() {
        let json = render(&outcome()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["issueCount"], 1);

        let finding = &parsed["findings"][0];
        assert_eq!(finding["ruleName"], "inherited-dependency");
        assert_eq!(finding["configuration"], "implementation");
        assert_eq!(finding["dependencyIdentifier"], ":lib1");
        assert_eq!(finding["sourceEvidence"], ":lib2");
        assert_eq!(finding["position"]["line"], 3);
        assert_eq!(finding["buildFilePath"], "app/build.gradle.kts");
        assert_eq!(finding["fixed"], false);
    }

    #[test]
    fn test_json_empty_outcome() {
        let json = render(&RunOutcome::default()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["findings"].as_array().unwrap().len(), 0);
        assert!(parsed.get("failures").is_some());
    }

    #[test]
    fn test_json_written_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reports/moduleaudit.json");
        JsonReporter::new(Some(path.clone())).report(&outcome()).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("\"ruleName\": \"inherited-dependency\""));
    }
}
