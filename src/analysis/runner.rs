//! Phased analysis run.
//!
//! ## Phases
//!
//! 1. Declarations: must-be-api, unused, overshot, redundant,
//!    unused-annotation-processor, unused-kapt-plugin
//! 2. Inheritance: inherited
//! 3. Formatting: sort-dependencies, sort-plugins
//! 4. Depths, on the graph the fixes left behind
//!
//! Within a phase every project is checked in parallel against the same
//! graph state. Before the Declarations and Inheritance phases, the
//! implementation edges must-be-api flags are resolved as api-like, so a
//! consumer's declarations are judged against the visibility the fixes
//! produce. Between phases, when auto-correct is on, each project's
//! fixes are written in one pass per build file and mirrored into the
//! graph, so the next phase sees the corrected declarations.

use super::depth::{DepthCalculator, ProjectDepth};
use super::rules::{MustBeApiRule, Rule, RuleContext, RulePhase, RuleSet};
use super::{Finding, FixAction, UsageAnalyzer};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::graph::{ConfiguredDependency, ModuleGraph, ProjectPath};
use crate::oracle::ReferenceOracle;
use crate::parser::{BlockKind, BuildFile};
use crate::refactor::{FixOptions, FixPass};
use crate::resolve::Resolver;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// A build file whose fix pass failed. Nothing was written to it.
#[derive(Debug)]
pub struct FixFailure {
    pub project: ProjectPath,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Every finding, by project then position.
    pub findings: Vec<Finding>,
    pub failures: Vec<FixFailure>,
    pub depths: Vec<ProjectDepth>,
    /// Degraded conditions: oracle failures and graph inconsistencies.
    pub warnings: Vec<Error>,
}

impl RunOutcome {
    /// Findings that still describe a defect.
    pub fn unfixed(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.fixed && !f.is_report_only())
    }

    pub fn fixed_count(&self) -> usize {
        self.findings.iter().filter(|f| f.fixed).count()
    }

    /// Issues worth a line in the report, depth findings excluded.
    pub fn issue_count(&self) -> usize {
        self.findings.iter().filter(|f| !f.is_report_only()).count()
    }

    pub fn by_project(&self) -> BTreeMap<&ProjectPath, Vec<&Finding>> {
        let mut grouped: BTreeMap<&ProjectPath, Vec<&Finding>> = BTreeMap::new();
        for finding in &self.findings {
            grouped.entry(&finding.project).or_default().push(finding);
        }
        grouped
    }

    pub fn is_success(&self, strict: bool) -> bool {
        self.unfixed().next().is_none() && (!strict || self.failures.is_empty())
    }
}

pub struct Runner<'a> {
    settings: &'a Settings,
    oracle: &'a dyn ReferenceOracle,
    rules: RuleSet,
    fix_options: FixOptions,
}

impl<'a> Runner<'a> {
    pub fn new(settings: &'a Settings, oracle: &'a dyn ReferenceOracle) -> Result<Self> {
        Ok(Self {
            settings,
            oracle,
            rules: RuleSet::from_settings(settings)?,
            fix_options: settings.fix_options()?,
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Runs every phase. With auto-correct on, build files are rewritten
    /// and `graph` ends up in the corrected state.
    pub fn run(&self, graph: &mut ModuleGraph) -> Result<RunOutcome> {
        let mut outcome = RunOutcome {
            warnings: graph.inconsistencies(),
            ..RunOutcome::default()
        };
        let usages = UsageAnalyzer::new(self.oracle);
        let stop = AtomicBool::new(false);

        for phase in RulePhase::ALL {
            if self.rules.in_phase(phase).next().is_none() {
                continue;
            }
            if stop.load(Ordering::Relaxed) {
                warn!("Strict mode: skipping {:?} phase after a failed fix pass", phase);
                break;
            }

            let build_files = read_build_files(graph);
            let mut findings = self.check_phase(phase, graph, &usages, &build_files);

            if self.settings.auto_correct {
                let failures = self.apply_fixes(graph, &mut findings, &stop);
                outcome.failures.extend(failures);
            }
            info!(
                "{:?} phase: {} finding(s), {} fixed",
                phase,
                findings.len(),
                findings.iter().filter(|f| f.fixed).count()
            );
            outcome.findings.extend(findings);
        }

        if self.settings.checks.depths {
            let calculator = DepthCalculator::new(graph);
            outcome.depths = calculator.report();
            for depth in &outcome.depths {
                if let Some(project) = graph.project(&depth.project) {
                    outcome.findings.push(depth.to_finding(project));
                }
            }
            info!("Depths: {} source set(s) measured", outcome.depths.len());
        }

        outcome.findings.sort_by(|a, b| {
            (&a.project, a.position, a.name, &a.dependency_identifier)
                .cmp(&(&b.project, b.position, b.name, &b.dependency_identifier))
        });
        outcome.warnings.extend(usages.warnings());
        Ok(outcome)
    }

    fn check_phase(
        &self,
        phase: RulePhase,
        graph: &ModuleGraph,
        usages: &UsageAnalyzer<'_>,
        build_files: &HashMap<ProjectPath, BuildFile>,
    ) -> Vec<Finding> {
        let projects: Vec<_> = graph
            .projects()
            .filter(|project| !self.settings.is_excluded(&project.path))
            .collect();
        let promoted = if self.settings.checks.must_be_api && phase != RulePhase::Formatting {
            self.must_be_api_edges(graph, usages, build_files)
        } else {
            Vec::new()
        };
        let resolver = Resolver::new(graph).with_promoted(promoted);

        projects
            .par_iter()
            .flat_map_iter(|project| {
                let build_file = build_files.get(&project.path);
                let ctx = RuleContext {
                    project,
                    graph,
                    resolver: &resolver,
                    usages,
                    settings: self.settings,
                    build_file,
                };
                let findings = self.rules.check(phase, &ctx);
                debug!("{}: {} finding(s) in {:?} phase", project.path, findings.len(), phase);
                findings
                    .into_iter()
                    .filter(move |finding| !is_suppressed(finding, build_file))
            })
            .collect()
    }

    /// `implementation` edges with an unsuppressed must-be-api finding.
    fn must_be_api_edges(
        &self,
        graph: &ModuleGraph,
        usages: &UsageAnalyzer<'_>,
        build_files: &HashMap<ProjectPath, BuildFile>,
    ) -> Vec<(ProjectPath, ConfiguredDependency)> {
        let resolver = Resolver::new(graph);
        let projects: Vec<_> = graph
            .projects()
            .filter(|project| !self.settings.is_excluded(&project.path))
            .collect();
        let edges: Vec<_> = projects
            .par_iter()
            .flat_map_iter(|project| {
                let build_file = build_files.get(&project.path);
                let ctx = RuleContext {
                    project,
                    graph,
                    resolver: &resolver,
                    usages,
                    settings: self.settings,
                    build_file,
                };
                MustBeApiRule
                    .check(&ctx)
                    .into_iter()
                    .filter(move |finding| !is_suppressed(finding, build_file))
                    .filter_map(|finding| Some((finding.project, finding.dependency?)))
            })
            .collect();
        if !edges.is_empty() {
            debug!("{} implementation edge(s) resolved as api", edges.len());
        }
        edges
    }

    /// Writes each project's fixes in one pass and mirrors them into the
    /// graph. Returns the files whose pass failed.
    fn apply_fixes(&self, graph: &mut ModuleGraph, findings: &mut [Finding], stop: &AtomicBool) -> Vec<FixFailure> {
        let mut by_project: BTreeMap<ProjectPath, Vec<usize>> = BTreeMap::new();
        for (index, finding) in findings.iter().enumerate() {
            if finding.is_fixable() {
                by_project.entry(finding.project.clone()).or_default().push(index);
            }
        }

        let jobs: Vec<(ProjectPath, std::path::PathBuf, Vec<usize>)> = by_project
            .into_iter()
            .filter_map(|(path, indices)| {
                let build_file = graph.project(&path)?.build_file.clone();
                Some((path, build_file, indices))
            })
            .collect();

        let shared: &[Finding] = findings;
        let results: Vec<(ProjectPath, Vec<usize>, Result<bool>)> = jobs
            .into_par_iter()
            .filter_map(|(path, build_file, indices)| {
                if stop.load(Ordering::Relaxed) {
                    debug!("{}: fix pass skipped after an earlier failure", path);
                    return None;
                }
                let result = FixPass::load(&build_file)
                    .map(|pass| pass.plan(indices.iter().map(|&i| &shared[i]), &self.fix_options))
                    .and_then(|pass| pass.apply())
                    .and_then(|pass| pass.write())
                    .map(|pass| pass.changed());
                if result.is_err() && self.settings.strict {
                    stop.store(true, Ordering::Relaxed);
                }
                Some((path, indices, result))
            })
            .collect();

        let mut failures = Vec::new();
        for (project, indices, result) in results {
            match result {
                Ok(changed) => {
                    debug!("{}: fixes applied (file changed: {})", project, changed);
                    for index in indices {
                        findings[index].fixed = true;
                        if let Some(fix) = &findings[index].fix {
                            mirror_fix(graph, &project, fix);
                        }
                    }
                }
                Err(error) => {
                    warn!("{}: {}", project, error);
                    failures.push(FixFailure { project, error });
                }
            }
        }
        failures
    }
}

fn read_build_files(graph: &ModuleGraph) -> HashMap<ProjectPath, BuildFile> {
    let projects: Vec<_> = graph.projects().collect();
    projects
        .par_iter()
        .filter_map(|project| match BuildFile::read(&project.build_file) {
            Ok(file) => Some((project.path.clone(), file)),
            Err(e) => {
                debug!("{}: no build file ({})", project.path, e);
                None
            }
        })
        .collect()
}

fn is_suppressed(finding: &Finding, build_file: Option<&BuildFile>) -> bool {
    let Some(file) = build_file else {
        return false;
    };
    match &finding.fix {
        Some(FixAction::SortDependencies) => finding.is_suppressed_by(file.block_suppressions(BlockKind::Dependencies)),
        Some(FixAction::SortPlugins) => finding.is_suppressed_by(file.block_suppressions(BlockKind::Plugins)),
        Some(FixAction::RemovePlugin { plugin }) => finding.is_suppressed_by(file.plugin_suppressions(plugin)),
        Some(fix) => fix
            .subject()
            .or(finding.dependency.as_ref())
            .is_some_and(|subject| finding.is_suppressed_by(file.suppressions_for(subject))),
        None => finding
            .dependency
            .as_ref()
            .is_some_and(|subject| finding.is_suppressed_by(file.suppressions_for(subject))),
    }
}

fn mirror_fix(graph: &mut ModuleGraph, project: &ProjectPath, fix: &FixAction) {
    match fix {
        FixAction::Remove { dependency } => {
            graph.remove_dependency(project, dependency);
        }
        FixAction::Add { dependency, .. } => {
            graph.add_dependency(project, dependency.clone());
        }
        FixAction::Retarget {
            dependency,
            configuration,
        } => {
            graph.reconfigure(project, dependency, configuration.clone());
        }
        FixAction::SortDependencies | FixAction::SortPlugins | FixAction::RemovePlugin { .. } => {}
    }
}
