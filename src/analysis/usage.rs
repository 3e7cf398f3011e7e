//! Usage questions the rules ask, answered through the reference oracle.
//!
//! Every answer is three-valued. `Unknown` comes from an oracle failure or
//! an external artifact the oracle knows nothing about; rules treat it as
//! "used" so they never remove a declaration on missing evidence.

use crate::error::Error;
use crate::graph::{ConfiguredDependency, DependencyTarget, ProjectPath, SourceSetName};
use crate::oracle::{OracleError, ReferenceOracle, SymbolSet, SymbolUsage, Visibility};
use dashmap::DashMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Referenced,
    NotReferenced,
    Unknown,
}

impl Usage {
    /// `Referenced` wins over `Unknown`, which wins over `NotReferenced`.
    pub fn or(self, other: Usage) -> Usage {
        match (self, other) {
            (Usage::Referenced, _) | (_, Usage::Referenced) => Usage::Referenced,
            (Usage::Unknown, _) | (_, Usage::Unknown) => Usage::Unknown,
            _ => Usage::NotReferenced,
        }
    }

    /// Anything but a definite "not referenced".
    pub fn is_possibly_used(self) -> bool {
        self != Usage::NotReferenced
    }
}

/// Shared by every project of a rule phase. Oracle failures are logged
/// once per source set and kept for the final report.
pub struct UsageAnalyzer<'a> {
    oracle: &'a dyn ReferenceOracle,
    unavailable: DashMap<(ProjectPath, SourceSetName), String>,
}

impl<'a> UsageAnalyzer<'a> {
    pub fn new(oracle: &'a dyn ReferenceOracle) -> Self {
        Self {
            oracle,
            unavailable: DashMap::new(),
        }
    }

    pub fn oracle(&self) -> &'a dyn ReferenceOracle {
        self.oracle
    }

    /// Whether `source_set` of `project` references anything `target` exports.
    pub fn usage(
        &self,
        project: &ProjectPath,
        source_set: &SourceSetName,
        target: &DependencyTarget,
        test_fixtures: bool,
    ) -> Usage {
        self.matching_usage(project, source_set, target, test_fixtures, |_| true)
    }

    /// Like [`UsageAnalyzer::usage`], counting only references from public
    /// declarations.
    pub fn public_usage(
        &self,
        project: &ProjectPath,
        source_set: &SourceSetName,
        target: &DependencyTarget,
        test_fixtures: bool,
    ) -> Usage {
        let oracle = self.oracle;
        self.matching_usage(project, source_set, target, test_fixtures, |usage| {
            oracle.visibility(usage) == Visibility::Public
        })
    }

    /// Usage of the dependency's target from any of `source_sets`.
    pub fn usage_in_any<'s>(
        &self,
        project: &ProjectPath,
        source_sets: impl IntoIterator<Item = &'s SourceSetName>,
        dependency: &ConfiguredDependency,
    ) -> Usage {
        source_sets.into_iter().fold(Usage::NotReferenced, |acc, source_set| {
            if acc == Usage::Referenced {
                return acc;
            }
            acc.or(self.usage(project, source_set, &dependency.target, dependency.test_fixtures))
        })
    }

    /// Whether any reference of `source_set` is one of `symbols`.
    pub fn references_any(&self, project: &ProjectPath, source_set: &SourceSetName, symbols: &[String]) -> Usage {
        match self.oracle.usages(project, source_set) {
            Ok(usages) => {
                if usages.iter().any(|u| symbols.contains(&u.symbol)) {
                    Usage::Referenced
                } else {
                    Usage::NotReferenced
                }
            }
            Err(e) => {
                self.record(project, source_set, &e);
                Usage::Unknown
            }
        }
    }

    fn matching_usage(
        &self,
        project: &ProjectPath,
        source_set: &SourceSetName,
        target: &DependencyTarget,
        test_fixtures: bool,
        filter: impl Fn(&SymbolUsage) -> bool,
    ) -> Usage {
        let exports = match self.exports(target, test_fixtures) {
            Some(exports) => exports,
            None => return Usage::Unknown,
        };
        if exports.is_empty() {
            return Usage::NotReferenced;
        }
        match self.oracle.usages(project, source_set) {
            Ok(usages) => {
                if usages.iter().any(|u| filter(u) && exports.contains(&u.symbol)) {
                    Usage::Referenced
                } else {
                    Usage::NotReferenced
                }
            }
            Err(e) => {
                self.record(project, source_set, &e);
                Usage::Unknown
            }
        }
    }

    /// Symbols the target exposes to a consumer: a project's `main` (or
    /// `testFixtures`) declarations, or an external artifact's exports.
    /// `None` when the oracle can't tell.
    pub fn exports(&self, target: &DependencyTarget, test_fixtures: bool) -> Option<SymbolSet> {
        match target {
            DependencyTarget::Project(path) => {
                let source_set = if test_fixtures {
                    SourceSetName::test_fixtures()
                } else {
                    SourceSetName::main()
                };
                match self.oracle.exported_symbols(path, &source_set) {
                    Ok(exports) => Some(exports),
                    Err(e) => {
                        self.record(path, &source_set, &e);
                        None
                    }
                }
            }
            DependencyTarget::External(coordinates) => match self.oracle.external_exports(coordinates) {
                Ok(exports) => exports,
                Err(e) => {
                    warn!("No exports for {}: {}", coordinates.identifier(), e);
                    None
                }
            },
        }
    }

    fn record(&self, project: &ProjectPath, source_set: &SourceSetName, error: &OracleError) {
        let key = (project.clone(), source_set.clone());
        if self.unavailable.contains_key(&key) {
            return;
        }
        warn!(
            "Reference data unavailable for {} ({}): {}; assuming used",
            project, source_set, error
        );
        self.unavailable.insert(key, error.reason.clone());
    }

    /// One `OracleUnavailable` per failed source set, in path order.
    pub fn warnings(&self) -> Vec<Error> {
        let mut entries: Vec<_> = self
            .unavailable
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort();
        entries
            .into_iter()
            .map(|((project, source_set), reason)| Error::OracleUnavailable {
                project: project.to_string(),
                source_set: source_set.to_string(),
                reason,
            })
            .collect()
    }
}
