//! Dependency-correctness analysis: findings, rules, depths and the phased
//! runner that ties them to the fix applier.

mod depth;
mod finding;
pub mod rules;
mod runner;
mod usage;

pub use depth::{DepthCalculator, ProjectDepth};
pub use finding::{Finding, FindingName, FixAction, Severity};
pub use rules::{Rule, RuleContext, RuleKind, RulePhase, RuleSet};
pub use runner::{FixFailure, RunOutcome, Runner};
pub use usage::{Usage, UsageAnalyzer};
