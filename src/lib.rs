//! ModuleAudit - Dependency correctness for multi-module Gradle builds
//!
//! This library checks every dependency declaration of a module graph and
//! rewrites build files to fix what it finds, touching only the exact
//! statements involved.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Discovery** - Load the workspace snapshot into a module graph and reference oracle
//! 2. **Resolution** - Compute what each source set sees through `api` chains and inheritance
//! 3. **Rules** - Unused, overshot, must-be-api, inherited, redundant, sorting and annotation processors
//! 4. **Fixes** - Text-preserving edits applied per build file between rule phases
//! 5. **Depth** - Longest project dependency chain per source set, after fixes
//! 6. **Reporting** - Terminal tables, JSON and the depth report

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod oracle;
pub mod parser;
pub mod refactor;
pub mod report;
pub mod resolve;

pub use analysis::{DepthCalculator, Finding, FindingName, FixAction, ProjectDepth, RunOutcome, Runner};
pub use config::Settings;
pub use discovery::Workspace;
pub use error::{Error, Result};
pub use graph::{ConfiguredDependency, DependencyTarget, ModuleGraph, Project, ProjectPath, SourceSetName};
pub use oracle::{CachedOracle, ReferenceOracle, SnapshotOracle};
pub use refactor::{FixOptions, FixPass};
pub use report::{ReportFormat, Reporter};
pub use resolve::Resolver;
