//! Reference oracle boundary.
//!
//! Source scanning happens elsewhere. The analysis only asks three
//! questions: which symbols a source set references (and with what
//! visibility), which symbols a project source set exports, and which
//! symbols an external artifact exports.

mod cached;
mod snapshot;

pub use cached::CachedOracle;
pub use snapshot::SnapshotOracle;

use crate::graph::{MavenCoordinates, ProjectPath, SourceSetName};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Fully qualified name such as `com.example.lib1.Lib1Class`.
pub type QualifiedSymbol = String;

pub type SymbolSet = Arc<HashSet<QualifiedSymbol>>;

/// Visibility of the declaration that holds a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Part of the project's public API: supertypes, public signatures,
    /// public property types, generic bounds.
    Public,
    Internal,
    #[default]
    Private,
}

/// One reference from a source set to a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolUsage {
    pub symbol: QualifiedSymbol,
    #[serde(default)]
    pub visibility: Visibility,
}

impl SymbolUsage {
    pub fn new(symbol: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            symbol: symbol.into(),
            visibility,
        }
    }
}

/// The collaborator couldn't answer. Never retried by the analysis.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct OracleError {
    pub reason: String,
}

impl OracleError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub type OracleResult<T> = Result<T, OracleError>;

pub trait ReferenceOracle: Send + Sync {
    /// Every reference made from `source_set` of `project`.
    fn usages(&self, project: &ProjectPath, source_set: &SourceSetName) -> OracleResult<Arc<[SymbolUsage]>>;

    /// Symbols declared by `source_set` of `project`.
    fn exported_symbols(&self, project: &ProjectPath, source_set: &SourceSetName) -> OracleResult<SymbolSet>;

    /// Symbols an external artifact exports, or `None` when unknown.
    fn external_exports(&self, _coordinates: &MavenCoordinates) -> OracleResult<Option<SymbolSet>> {
        Ok(None)
    }

    fn referenced_symbols(&self, project: &ProjectPath, source_set: &SourceSetName) -> OracleResult<SymbolSet> {
        let usages = self.usages(project, source_set)?;
        Ok(Arc::new(usages.iter().map(|u| u.symbol.clone()).collect()))
    }

    fn visibility(&self, usage: &SymbolUsage) -> Visibility {
        usage.visibility
    }
}
