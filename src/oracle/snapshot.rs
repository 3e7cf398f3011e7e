use super::{OracleError, OracleResult, ReferenceOracle, SymbolSet, SymbolUsage, Visibility};
use crate::graph::{MavenCoordinates, ProjectPath, SourceSetName};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

type Key = (ProjectPath, SourceSetName);

/// Oracle answering from precomputed scanner output.
///
/// Source sets without recorded data reference and export nothing. Source
/// sets marked unavailable fail, which the rules treat as "assume used".
#[derive(Debug, Clone, Default)]
pub struct SnapshotOracle {
    usages: HashMap<Key, Arc<[SymbolUsage]>>,
    exports: HashMap<Key, SymbolSet>,
    external: HashMap<String, SymbolSet>,
    unavailable: HashSet<Key>,
}

impl SnapshotOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_usages(
        mut self,
        project: &str,
        source_set: &str,
        usages: impl IntoIterator<Item = SymbolUsage>,
    ) -> Self {
        self.record_usages(ProjectPath::new(project), SourceSetName::new(source_set), usages);
        self
    }

    /// Shorthand for private references.
    pub fn with_references(self, project: &str, source_set: &str, symbols: &[&str]) -> Self {
        let usages = symbols
            .iter()
            .map(|s| SymbolUsage::new(*s, Visibility::Private))
            .collect::<Vec<_>>();
        self.with_usages(project, source_set, usages)
    }

    pub fn with_exports(mut self, project: &str, source_set: &str, symbols: &[&str]) -> Self {
        self.record_exports(
            ProjectPath::new(project),
            SourceSetName::new(source_set),
            symbols.iter().map(|s| s.to_string()),
        );
        self
    }

    pub fn with_external(mut self, coordinates: &str, symbols: &[&str]) -> Self {
        self.record_external(
            MavenCoordinates::parse(coordinates).identifier(),
            symbols.iter().map(|s| s.to_string()),
        );
        self
    }

    pub fn with_unavailable(mut self, project: &str, source_set: &str) -> Self {
        self.unavailable
            .insert((ProjectPath::new(project), SourceSetName::new(source_set)));
        self
    }

    pub fn record_usages(
        &mut self,
        project: ProjectPath,
        source_set: SourceSetName,
        usages: impl IntoIterator<Item = SymbolUsage>,
    ) {
        let key = (project, source_set);
        let mut merged: Vec<SymbolUsage> = self
            .usages
            .get(&key)
            .map(|existing| existing.to_vec())
            .unwrap_or_default();
        merged.extend(usages);
        self.usages.insert(key, merged.into());
    }

    pub fn record_exports(
        &mut self,
        project: ProjectPath,
        source_set: SourceSetName,
        symbols: impl IntoIterator<Item = String>,
    ) {
        let key = (project, source_set);
        let mut merged: HashSet<String> = self
            .exports
            .get(&key)
            .map(|existing| existing.as_ref().clone())
            .unwrap_or_default();
        merged.extend(symbols);
        self.exports.insert(key, Arc::new(merged));
    }

    pub fn record_external(&mut self, identifier: String, symbols: impl IntoIterator<Item = String>) {
        self.external
            .insert(identifier, Arc::new(symbols.into_iter().collect()));
    }

    pub fn record_unavailable(&mut self, project: ProjectPath, source_set: SourceSetName) {
        self.unavailable.insert((project, source_set));
    }

    fn check_available(&self, project: &ProjectPath, source_set: &SourceSetName) -> OracleResult<()> {
        if self.unavailable.contains(&(project.clone(), source_set.clone())) {
            return Err(OracleError::new(format!(
                "no scanner output for {project} ({source_set})"
            )));
        }
        Ok(())
    }
}

impl ReferenceOracle for SnapshotOracle {
    fn usages(&self, project: &ProjectPath, source_set: &SourceSetName) -> OracleResult<Arc<[SymbolUsage]>> {
        self.check_available(project, source_set)?;
        Ok(self
            .usages
            .get(&(project.clone(), source_set.clone()))
            .cloned()
            .unwrap_or_else(|| Vec::new().into()))
    }

    fn exported_symbols(&self, project: &ProjectPath, source_set: &SourceSetName) -> OracleResult<SymbolSet> {
        self.check_available(project, source_set)?;
        Ok(self
            .exports
            .get(&(project.clone(), source_set.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn external_exports(&self, coordinates: &MavenCoordinates) -> OracleResult<Option<SymbolSet>> {
        Ok(self.external.get(&coordinates.identifier()).cloned())
    }
}
