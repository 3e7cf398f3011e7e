use super::{OracleResult, ReferenceOracle, SymbolSet, SymbolUsage};
use crate::graph::{MavenCoordinates, ProjectPath, SourceSetName};
use dashmap::DashMap;
use std::sync::Arc;

type Key = (ProjectPath, SourceSetName);

/// Memoizes every answer of the wrapped oracle, failures included, so a
/// collaborator is asked at most once per question.
pub struct CachedOracle<O> {
    inner: O,
    usages: DashMap<Key, OracleResult<Arc<[SymbolUsage]>>>,
    references: DashMap<Key, OracleResult<SymbolSet>>,
    exports: DashMap<Key, OracleResult<SymbolSet>>,
    external: DashMap<String, OracleResult<Option<SymbolSet>>>,
}

impl<O: ReferenceOracle> CachedOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            usages: DashMap::new(),
            references: DashMap::new(),
            exports: DashMap::new(),
            external: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Drops every cached answer. Called after build files change.
    pub fn clear(&self) {
        self.usages.clear();
        self.references.clear();
        self.exports.clear();
        self.external.clear();
    }
}

impl<O: ReferenceOracle> ReferenceOracle for CachedOracle<O> {
    fn usages(&self, project: &ProjectPath, source_set: &SourceSetName) -> OracleResult<Arc<[SymbolUsage]>> {
        self.usages
            .entry((project.clone(), source_set.clone()))
            .or_insert_with(|| self.inner.usages(project, source_set))
            .clone()
    }

    fn exported_symbols(&self, project: &ProjectPath, source_set: &SourceSetName) -> OracleResult<SymbolSet> {
        self.exports
            .entry((project.clone(), source_set.clone()))
            .or_insert_with(|| self.inner.exported_symbols(project, source_set))
            .clone()
    }

    fn external_exports(&self, coordinates: &MavenCoordinates) -> OracleResult<Option<SymbolSet>> {
        self.external
            .entry(coordinates.identifier())
            .or_insert_with(|| self.inner.external_exports(coordinates))
            .clone()
    }

    fn referenced_symbols(&self, project: &ProjectPath, source_set: &SourceSetName) -> OracleResult<SymbolSet> {
        let key = (project.clone(), source_set.clone());
        if let Some(hit) = self.references.get(&key) {
            return hit.clone();
        }
        // Not computed under the entry lock: `usages` takes its own.
        let answer = self
            .usages(project, source_set)
            .map(|usages| -> SymbolSet { Arc::new(usages.iter().map(|u| u.symbol.clone()).collect()) });
        self.references.entry(key).or_insert(answer).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleError, Visibility};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingOracle {
        calls: AtomicUsize,
    }

    impl ReferenceOracle for CountingOracle {
        fn usages(&self, project: &ProjectPath, _: &SourceSetName) -> OracleResult<Arc<[SymbolUsage]>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if project.as_str() == ":broken" {
                return Err(OracleError::new("scanner crashed"));
            }
            Ok(vec![SymbolUsage::new("a.B", Visibility::Public)].into())
        }

        fn exported_symbols(&self, _: &ProjectPath, _: &SourceSetName) -> OracleResult<SymbolSet> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(HashSet::new()))
        }
    }

    #[test]
    fn test_answers_are_memoized() {
        let oracle = CachedOracle::new(CountingOracle::default());
        let project = ProjectPath::new(":lib");
        let main = SourceSetName::main();

        let first = oracle.referenced_symbols(&project, &main).unwrap();
        let second = oracle.referenced_symbols(&project, &main).unwrap();
        assert!(first.contains("a.B"));
        assert_eq!(first, second);
        assert_eq!(oracle.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_are_not_retried() {
        let oracle = CachedOracle::new(CountingOracle::default());
        let project = ProjectPath::new(":broken");
        let main = SourceSetName::main();

        assert!(oracle.usages(&project, &main).is_err());
        assert!(oracle.usages(&project, &main).is_err());
        assert_eq!(oracle.inner().calls.load(Ordering::SeqCst), 1);
    }
}
