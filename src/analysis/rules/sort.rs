//! Sort Dependencies / Sort Plugins Rules
//!
//! One finding per build file whose `dependencies` (or `plugins`) blocks
//! aren't in the configured order. Both rules compare a block against the
//! body the sort fix would write, so a file is reported exactly when the
//! fix would change it.

use super::{Rule, RuleContext, RulePhase};
use crate::analysis::{Finding, FindingName, FixAction};
use crate::parser::{BlockKind, BuildFile};
use crate::refactor::{sort_edit, DependencyOrdering, PluginOrdering};

pub struct SortDependenciesRule {
    dependencies: DependencyOrdering,
    plugins: PluginOrdering,
}

impl SortDependenciesRule {
    pub fn new(dependencies: DependencyOrdering, plugins: PluginOrdering) -> Self {
        Self { dependencies, plugins }
    }
}

impl Rule for SortDependenciesRule {
    fn name(&self) -> FindingName {
        FindingName::SortDependencies
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Formatting
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        unsorted_block(ctx, BlockKind::Dependencies, &self.dependencies, &self.plugins)
    }
}

pub struct SortPluginsRule {
    dependencies: DependencyOrdering,
    plugins: PluginOrdering,
}

impl SortPluginsRule {
    pub fn new(dependencies: DependencyOrdering, plugins: PluginOrdering) -> Self {
        Self { dependencies, plugins }
    }
}

impl Rule for SortPluginsRule {
    fn name(&self) -> FindingName {
        FindingName::SortPlugins
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Formatting
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        unsorted_block(ctx, BlockKind::Plugins, &self.dependencies, &self.plugins)
    }
}

fn unsorted_block(
    ctx: &RuleContext<'_>,
    kind: BlockKind,
    dependencies: &DependencyOrdering,
    plugins: &PluginOrdering,
) -> Vec<Finding> {
    let Some(file) = ctx.build_file else {
        return Vec::new();
    };
    let (name, fix) = match kind {
        BlockKind::Dependencies => (FindingName::SortDependencies, FixAction::SortDependencies),
        BlockKind::Plugins => (FindingName::SortPlugins, FixAction::SortPlugins),
    };
    first_unsorted(file, kind, dependencies, plugins)
        .map(|offset| {
            Finding::new(name, ctx.project)
                .with_position(Some(file.position(offset)))
                .with_fix(fix)
        })
        .into_iter()
        .collect()
}

/// Header offset of the first block of `kind` that sorting would change.
fn first_unsorted(
    file: &BuildFile,
    kind: BlockKind,
    dependencies: &DependencyOrdering,
    plugins: &PluginOrdering,
) -> Option<usize> {
    file.blocks()
        .iter()
        .filter(|block| block.kind == kind)
        .find(|block| sort_edit(file, block, dependencies, plugins).is_some())
        .map(|block| block.header.start)
}
