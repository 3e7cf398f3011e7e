//! One fix pass over one build file.
//!
//! ```text
//! Loaded --plan--> FixesSorted --apply--> EditsApplied(n) --write--> Written
//! ```
//!
//! Every edit is computed against the text as loaded. If any statement a
//! fix refers to can't be located exactly once, `apply` fails and nothing
//! is written.

use super::edit::{apply_edits, line_end, line_end_inclusive, line_ending, line_start, Edit};
use super::ordering::{DependencyOrdering, GroupKey, ItemKey, PluginOrdering};
use super::sort::sort_edit;
use crate::analysis::{Finding, FindingName, FixAction};
use crate::error::{Error, Result};
use crate::graph::{ConfiguredDependency, DependencyTarget};
use crate::parser::{parse_declaration, Block, BuildFile, DeclaredTarget, Span, Statement};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings that shape the edits.
#[derive(Debug, Clone, Default)]
pub struct FixOptions {
    /// Delete unused declarations instead of commenting them out.
    pub delete_unused: bool,
    pub dependency_ordering: DependencyOrdering,
    pub plugin_ordering: PluginOrdering,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFix {
    pub name: FindingName,
    pub action: FixAction,
}

pub struct Loaded {
    file: BuildFile,
}

pub struct FixesSorted {
    file: BuildFile,
    fixes: Vec<PlannedFix>,
    options: FixOptions,
}

pub struct EditsApplied {
    original: String,
    text: String,
    edits: usize,
}

pub struct Written {
    changed: bool,
    edits: usize,
}

pub struct FixPass<S> {
    path: PathBuf,
    state: S,
}

impl<S> FixPass<S> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FixPass<Loaded> {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_file(BuildFile::read(path)?))
    }

    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self::from_file(BuildFile::parse(path, text))
    }

    pub fn from_file(file: BuildFile) -> Self {
        Self {
            path: file.path.clone(),
            state: Loaded { file },
        }
    }

    /// Orders fixes: additions, then modifications, then removals; by
    /// finding name and dependency within each group. Duplicate actions on
    /// the same declaration collapse into the first.
    pub fn plan<'f>(self, findings: impl IntoIterator<Item = &'f Finding>, options: &FixOptions) -> FixPass<FixesSorted> {
        let mut fixes: Vec<PlannedFix> = findings
            .into_iter()
            .filter_map(|finding| {
                finding.fix.clone().map(|action| PlannedFix {
                    name: finding.name,
                    action,
                })
            })
            .collect();
        fixes.sort_by(|a, b| {
            (a.action.group_rank(), a.name, a.action.identifier())
                .cmp(&(b.action.group_rank(), b.name, b.action.identifier()))
        });

        let mut unique: Vec<PlannedFix> = Vec::with_capacity(fixes.len());
        for fix in fixes {
            if !unique.iter().any(|kept| same_subject(&kept.action, &fix.action)) {
                unique.push(fix);
            }
        }

        FixPass {
            path: self.path,
            state: FixesSorted {
                file: self.state.file,
                fixes: unique,
                options: options.clone(),
            },
        }
    }
}

fn same_subject(a: &FixAction, b: &FixAction) -> bool {
    match (a, b) {
        (FixAction::Remove { dependency: x }, FixAction::Remove { dependency: y })
        | (FixAction::Add { dependency: x, .. }, FixAction::Add { dependency: y, .. })
        | (FixAction::Retarget { dependency: x, .. }, FixAction::Retarget { dependency: y, .. }) => x.matches(y),
        (FixAction::SortDependencies, FixAction::SortDependencies) => true,
        (FixAction::SortPlugins, FixAction::SortPlugins) => true,
        (FixAction::RemovePlugin { plugin: x }, FixAction::RemovePlugin { plugin: y }) => x == y,
        _ => false,
    }
}

impl FixPass<FixesSorted> {
    pub fn fixes(&self) -> &[PlannedFix] {
        &self.state.fixes
    }

    pub fn apply(self) -> Result<FixPass<EditsApplied>> {
        let FixesSorted { file, fixes, options } = self.state;
        let edits = Planner::new(&file, &options).edits(&fixes)?;
        let (text, count) = apply_edits(&self.path, file.text(), edits)?;
        debug!("{}: {} edit(s) from {} fix(es)", self.path.display(), count, fixes.len());

        Ok(FixPass {
            path: self.path,
            state: EditsApplied {
                original: file.text().to_string(),
                text,
                edits: count,
            },
        })
    }
}

impl FixPass<EditsApplied> {
    pub fn text(&self) -> &str {
        &self.state.text
    }

    pub fn edit_count(&self) -> usize {
        self.state.edits
    }

    pub fn is_changed(&self) -> bool {
        self.state.text != self.state.original
    }

    /// Writes the new text. Unchanged files aren't touched.
    pub fn write(self) -> Result<FixPass<Written>> {
        let changed = self.is_changed();
        if changed {
            std::fs::write(&self.path, &self.state.text).map_err(|e| Error::io(&self.path, e))?;
        }
        Ok(FixPass {
            path: self.path,
            state: Written {
                changed,
                edits: self.state.edits,
            },
        })
    }
}

impl FixPass<Written> {
    pub fn changed(&self) -> bool {
        self.state.changed
    }

    pub fn edit_count(&self) -> usize {
        self.state.edits
    }
}

/// One line to insert, with its sort keys.
struct NewLine {
    group: GroupKey,
    item: ItemKey,
    text: String,
}

enum Placement {
    /// At a line start inside a block that has live statements.
    Line(usize),
    /// Before the closing brace of a block without live statements.
    EmptyBlock(usize),
    /// No dependencies block at all.
    NewBlock,
}

struct Planner<'a> {
    file: &'a BuildFile,
    text: &'a str,
    /// The file's own line ending, reused for every line written.
    eol: &'static str,
    options: &'a FixOptions,
}

impl<'a> Planner<'a> {
    fn new(file: &'a BuildFile, options: &'a FixOptions) -> Self {
        Self {
            file,
            text: file.text(),
            eol: line_ending(file.text()),
            options,
        }
    }

    fn mismatch(&self, expected: impl Into<String>) -> Error {
        Error::FixSpanMismatch {
            path: self.file.path.clone(),
            expected: expected.into(),
        }
    }

    fn edits(&self, fixes: &[PlannedFix]) -> Result<Vec<Edit>> {
        let removed: Vec<&ConfiguredDependency> = fixes
            .iter()
            .filter_map(|fix| match &fix.action {
                FixAction::Remove { dependency } => Some(dependency),
                _ => None,
            })
            .collect();

        let mut edits = Vec::new();
        let mut lines: BTreeMap<usize, Vec<NewLine>> = BTreeMap::new();
        let mut empty_blocks: BTreeMap<usize, Vec<NewLine>> = BTreeMap::new();
        let mut new_block: Vec<NewLine> = Vec::new();

        for fix in fixes {
            match &fix.action {
                FixAction::Remove { dependency } => {
                    let statement = self.locate(dependency)?;
                    edits.push(if self.options.delete_unused {
                        self.delete(statement)
                    } else {
                        self.comment_out(statement, fix.name)
                    });
                }
                FixAction::RemovePlugin { plugin } => {
                    let statement = self.locate_plugin(plugin)?;
                    edits.push(if self.options.delete_unused {
                        self.delete(statement)
                    } else {
                        self.comment_out(statement, fix.name)
                    });
                }
                FixAction::Retarget {
                    dependency,
                    configuration,
                } => {
                    let statement = self.locate(dependency)?;
                    let declaration = statement
                        .declaration
                        .as_ref()
                        .ok_or_else(|| self.mismatch(dependency.to_string()))?;
                    edits.push(Edit::replace(
                        declaration.configuration_span,
                        self.file.dialect.printer().render_configuration(configuration),
                    ));
                }
                FixAction::Add { dependency, anchor } => {
                    if !self.file.find_statements(dependency).is_empty() {
                        continue;
                    }
                    let line = self.new_line(dependency, anchor.as_ref());
                    match self.placement(&line, &removed) {
                        Placement::Line(offset) => lines.entry(offset).or_default().push(line),
                        Placement::EmptyBlock(offset) => empty_blocks.entry(offset).or_default().push(line),
                        Placement::NewBlock => new_block.push(line),
                    }
                }
                FixAction::SortDependencies => {
                    for block in self.file.dependencies_blocks() {
                        edits.extend(self.sort(block));
                    }
                }
                FixAction::SortPlugins => {
                    for block in self.file.plugins_blocks() {
                        edits.extend(self.sort(block));
                    }
                }
            }
        }

        for (offset, new_lines) in lines {
            edits.push(self.insert_between_statements(offset, new_lines, &removed));
        }
        for (close, new_lines) in empty_blocks {
            edits.push(self.insert_into_empty_block(close, new_lines));
        }
        if !new_block.is_empty() {
            edits.push(self.insert_new_block(new_block));
        }
        Ok(edits)
    }

    fn sort(&self, block: &Block) -> Option<Edit> {
        sort_edit(
            self.file,
            block,
            &self.options.dependency_ordering,
            &self.options.plugin_ordering,
        )
    }

    /// The single statement declaring `dependency`, alone on its lines.
    fn locate(&self, dependency: &ConfiguredDependency) -> Result<&'a Statement> {
        let found = self.file.find_statements(dependency);
        let [(_, statement)] = found.as_slice() else {
            return Err(self.mismatch(dependency.to_string()));
        };
        self.own_lines(statement, &dependency.to_string())
    }

    /// The single statement applying plugin `id`, alone on its lines.
    fn locate_plugin(&self, id: &str) -> Result<&'a Statement> {
        let found = self.file.find_plugin(id);
        let [(_, statement)] = found.as_slice() else {
            return Err(self.mismatch(format!("plugin {id}")));
        };
        self.own_lines(statement, &format!("plugin {id}"))
    }

    fn own_lines(&self, statement: &'a Statement, expected: &str) -> Result<&'a Statement> {
        let before = &self.text[line_start(self.text, statement.start())..statement.start()];
        let after = &self.text[statement.end()..line_end(self.text, statement.end())];
        if !before.trim().is_empty() || !after.trim_start_matches(';').trim().is_empty() {
            return Err(self.mismatch(format!("{expected} on its own line")));
        }
        Ok(statement)
    }

    /// Full lines from the leading comments through the statement's line.
    fn delete(&self, statement: &Statement) -> Edit {
        let text = self.text;
        let mut start = line_start(text, statement.comment_start());
        let mut end = line_end_inclusive(text, statement.end());

        let eol = self.eol;
        let before = &text[..start];
        let after = &text[end..];
        let previous_blank = self.ends_with_blank_line(before);
        let previous_opens = before.trim_end().ends_with('{');
        if after.starts_with(eol) && (previous_blank || previous_opens) {
            end += eol.len();
        } else if previous_blank && after.trim_start_matches([' ', '\t']).starts_with('}') {
            start -= eol.len();
        }
        Edit::delete(Span::new(start, end))
    }

    /// Comments out every line of the statement and tags the last one.
    /// Leading comments stay where they are; a trailing comment moves
    /// after the tag.
    fn comment_out(&self, statement: &Statement, name: FindingName) -> Edit {
        let text = self.text;
        let printer = self.file.dialect.printer();
        let start = line_start(text, statement.start());
        let mut end = line_end(text, statement.end());
        if text[..end].ends_with('\r') {
            end -= 1;
        }

        let mut lines: Vec<String> = text[start..statement.code.end]
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .map(|line| {
                let body = line.trim_start();
                if body.is_empty() {
                    line.to_string()
                } else {
                    let indent = &line[..line.len() - body.len()];
                    format!("{indent}{}", printer.render_comment(body.trim_end()))
                }
            })
            .collect();

        if let Some(last) = lines.last_mut() {
            last.push_str(&format!("  {} ModuleAudit finding [{}]", printer.line_comment(), name.id()));
            if let Some(comment) = statement.trailing_comment {
                last.push(' ');
                last.push_str(comment.slice(text).trim_end());
            }
        }
        Edit::replace(Span::new(start, end), lines.join(self.eol))
    }

    /// The statement text for `dependency`, copying the anchor's style when
    /// the anchor is a simple one-line declaration of the same shape.
    fn new_line(&self, dependency: &ConfiguredDependency, anchor: Option<&ConfiguredDependency>) -> NewLine {
        let anchor_statement = anchor.and_then(|a| self.file.find_statements(a).first().map(|(_, s)| *s));
        let statement_text = anchor_statement
            .and_then(|s| self.styled_like(s, dependency))
            .unwrap_or_else(|| {
                self.file.dialect.printer().render_invocation(
                    &dependency.configuration,
                    &dependency.target,
                    dependency.test_fixtures,
                )
            });

        let ordering = &self.options.dependency_ordering;
        let (group, item) = match parse_declaration(&statement_text, 0) {
            Some(declaration) => ordering.declaration_keys(&declaration, &statement_text),
            None => (
                ordering.group_key(&dependency.configuration, &statement_text),
                ordering.item_key(!dependency.target.is_external(), &dependency.target.identifier(), &statement_text),
            ),
        };
        NewLine {
            group,
            item,
            text: statement_text,
        }
    }

    fn styled_like(&self, anchor: &Statement, dependency: &ConfiguredDependency) -> Option<String> {
        let text = self.text;
        let declaration = anchor.declaration.as_ref()?;
        if !anchor.is_single_line(text)
            || declaration.has_trailing_block
            || declaration.test_fixtures != dependency.test_fixtures
        {
            return None;
        }
        let target_span = declaration.target_span?;
        let target_text = if declaration.target_matches(&dependency.target) {
            target_span.slice(text).to_string()
        } else {
            match (&declaration.target, &dependency.target) {
                (DeclaredTarget::ProjectPath(_), DependencyTarget::Project(path)) => path.to_string(),
                (DeclaredTarget::ProjectAccessor(_), DependencyTarget::Project(path)) => path.typesafe_accessor(),
                (DeclaredTarget::Coordinates(written), DependencyTarget::External(coordinates)) => {
                    let written_alias = written.starts_with("libs.");
                    let wanted_alias = coordinates.group.is_none() && coordinates.name.starts_with("libs.");
                    if written_alias != wanted_alias {
                        return None;
                    }
                    coordinates.notation()
                }
                _ => return None,
            }
        };

        let config_span = declaration.configuration_span;
        let code = anchor.code;
        Some(format!(
            "{}{}{}{}{}",
            &text[code.start..config_span.start],
            self.file
                .dialect
                .printer()
                .render_configuration(&dependency.configuration),
            &text[config_span.end..target_span.start],
            target_text,
            &text[target_span.end..code.end],
        ))
    }

    fn placement(&self, line: &NewLine, removed: &[&ConfiguredDependency]) -> Placement {
        let Some(block) = self.file.dependencies_blocks().next() else {
            return Placement::NewBlock;
        };
        let live = self.live_statements(block, removed);
        if live.is_empty() {
            return Placement::EmptyBlock(block.close);
        }
        let ordering = &self.options.dependency_ordering;
        let keyed: Vec<(GroupKey, ItemKey, &Statement)> = live
            .iter()
            .map(|s| {
                let (group, item) = ordering.statement_keys(s, self.text);
                (group, item, *s)
            })
            .collect();

        let same_group: Vec<_> = keyed.iter().filter(|(g, _, _)| *g == line.group).collect();
        if let Some((_, _, last)) = same_group.last() {
            return match same_group.iter().find(|(_, item, _)| *item > line.item) {
                Some((_, _, next)) => Placement::Line(self.before(next)),
                None => Placement::Line(self.after(last)),
            };
        }

        let next_group = keyed
            .iter()
            .filter(|(g, _, _)| *g > line.group)
            .min_by(|a, b| a.0.cmp(&b.0))
            .map(|(g, _, _)| g.clone());
        match next_group.and_then(|g| keyed.iter().find(|(k, _, _)| *k == g)) {
            Some((_, _, first)) => Placement::Line(self.before(first)),
            None => keyed
                .last()
                .map_or(Placement::EmptyBlock(block.close), |(_, _, last)| Placement::Line(self.after(last))),
        }
    }

    fn live_statements(&self, block: &'a Block, removed: &[&ConfiguredDependency]) -> Vec<&'a Statement> {
        block
            .statements
            .iter()
            .filter(|s| {
                s.declaration
                    .as_ref()
                    .map_or(true, |d| !removed.iter().any(|r| d.matches(r)))
            })
            .collect()
    }

    fn before(&self, statement: &Statement) -> usize {
        line_start(self.text, statement.comment_start())
    }

    fn after(&self, statement: &Statement) -> usize {
        line_end_inclusive(self.text, statement.end())
    }

    /// Neighbour groups decide where blank lines go.
    fn insert_between_statements(&self, offset: usize, mut new_lines: Vec<NewLine>, removed: &[&ConfiguredDependency]) -> Edit {
        new_lines.sort_by(|a, b| (&a.group, &a.item).cmp(&(&b.group, &b.item)));
        let text = self.text;
        let ordering = &self.options.dependency_ordering;

        let block = self
            .file
            .dependencies_blocks()
            .find(|b| b.open < offset && offset <= b.close);
        let live = block.map(|b| self.live_statements(b, removed)).unwrap_or_default();
        let previous = live.iter().rev().find(|s| self.after(s) <= offset);
        let next = live.iter().find(|s| self.before(s) >= offset);
        let indent = block.map_or("  ", |b| b.indent.as_str());
        let eol = self.eol;

        let mut out = String::new();
        if let (Some(previous), Some(first)) = (previous, new_lines.first()) {
            let previous_group = ordering.statement_keys(previous, text).0;
            let blank_above = self.ends_with_blank_line(&text[..offset]);
            if previous_group != first.group && !blank_above {
                out.push_str(eol);
            }
        }
        out.push_str(&join_lines(&new_lines, indent, eol));
        out.push_str(eol);
        if let (Some(next), Some(last)) = (next, new_lines.last()) {
            let next_group = ordering.statement_keys(next, text).0;
            let blank_below = text[offset..].starts_with(eol);
            if next_group != last.group && !blank_below {
                out.push_str(eol);
            }
        }
        Edit::insert(offset, out)
    }

    fn insert_into_empty_block(&self, close: usize, mut new_lines: Vec<NewLine>) -> Edit {
        new_lines.sort_by(|a, b| (&a.group, &a.item).cmp(&(&b.group, &b.item)));
        let text = self.text;
        let block = self.file.dependencies_blocks().find(|b| b.close == close);
        let indent = block.map_or("  ", |b| b.indent.as_str());
        let eol = self.eol;
        let body = join_lines(&new_lines, indent, eol);

        let close_line = line_start(text, close);
        let own_line = text[close_line..close].trim().is_empty() && block.map_or(false, |b| b.open < close_line);
        if own_line {
            return Edit::insert(close_line, format!("{body}{eol}"));
        }
        let header_indent = block.map_or("", |b| b.header_indent.as_str());
        Edit::insert(close, format!("{eol}{body}{eol}{header_indent}"))
    }

    /// A fresh `dependencies { }` block below `plugins { }`, or at the end
    /// of the file.
    fn insert_new_block(&self, mut new_lines: Vec<NewLine>) -> Edit {
        new_lines.sort_by(|a, b| (&a.group, &a.item).cmp(&(&b.group, &b.item)));
        let text = self.text;
        let eol = self.eol;
        let block = format!("dependencies {{{eol}{}{eol}}}", join_lines(&new_lines, "  ", eol));

        match self.file.plugins_blocks().next() {
            Some(plugins) => {
                let mut at = line_end(text, plugins.close);
                if text[..at].ends_with('\r') {
                    at -= 1;
                }
                Edit::insert(at, format!("{eol}{eol}{block}"))
            }
            None if text.trim().is_empty() => Edit::replace(Span::new(0, text.len()), format!("{block}{eol}")),
            None if text.ends_with('\n') => Edit::insert(text.len(), format!("{eol}{block}{eol}")),
            None => Edit::insert(text.len(), format!("{eol}{eol}{block}{eol}")),
        }
    }

    /// Whether `before` ends with an empty line.
    fn ends_with_blank_line(&self, before: &str) -> bool {
        before.ends_with(&format!("{0}{0}", self.eol))
    }
}

/// Indented lines, a blank line between groups.
fn join_lines(lines: &[NewLine], indent: &str, eol: &str) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push_str(eol);
            if lines[i - 1].group != line.group {
                out.push_str(eol);
            }
        }
        out.push_str(indent);
        out.push_str(&line.text);
    }
    out
}
