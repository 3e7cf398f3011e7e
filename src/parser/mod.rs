//! Build-file model.
//!
//! A build file is kept as its original text plus a thin structural index:
//! the top-level `dependencies { }` and `plugins { }` blocks and the
//! statements inside them, each with byte spans for its code, annotations,
//! leading comments and same-line trailing comment. Nothing is re-printed;
//! the rewrite engine patches the original text through these spans.
//!
//! ## Statement boundaries
//!
//! A statement ends at a newline outside any bracket pair unless the line
//! ends with an operator or the next line starts with `.`. A `;` also ends
//! a statement. Annotation-only lines (`@Suppress("...")`) are merged into
//! the statement that follows them.

mod declaration;
mod dialect;
mod lexer;
mod plugin;
mod suppress;

pub use declaration::{parse_declaration, DeclaredTarget, Declaration};
pub use dialect::{Dialect, DialectPrinter, GroovyScript, KotlinScript};
pub use lexer::{CharClass, Lexed, LineIndex, Span};
pub use plugin::{canonical_plugin_id, parse_plugin, PluginDeclaration, KOTLIN_PLUGIN_PREFIX};
pub use suppress::{parse_all as parse_suppressions, parse_annotation, parse_noinspection};

use crate::error::{Error, Result};
use crate::graph::{ConfiguredDependency, ProjectPath};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// One-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Dependencies,
    Plugins,
}

impl BlockKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            BlockKind::Dependencies => "dependencies",
            BlockKind::Plugins => "plugins",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Statement {
    /// Annotation merged into the statement, own-line or inline.
    pub annotation: Option<Span>,
    /// The statement itself, annotations and trailing comment excluded.
    pub code: Span,
    pub trailing_comment: Option<Span>,
    /// Full-line comments directly above the statement, with no blank line
    /// in between.
    pub leading_comments: Vec<Span>,
    /// Line start of the first comment since the previous statement.
    pub chunk_start: usize,
    pub declaration: Option<Declaration>,
    pub suppressed: Vec<String>,
    pub position: Position,
    pub indent: String,
}

impl Statement {
    pub fn start(&self) -> usize {
        self.annotation.map_or(self.code.start, |a| a.start.min(self.code.start))
    }

    pub fn end(&self) -> usize {
        self.trailing_comment.map_or(self.code.end, |c| c.end)
    }

    /// Start of the leading comment block, or of the statement.
    pub fn comment_start(&self) -> usize {
        self.leading_comments
            .first()
            .map_or(self.start(), |c| c.start.min(self.start()))
    }

    pub fn code_text<'t>(&self, text: &'t str) -> &'t str {
        self.code.slice(text)
    }

    pub fn is_single_line(&self, text: &str) -> bool {
        !self.code.slice(text).contains('\n')
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    /// Keyword through the opening brace.
    pub header: Span,
    pub open: usize,
    pub close: usize,
    pub statements: Vec<Statement>,
    /// Comments after the last statement.
    pub tail_comments: Vec<Span>,
    pub suppressed: Vec<String>,
    pub header_indent: String,
    /// Indentation used by statements inside the block.
    pub indent: String,
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct BuildFile {
    pub path: PathBuf,
    pub dialect: Dialect,
    text: String,
    lines: LineIndex,
    blocks: Vec<Block>,
}

fn block_header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<keyword>dependencies|plugins)\s*\{").expect("valid block header pattern")
    })
}

fn annotation_prefix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^@[A-Za-z_][\w.:]*(?:\s*\([^()]*\))?\s*").expect("valid annotation pattern")
    })
}

impl BuildFile {
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let text = text.into();
        let dialect = Dialect::from_path(&path);
        let lines = LineIndex::new(&text);
        let blocks = Scanner::new(&text, &lines).blocks();
        debug!(
            "Parsed {} ({} blocks, {} statements)",
            path.display(),
            blocks.len(),
            blocks.iter().map(|b| b.statements.len()).sum::<usize>()
        );
        Self {
            path,
            dialect,
            text,
            lines,
            blocks,
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::parse(path, text))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn dependencies_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.kind == BlockKind::Dependencies)
    }

    pub fn plugins_blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.kind == BlockKind::Plugins)
    }

    /// Every parsed declaration, in file order.
    pub fn declarations(&self) -> impl Iterator<Item = (&Block, &Statement, &Declaration)> {
        self.dependencies_blocks().flat_map(|block| {
            block
                .statements
                .iter()
                .filter_map(move |s| s.declaration.as_ref().map(|d| (block, s, d)))
        })
    }

    /// Statements declaring `dependency`.
    pub fn find_statements(&self, dependency: &ConfiguredDependency) -> Vec<(&Block, &Statement)> {
        self.declarations()
            .filter(|(_, _, declaration)| declaration.matches(dependency))
            .map(|(block, statement, _)| (block, statement))
            .collect()
    }

    pub fn position_of(&self, dependency: &ConfiguredDependency) -> Option<Position> {
        self.find_statements(dependency)
            .first()
            .map(|(_, statement)| statement.position)
    }

    /// Suppression names in effect for `dependency`: its statement's own
    /// plus its block's.
    pub fn suppressions_for(&self, dependency: &ConfiguredDependency) -> Vec<&str> {
        self.find_statements(dependency)
            .into_iter()
            .flat_map(|(block, statement)| {
                statement
                    .suppressed
                    .iter()
                    .chain(block.suppressed.iter())
                    .map(String::as_str)
            })
            .collect()
    }

    /// `plugins { }` statements applying the plugin with canonical id `id`.
    pub fn find_plugin(&self, id: &str) -> Vec<(&Block, &Statement)> {
        self.plugins_blocks()
            .flat_map(|block| block.statements.iter().map(move |statement| (block, statement)))
            .filter(|(_, statement)| {
                parse_plugin(statement.code_text(&self.text)).is_some_and(|plugin| plugin.applied && plugin.id == id)
            })
            .collect()
    }

    pub fn applies_plugin(&self, id: &str) -> bool {
        !self.find_plugin(id).is_empty()
    }

    /// Suppression names in effect for the statement applying `id`.
    pub fn plugin_suppressions(&self, id: &str) -> Vec<&str> {
        self.find_plugin(id)
            .into_iter()
            .flat_map(|(block, statement)| {
                statement
                    .suppressed
                    .iter()
                    .chain(block.suppressed.iter())
                    .map(String::as_str)
            })
            .collect()
    }

    /// Suppressions on the blocks of `kind`.
    pub fn block_suppressions(&self, kind: BlockKind) -> Vec<&str> {
        self.blocks
            .iter()
            .filter(|b| b.kind == kind)
            .flat_map(|b| b.suppressed.iter().map(String::as_str))
            .collect()
    }

    pub fn position(&self, offset: usize) -> Position {
        let line = self.lines.line_of(offset);
        Position {
            line: line + 1,
            column: offset - self.lines.line_start(line) + 1,
        }
    }

    /// Declared dependencies, with type-safe project accessors resolved
    /// through `accessor_lookup`. Declarations whose target can't be
    /// resolved are skipped.
    pub fn dependencies(&self, accessor_lookup: impl Fn(&str) -> Option<ProjectPath>) -> Vec<ConfiguredDependency> {
        self.declarations()
            .filter_map(|(_, _, declaration)| {
                let target = declaration.to_target(&accessor_lookup)?;
                Some(
                    ConfiguredDependency::new(declaration.configuration.as_str(), target)
                        .with_test_fixtures(declaration.test_fixtures),
                )
            })
            .collect()
    }
}

struct Scanner<'t> {
    lexed: Lexed<'t>,
    lines: &'t LineIndex,
}

impl<'t> Scanner<'t> {
    fn new(text: &'t str, lines: &'t LineIndex) -> Self {
        Self {
            lexed: Lexed::new(text),
            lines,
        }
    }

    fn text(&self) -> &'t str {
        self.lexed.text()
    }

    fn blocks(&self) -> Vec<Block> {
        let bytes = self.text().as_bytes();
        let mut blocks = Vec::new();
        let mut depth = 0usize;
        let mut i = 0;

        while i < bytes.len() {
            if !self.lexed.is_code(i) {
                i += 1;
                continue;
            }
            match bytes[i] {
                b'{' => depth += 1,
                b'}' => depth = depth.saturating_sub(1),
                b'd' | b'p' if depth == 0 && self.is_word_start(i) => {
                    if let Some(block) = self.block_at(i) {
                        i = block.close + 1;
                        blocks.push(block);
                        continue;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        blocks
    }

    /// True when `offset` can't be the middle of an identifier or a
    /// qualified call like `subprojects.dependencies`.
    fn is_word_start(&self, offset: usize) -> bool {
        offset == 0 || {
            let prev = self.text().as_bytes()[offset - 1];
            !(prev.is_ascii_alphanumeric() || prev == b'_' || prev == b'.')
        }
    }

    fn block_at(&self, offset: usize) -> Option<Block> {
        let text = self.text();
        let captures = block_header_pattern().captures(&text[offset..])?;
        let keyword = captures.name("keyword")?.as_str();
        let kind = if keyword == "dependencies" {
            BlockKind::Dependencies
        } else {
            BlockKind::Plugins
        };
        let open = offset + captures.get(0)?.end() - 1;
        if !self.lexed.is_code(open) {
            return None;
        }
        let close = self.lexed.matching_brace(open)?;

        let header_indent = self.indent_before(offset);
        let mut block = Block {
            kind,
            header: Span::new(offset, open + 1),
            open,
            close,
            statements: Vec::new(),
            tail_comments: Vec::new(),
            suppressed: self.header_suppressions(offset),
            indent: format!("{header_indent}  "),
            header_indent,
        };
        self.scan_body(&mut block);
        if let Some(first) = block.statements.first() {
            block.indent = first.indent.clone();
        }
        Some(block)
    }

    /// Whitespace between the line start and `offset`, or empty when code
    /// precedes it.
    fn indent_before(&self, offset: usize) -> String {
        let line_start = self.lines.line_start(self.lines.line_of(offset));
        let prefix = &self.text()[line_start..offset];
        if prefix.chars().all(|c| c == ' ' || c == '\t') {
            prefix.to_string()
        } else {
            String::new()
        }
    }

    /// `@Suppress` / `//noinspection` on the header line or the contiguous
    /// comment and annotation lines above it.
    fn header_suppressions(&self, offset: usize) -> Vec<String> {
        let text = self.text();
        let header_line = self.lines.line_of(offset);
        let mut region_start = self.lines.line_start(header_line);
        let mut line = header_line;
        while line > 0 {
            let start = self.lines.line_start(line - 1);
            let content = text[start..self.lines.line_start(line)].trim();
            let is_marker = content.starts_with("//")
                || content.starts_with("/*")
                || content.starts_with('*')
                || content.starts_with('@');
            if content.is_empty() || !is_marker {
                break;
            }
            region_start = start;
            line -= 1;
        }
        parse_suppressions(&text[region_start..offset])
    }

    fn scan_body(&self, block: &mut Block) {
        let text = self.text();
        let bytes = text.as_bytes();
        let body_end = block.close;
        let mut pending_comments: Vec<Span> = Vec::new();
        let mut pending_annotation: Option<Span> = None;
        let mut i = block.open + 1;

        while i < body_end {
            let class = self.lexed.class(i);
            if class.is_comment() {
                let end = self.lexed.comment_end(i).min(body_end);
                pending_comments.push(Span::new(i, end));
                i = end;
                continue;
            }
            if bytes[i].is_ascii_whitespace() {
                i += 1;
                continue;
            }

            let (raw_end, resume) = self.statement_end(i, body_end);
            let code_end = self.trim_code_end(i, raw_end);
            let trailing_comment = self.trailing_comment(raw_end, body_end);
            let resume = trailing_comment.map_or(resume, |c| resume.max(c.end));

            let raw = Span::new(i, code_end);
            let (annotation, code) = self.split_annotation(raw);
            let Some(code) = code else {
                // Annotation alone on its line: it belongs to the next statement.
                pending_annotation = Some(pending_annotation.map_or(raw, |a| Span::new(a.start, raw.end)));
                i = resume;
                continue;
            };
            let annotation = match (pending_annotation.take(), annotation) {
                (Some(own_line), Some(inline)) => Some(Span::new(own_line.start, inline.end)),
                (own_line, inline) => own_line.or(inline),
            };

            let statement_start = annotation.map_or(code.start, |a| a.start);
            let chunk_start = pending_comments
                .first()
                .map_or(statement_start, |c| c.start.min(statement_start));
            let chunk_start = self.lines.line_start(self.lines.line_of(chunk_start));
            let leading_comments = self.leading_block(&pending_comments, statement_start);

            let mut suppressed = annotation
                .map(|a| parse_annotation(a.slice(text)))
                .unwrap_or_default();
            for comment in &leading_comments {
                suppressed.extend(parse_suppressions(comment.slice(text)));
            }

            let declaration = match block.kind {
                BlockKind::Dependencies => parse_declaration(code.slice(text), code.start),
                BlockKind::Plugins => None,
            };
            let line = self.lines.line_of(code.start);
            block.statements.push(Statement {
                annotation,
                code,
                trailing_comment,
                leading_comments,
                chunk_start,
                declaration,
                suppressed,
                position: Position {
                    line: line + 1,
                    column: code.start - self.lines.line_start(line) + 1,
                },
                indent: self.indent_before(statement_start),
            });
            pending_comments.clear();
            i = resume;
        }

        block.tail_comments = pending_comments;
    }

    /// Exclusive end of the statement starting at `start`, and the offset
    /// scanning resumes from.
    fn statement_end(&self, start: usize, limit: usize) -> (usize, usize) {
        let bytes = self.text().as_bytes();
        let mut depth = 0usize;
        let mut j = start;
        while j < limit {
            let class = self.lexed.class(j);
            if class.is_comment() {
                j = self.lexed.comment_end(j).min(limit);
                continue;
            }
            if class == CharClass::Str {
                j += 1;
                continue;
            }
            match bytes[j] {
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                b';' if depth == 0 => return (j, j + 1),
                b'\n' if depth == 0 && !self.continues(start, j, limit) => return (j, j),
                _ => {}
            }
            j += 1;
        }
        (limit, limit)
    }

    /// Whether the statement carries on past the newline at `newline`.
    fn continues(&self, start: usize, newline: usize, limit: usize) -> bool {
        let bytes = self.text().as_bytes();
        let significant = |k: usize| !bytes[k].is_ascii_whitespace() && !self.lexed.class(k).is_comment();

        let last = (start..newline).rev().find(|&k| significant(k));
        if let Some(k) = last {
            if self.lexed.is_code(k)
                && matches!(
                    bytes[k],
                    b'.' | b',' | b'+' | b'-' | b'*' | b'/' | b'=' | b'&' | b'|' | b'?' | b':'
                )
            {
                return true;
            }
        }
        let next = (newline + 1..limit).find(|&k| significant(k));
        matches!(next, Some(k) if self.lexed.is_code(k) && (bytes[k] == b'.' || bytes[k..].starts_with(b"?.")))
    }

    fn trim_code_end(&self, start: usize, end: usize) -> usize {
        let bytes = self.text().as_bytes();
        (start..end)
            .rev()
            .find(|&k| !bytes[k].is_ascii_whitespace() && !self.lexed.class(k).is_comment())
            .map_or(start, |k| k + 1)
    }

    /// A comment opening on the same line right after the statement.
    fn trailing_comment(&self, from: usize, limit: usize) -> Option<Span> {
        let bytes = self.text().as_bytes();
        let mut k = from;
        // Back up over a comment the statement scan already stepped across.
        while k > 0 && self.lexed.class(k - 1).is_comment() {
            k -= 1;
        }
        while k > 0 && matches!(bytes[k - 1], b' ' | b'\t') {
            k -= 1;
        }
        let mut j = k;
        while j < limit && matches!(bytes[j], b' ' | b'\t' | b';') {
            j += 1;
        }
        if j < limit && self.lexed.class(j).is_comment() {
            let start = j;
            let end = self.lexed.comment_end(j).min(limit);
            return Some(Span::new(start, end));
        }
        None
    }

    fn split_annotation(&self, raw: Span) -> (Option<Span>, Option<Span>) {
        let code = raw.slice(self.text());
        let Some(m) = annotation_prefix_pattern().find(code) else {
            return (None, Some(raw));
        };
        if m.end() >= code.len() {
            return (Some(raw), None);
        }
        (
            Some(Span::new(raw.start, raw.start + m.as_str().trim_end().len())),
            Some(Span::new(raw.start + m.end(), raw.end)),
        )
    }

    /// The comments of `pending` that sit on full lines directly above
    /// `statement_start`, without a blank line in between.
    fn leading_block(&self, pending: &[Span], statement_start: usize) -> Vec<Span> {
        let text = self.text();
        let mut boundary = self.lines.line_start(self.lines.line_of(statement_start));
        let mut block = Vec::new();
        for comment in pending.iter().rev() {
            let comment_line = self.lines.line_of(comment.start);
            let line_start = self.lines.line_start(comment_line);
            let full_line = text[line_start..comment.start].trim().is_empty();
            let between = &text[comment.end.min(boundary)..boundary];
            let blank_gap = between.matches('\n').count() > 1;
            if !full_line || blank_gap || comment.end > boundary {
                break;
            }
            block.push(*comment);
            boundary = line_start;
        }
        block.reverse();
        block
    }
}
