//! Block sorting.
//!
//! A block body is cut into chunks, one per statement: from the line of the
//! first comment since the previous statement through the end of the
//! statement's last line. Chunks are reordered and re-joined; blank lines
//! between chunks are regenerated, everything else is carried verbatim.

use super::edit::{line_end, line_ending, line_start, Edit};
use super::ordering::{DependencyOrdering, PluginOrdering};
use crate::parser::{Block, BlockKind, BuildFile, Span};

struct Chunk<'t> {
    text: &'t str,
    line_range: (usize, usize),
}

/// Replacement for the body of `block` with its statements sorted, or
/// `None` when the block can't be rewritten line-wise.
pub fn sorted_body(file: &BuildFile, block: &Block, dependencies: &DependencyOrdering, plugins: &PluginOrdering) -> Option<(Span, String)> {
    let text = file.text();
    let eol = line_ending(text);
    let body = body_span(text, block)?;
    let chunks = chunks(file, block)?;

    let sorted = match block.kind {
        BlockKind::Dependencies => {
            let mut keyed: Vec<_> = block
                .statements
                .iter()
                .zip(&chunks)
                .map(|(statement, chunk)| (dependencies.statement_keys(statement, text), chunk))
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));

            let mut out = String::new();
            let mut previous_group = None;
            for ((group, _), chunk) in keyed {
                match &previous_group {
                    Some(previous) if *previous == group => out.push('\n'),
                    Some(_) => {
                        out.push('\n');
                        out.push_str(eol);
                    }
                    None => {}
                }
                out.push_str(chunk.text);
                previous_group = Some(group);
            }
            out
        }
        BlockKind::Plugins => {
            let mut keyed: Vec<_> = block
                .statements
                .iter()
                .zip(&chunks)
                .map(|(statement, chunk)| (plugins.key(statement.code_text(text)), chunk))
                .collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            keyed
                .into_iter()
                .map(|(_, chunk)| chunk.text)
                .collect::<Vec<_>>()
                .join("\n")
        }
    };

    let mut sorted = sorted;
    if let (Some(first), Some(last)) = (block.tail_comments.first(), block.tail_comments.last()) {
        let tail = &text[line_start(text, first.start)..line_end(text, last.end)];
        if !sorted.is_empty() {
            sorted.push('\n');
        }
        sorted.push_str(tail);
    }
    if !sorted.is_empty() {
        sorted.push('\n');
    }
    Some((body, sorted))
}

/// The sort fix for `block`, when the block isn't sorted already.
pub fn sort_edit(file: &BuildFile, block: &Block, dependencies: &DependencyOrdering, plugins: &PluginOrdering) -> Option<Edit> {
    let (span, replacement) = sorted_body(file, block, dependencies, plugins)?;
    (span.slice(file.text()) != replacement).then(|| Edit::replace(span, replacement))
}

/// From the line after `{` to the start of the `}` line. Blocks whose brace
/// lines hold code are left alone.
fn body_span(text: &str, block: &Block) -> Option<Span> {
    let after_open = &text[block.open + 1..line_end(text, block.open)];
    if !after_open.trim().is_empty() {
        return None;
    }
    let close_line = line_start(text, block.close);
    if !text[close_line..block.close].trim().is_empty() {
        return None;
    }
    let start = (line_end(text, block.open) + 1).min(close_line);
    Some(Span::new(start, close_line))
}

fn chunks<'t>(file: &'t BuildFile, block: &Block) -> Option<Vec<Chunk<'t>>> {
    let text = file.text();
    let lines = file.lines();
    let mut chunks: Vec<Chunk<'t>> = Vec::with_capacity(block.statements.len());
    for statement in &block.statements {
        let start = statement.chunk_start;
        let end = line_end(text, statement.end());
        let line_range = (lines.line_of(start), lines.line_of(end));
        if let Some(previous) = chunks.last() {
            // Statements sharing a line can't be moved independently.
            if previous.line_range.1 >= line_range.0 {
                return None;
            }
        }
        chunks.push(Chunk {
            text: &text[start..end],
            line_range,
        });
    }
    Some(chunks)
}
