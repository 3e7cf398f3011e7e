use crate::error::{Error, Result};
use crate::parser::Span;
use std::cmp::Reverse;
use std::path::Path;

/// Replace `span` with `replacement`. Insertions use an empty span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Span,
    pub replacement: String,
}

impl Edit {
    pub fn replace(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }

    pub fn delete(span: Span) -> Self {
        Self::replace(span, String::new())
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::replace(Span::empty_at(offset), text)
    }
}

/// Applies `edits` from the highest offset to the lowest.
///
/// Identical edits collapse into one. Insertions at the same offset keep
/// the order they were given in. Any other overlap fails the whole batch.
pub fn apply_edits(path: &Path, text: &str, edits: Vec<Edit>) -> Result<(String, usize)> {
    let mut indexed: Vec<(usize, Edit)> = edits.into_iter().enumerate().collect();
    indexed.sort_by_key(|(index, edit)| (Reverse(edit.span.start), Reverse(edit.span.end), Reverse(*index)));
    indexed.dedup_by(|later, earlier| later.1 == earlier.1);

    for pair in indexed.windows(2) {
        let (higher, lower) = (&pair[0].1, &pair[1].1);
        if lower.span.end > higher.span.start {
            return Err(Error::OverlappingEdits {
                path: path.to_path_buf(),
                offset: higher.span.start,
            });
        }
    }

    let mut output = text.to_string();
    for (_, edit) in &indexed {
        if edit.span.end > output.len()
            || !output.is_char_boundary(edit.span.start)
            || !output.is_char_boundary(edit.span.end)
        {
            return Err(Error::FixSpanMismatch {
                path: path.to_path_buf(),
                expected: format!("offset {}", edit.span.start),
            });
        }
        output.replace_range(edit.span.start..edit.span.end, &edit.replacement);
    }
    Ok((output, indexed.len()))
}

/// `"\r\n"` when the file already uses it, `"\n"` otherwise.
pub fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Offset of the start of the line holding `offset`.
pub fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Offset of the `\n` ending the line holding `offset`, or the text length.
pub fn line_end(text: &str, offset: usize) -> usize {
    text[offset..].find('\n').map_or(text.len(), |i| offset + i)
}

/// Like [`line_end`], but past the newline.
pub fn line_end_inclusive(text: &str, offset: usize) -> usize {
    let end = line_end(text, offset);
    if end < text.len() {
        end + 1
    } else {
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(text: &str, edits: Vec<Edit>) -> Result<String> {
        apply_edits(Path::new("build.gradle.kts"), text, edits).map(|(out, _)| out)
    }

    #[test]
    fn test_edits_apply_from_the_end() {
        let out = apply(
            "abcdef",
            vec![
                Edit::replace(Span::new(0, 1), "A"),
                Edit::delete(Span::new(2, 4)),
                Edit::insert(6, "!"),
            ],
        )
        .unwrap();
        assert_eq!(out, "Abef!");
    }

    #[test]
    fn test_identical_edits_collapse() {
        let edit = Edit::delete(Span::new(1, 2));
        let (out, applied) = apply_edits(Path::new("x"), "abc", vec![edit.clone(), edit]).unwrap();
        assert_eq!(out, "ac");
        assert_eq!(applied, 1);
    }

    #[test]
    fn test_insertions_at_one_offset_keep_order() {
        let out = apply("ab", vec![Edit::insert(1, "1"), Edit::insert(1, "2")]).unwrap();
        assert_eq!(out, "a12b");
    }

    #[test]
    fn test_insert_next_to_replacement() {
        let out = apply("abc", vec![Edit::replace(Span::new(1, 2), "B"), Edit::insert(1, "_")]).unwrap();
        assert_eq!(out, "a_Bc");
    }

    #[test]
    fn test_overlaps_are_rejected() {
        let result = apply(
            "abcdef",
            vec![Edit::delete(Span::new(0, 3)), Edit::replace(Span::new(2, 4), "x")],
        );
        assert!(matches!(result, Err(Error::OverlappingEdits { offset: 2, .. })));

        let result = apply("abcdef", vec![Edit::delete(Span::new(0, 3)), Edit::insert(1, "x")]);
        assert!(matches!(result, Err(Error::OverlappingEdits { .. })));
    }

    #[test]
    fn test_line_helpers() {
        let text = "ab\ncd\nef";
        assert_eq!(line_start(text, 4), 3);
        assert_eq!(line_end(text, 4), 5);
        assert_eq!(line_end_inclusive(text, 4), 6);
        assert_eq!(line_end_inclusive(text, 7), 8);

        assert_eq!(line_ending(text), "\n");
        assert_eq!(line_ending("ab\r\ncd"), "\r\n");
    }
}
