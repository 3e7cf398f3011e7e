//! Byte classification for build scripts.
//!
//! Both dialects share C-style comments and quote-delimited strings, which
//! is all the scanner needs to tell structure apart from text that merely
//! looks like structure (`"}"`, `// dependencies {`).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Code,
    LineComment,
    BlockComment,
    Str,
}

impl CharClass {
    pub fn is_comment(self) -> bool {
        matches!(self, CharClass::LineComment | CharClass::BlockComment)
    }
}

/// A half-open byte range into the file text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty_at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

pub struct Lexed<'t> {
    text: &'t str,
    classes: Vec<CharClass>,
}

impl<'t> Lexed<'t> {
    pub fn new(text: &'t str) -> Self {
        let bytes = text.as_bytes();
        let mut classes = vec![CharClass::Code; bytes.len()];
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    let end = find_byte(bytes, i, b'\n').unwrap_or(bytes.len());
                    classes[i..end].fill(CharClass::LineComment);
                    i = end;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    let end = find_seq(bytes, i + 2, b"*/").map_or(bytes.len(), |p| p + 2);
                    classes[i..end].fill(CharClass::BlockComment);
                    i = end;
                }
                quote @ (b'"' | b'\'') => {
                    let end = string_end(bytes, i, quote);
                    classes[i..end].fill(CharClass::Str);
                    i = end;
                }
                _ => i += 1,
            }
        }

        Self { text, classes }
    }

    pub fn text(&self) -> &'t str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class(&self, offset: usize) -> CharClass {
        self.classes[offset]
    }

    pub fn is_code(&self, offset: usize) -> bool {
        self.classes.get(offset) == Some(&CharClass::Code)
    }

    /// End of the comment region starting at `offset`.
    pub fn comment_end(&self, offset: usize) -> usize {
        let class = self.classes[offset];
        let mut end = offset;
        while end < self.classes.len() && self.classes[end] == class {
            end += 1;
            // Adjacent block comments are separate regions.
            if class == CharClass::BlockComment
                && end >= 2
                && &self.text.as_bytes()[end - 2..end] == b"*/"
            {
                break;
            }
        }
        end
    }

    /// Offset of the brace closing the one at `open`, skipping strings and
    /// comments.
    pub fn matching_brace(&self, open: usize) -> Option<usize> {
        let bytes = self.text.as_bytes();
        let mut depth = 0usize;
        for (offset, byte) in bytes.iter().enumerate().skip(open) {
            if !self.is_code(offset) {
                continue;
            }
            match byte {
                b'{' => depth += 1,
                b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(offset);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..].iter().position(|b| *b == needle).map(|p| p + from)
}

fn find_seq(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Exclusive end of the string literal opening at `start`. Single-quoted
/// and double-quoted literals stop at an unescaped quote or at the end of
/// the line; triple-quoted literals may span lines.
fn string_end(bytes: &[u8], start: usize, quote: u8) -> usize {
    let triple = [quote, quote, quote];
    if bytes[start..].starts_with(&triple) {
        return find_seq(bytes, start + 3, &triple).map_or(bytes.len(), |p| p + 3);
    }
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Line starts of a text, for offset <-> (line, column) conversion.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    /// Zero-based line of `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.starts[line]
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}
