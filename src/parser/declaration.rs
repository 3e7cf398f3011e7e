//! Dependency declarations inside a `dependencies { }` block.
//!
//! Recognised shapes, in either dialect:
//!
//! ```text
//! api(project(":lib1"))                  api project(':lib1')
//! api(project(path = ":lib1"))           api project(path: ':lib1')
//! testImplementation(testFixtures(project(":lib1")))
//! implementation(projects.lib1)
//! "internalApi"("com.squareup:okio:3.0.0")
//! implementation(libs.okio) { because("...") }
//! ```

use super::lexer::Span;
use crate::graph::{ConfiguredDependency, DependencyTarget, MavenCoordinates, ProjectPath};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredTarget {
    ProjectPath(String),
    ProjectAccessor(String),
    Coordinates(String),
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub configuration: String,
    /// The configuration token, quotes included.
    pub configuration_span: Span,
    pub quoted: bool,
    pub target: DeclaredTarget,
    /// The path, accessor or coordinates text, without quotes.
    pub target_span: Option<Span>,
    pub test_fixtures: bool,
    /// A configuration lambda follows the invocation.
    pub has_trailing_block: bool,
}

impl Declaration {
    /// Whether this declaration is the textual form of `dependency`.
    pub fn matches(&self, dependency: &ConfiguredDependency) -> bool {
        self.configuration == dependency.configuration.as_str()
            && self.test_fixtures == dependency.test_fixtures
            && self.target_matches(&dependency.target)
    }

    pub fn target_matches(&self, target: &DependencyTarget) -> bool {
        match (&self.target, target) {
            (DeclaredTarget::ProjectPath(path), DependencyTarget::Project(expected)) => {
                ProjectPath::new(path.as_str()) == *expected
            }
            (DeclaredTarget::ProjectAccessor(accessor), DependencyTarget::Project(expected)) => {
                *accessor == expected.typesafe_accessor()
            }
            (DeclaredTarget::Coordinates(notation), DependencyTarget::External(expected)) => {
                MavenCoordinates::parse(notation).identifier() == expected.identifier()
            }
            (DeclaredTarget::Other(text), DependencyTarget::External(expected)) => {
                expected.group.is_none() && expected.name == *text
            }
            _ => false,
        }
    }

    /// Identifier used for sorting: the project path or notation as written.
    pub fn target_identifier(&self) -> &str {
        match &self.target {
            DeclaredTarget::ProjectPath(s)
            | DeclaredTarget::ProjectAccessor(s)
            | DeclaredTarget::Coordinates(s)
            | DeclaredTarget::Other(s) => s,
        }
    }

    pub fn is_project(&self) -> bool {
        matches!(
            self.target,
            DeclaredTarget::ProjectPath(_) | DeclaredTarget::ProjectAccessor(_)
        )
    }

    /// The graph-level target, resolving type-safe accessors through `accessor_lookup`.
    pub fn to_target(&self, accessor_lookup: impl Fn(&str) -> Option<ProjectPath>) -> Option<DependencyTarget> {
        match &self.target {
            DeclaredTarget::ProjectPath(path) => Some(DependencyTarget::project(path.as_str())),
            DeclaredTarget::ProjectAccessor(accessor) => accessor_lookup(accessor).map(DependencyTarget::Project),
            DeclaredTarget::Coordinates(notation) => Some(DependencyTarget::external(notation)),
            DeclaredTarget::Other(_) => None,
        }
    }
}

fn configuration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^(?:"(?P<quoted>[A-Za-z_][A-Za-z0-9_]*)"|(?P<bare>[A-Za-z_][A-Za-z0-9_]*))"#)
            .expect("valid configuration pattern")
    })
}

fn test_fixtures_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^testFixtures\s*\(").expect("valid testFixtures pattern")
    })
}

fn project_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^project\s*\(\s*(?:path\s*[=:]\s*)?["'](?P<path>[^"']+)["']"#)
            .expect("valid project pattern")
    })
}

fn accessor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<accessor>(?:projects|libs)(?:\.[A-Za-z_][A-Za-z0-9_]*)+)")
            .expect("valid accessor pattern")
    })
}

fn string_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"^["'](?P<value>[^"']*)["']"#).expect("valid string pattern"))
}

/// Names that open nested blocks or call helpers rather than declare.
const NOT_CONFIGURATIONS: [&str; 6] = ["constraints", "add", "components", "modules", "if", "val"];

/// Parses `code` (one statement, annotations stripped) located at `offset`.
pub fn parse_declaration(code: &str, offset: usize) -> Option<Declaration> {
    let captures = configuration_pattern().captures(code)?;
    let (name, quoted) = match (captures.name("quoted"), captures.name("bare")) {
        (Some(q), _) => (q.as_str(), true),
        (None, Some(b)) => (b.as_str(), false),
        _ => return None,
    };
    if NOT_CONFIGURATIONS.contains(&name) {
        return None;
    }
    let token_end = captures.get(0)?.end();
    let rest = &code[token_end..];
    let rest_trimmed = rest.trim_start();
    let mut args_start = token_end + (rest.len() - rest_trimmed.len());

    let (args_end, has_trailing_block) = if rest_trimmed.starts_with('(') {
        let close = matching_paren(code, args_start)?;
        let after = code[close + 1..].trim_start();
        args_start += 1;
        (close, after.starts_with('{'))
    } else {
        if token_end == args_start || rest_trimmed.is_empty() || rest_trimmed.starts_with(['{', '=', '.']) {
            // `api` alone, `constraints {`, `x = y` and chained calls aren't declarations.
            return None;
        }
        match rest_trimmed.find('{') {
            Some(brace) => (args_start + brace, true),
            None => (code.len(), false),
        }
    };

    let raw_args = &code[args_start..args_end];
    let leading = raw_args.len() - raw_args.trim_start().len();
    let mut inner_start = args_start + leading;
    let mut inner = raw_args.trim();

    let mut test_fixtures = false;
    if let Some(m) = test_fixtures_pattern().find(inner) {
        let open = inner_start + m.end() - 1;
        let close = matching_paren(code, open)?;
        test_fixtures = true;
        let wrapped = &code[open + 1..close];
        inner_start = open + 1 + (wrapped.len() - wrapped.trim_start().len());
        inner = wrapped.trim();
    }

    let (target, target_span) = if let Some(c) = project_pattern().captures(inner) {
        let path = c.name("path")?;
        (
            DeclaredTarget::ProjectPath(path.as_str().to_string()),
            Some(Span::new(inner_start + path.start(), inner_start + path.end())),
        )
    } else if let Some(c) = accessor_pattern().captures(inner) {
        let accessor = c.name("accessor")?;
        let target = if accessor.as_str().starts_with("projects.") {
            DeclaredTarget::ProjectAccessor(accessor.as_str().to_string())
        } else {
            DeclaredTarget::Coordinates(accessor.as_str().to_string())
        };
        (
            target,
            Some(Span::new(inner_start + accessor.start(), inner_start + accessor.end())),
        )
    } else if let Some(c) = string_pattern().captures(inner) {
        let value = c.name("value")?;
        (
            DeclaredTarget::Coordinates(value.as_str().to_string()),
            Some(Span::new(inner_start + value.start(), inner_start + value.end())),
        )
    } else {
        (DeclaredTarget::Other(inner.to_string()), None)
    };

    Some(Declaration {
        configuration: name.to_string(),
        configuration_span: Span::new(offset, offset + token_end),
        quoted,
        target,
        target_span: target_span.map(|s| Span::new(offset + s.start, offset + s.end)),
        test_fixtures,
        has_trailing_block,
    })
}

/// Index of the `)` closing the `(` at `open`, skipping quoted text.
fn matching_paren(code: &str, open: usize) -> Option<usize> {
    let bytes = code.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        match (quote, b) {
            (Some(_), b'\\') => i += 1,
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'(') => depth += 1,
            (None, b')') => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            (None, _) => {}
        }
        i += 1;
    }
    None
}
