//! Suppression markers.
//!
//! Two forms are recognised in either dialect:
//!
//! ```text
//! @Suppress("unused-dependency", "mustBeApi")
//! //noinspection unused-dependency, mustBeApi
//! ```
//!
//! Anything that doesn't parse cleanly is not a suppression. The names are
//! returned as written; alias resolution happens when findings are matched.

use regex::Regex;
use std::sync::OnceLock;

fn annotation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"@(?:file:)?Suppress\s*\((?P<args>[^()]*)\)").expect("valid suppress pattern")
    })
}

fn argument_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^\s*(?:"(?P<double>[^"]*)"|'(?P<single>[^']*)')\s*$"#)
            .expect("valid suppress argument pattern")
    })
}

fn noinspection_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*//\s*noinspection\s+(?P<names>.+?)\s*$").expect("valid noinspection pattern")
    })
}

/// Names listed by every `@Suppress(...)` annotation in `text`.
///
/// An annotation with any argument that isn't a plain string literal is
/// ignored as a whole.
pub fn parse_annotation(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for captures in annotation_pattern().captures_iter(text) {
        let Some(args) = captures.name("args") else {
            continue;
        };
        let args = args.as_str().trim();
        let args = args
            .strip_prefix("names")
            .and_then(|rest| rest.trim_start().strip_prefix('='))
            .map(|rest| rest.trim().trim_start_matches('[').trim_end_matches(']'))
            .unwrap_or(args);
        if args.trim().is_empty() {
            continue;
        }

        let parsed: Option<Vec<String>> = args
            .split(',')
            .map(|arg| {
                let c = argument_pattern().captures(arg)?;
                let name = c.name("double").or_else(|| c.name("single"))?.as_str().trim();
                (!name.is_empty()).then(|| name.to_string())
            })
            .collect();
        if let Some(parsed) = parsed {
            names.extend(parsed);
        }
    }
    names
}

/// Names listed by a `//noinspection a, b` comment line.
pub fn parse_noinspection(comment: &str) -> Vec<String> {
    let Some(captures) = noinspection_pattern().captures(comment) else {
        return Vec::new();
    };
    let Some(list) = captures.name("names") else {
        return Vec::new();
    };
    let names: Vec<&str> = list.as_str().split(',').map(str::trim).collect();
    let well_formed = names.iter().all(|name| {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
    });
    if !well_formed {
        return Vec::new();
    }
    names.into_iter().map(str::to_string).collect()
}

/// Both forms, scanned line by line.
pub fn parse_all(text: &str) -> Vec<String> {
    let mut names = parse_annotation(text);
    for line in text.lines() {
        names.extend(parse_noinspection(line));
    }
    names
}
