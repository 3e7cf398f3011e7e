//! Plugin ids of `plugins { }` statements.
//!
//! ```text
//! kotlin("kapt")                        -> org.jetbrains.kotlin.kapt
//! id("kotlin-kapt")                     -> org.jetbrains.kotlin.kapt
//! id 'com.android.library'              -> com.android.library
//! `kotlin-kapt`                         -> org.jetbrains.kotlin.kapt
//! id("io.gitlab.arturbosch.detekt") version "1.21.0" apply false
//! ```
//!
//! `kotlin-<name>` legacy ids are folded into `org.jetbrains.kotlin.<name>`
//! so every spelling of a Kotlin plugin compares equal.

use regex::Regex;
use std::sync::OnceLock;

pub const KOTLIN_PLUGIN_PREFIX: &str = "org.jetbrains.kotlin.";

fn plugin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?s)^(?:(?P<function>id|kotlin)\s*\(?\s*["'](?P<argument>[^"']+)["']\s*\)?|`(?P<accessor>[\w.-]+)`|(?P<bare>[A-Za-z_][\w.]*))(?P<rest>.*)$"#,
        )
        .expect("valid plugin pattern")
    })
}

fn apply_false_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\bapply\s*\(?\s*false\b").expect("valid apply pattern"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDeclaration {
    /// Canonical id.
    pub id: String,
    /// False for `apply false` declarations.
    pub applied: bool,
}

/// Canonical form of a plugin id as written.
pub fn canonical_plugin_id(written: &str) -> String {
    match written.strip_prefix("kotlin-") {
        Some(name) => format!("{KOTLIN_PLUGIN_PREFIX}{name}"),
        None if written == "kapt" => format!("{KOTLIN_PLUGIN_PREFIX}kapt"),
        None => written.to_string(),
    }
}

/// The plugin a `plugins { }` statement applies, if it has a recognisable
/// shape.
pub fn parse_plugin(code: &str) -> Option<PluginDeclaration> {
    let code = code.trim();
    let captures = plugin_pattern().captures(code)?;
    let rest = captures.name("rest").map_or("", |r| r.as_str());
    let id = if let Some(argument) = captures.name("argument") {
        match captures.name("function").map(|f| f.as_str()) {
            Some("kotlin") => format!("{KOTLIN_PLUGIN_PREFIX}{}", argument.as_str()),
            _ => canonical_plugin_id(argument.as_str()),
        }
    } else if let Some(accessor) = captures.name("accessor") {
        canonical_plugin_id(accessor.as_str())
    } else {
        // A bare name followed by arguments is some other call.
        if rest.trim_start().starts_with('(') {
            return None;
        }
        canonical_plugin_id(captures.name("bare")?.as_str())
    };
    Some(PluginDeclaration {
        id,
        applied: !apply_false_pattern().is_match(rest),
    })
}
