//! Total orders for `dependencies { }` and `plugins { }` statements.
//!
//! Both orders end in a comparison of the statement text, so sorting an
//! already sorted block reproduces it byte for byte.

use crate::error::{Error, Result};
use crate::graph::ConfigurationName;
use crate::parser::{Declaration, Statement};
use regex::Regex;

/// Compiles `patterns` anchored at the start of the statement.
fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(&format!("^(?:{pattern})"))
                .map_err(|e| Error::Config(format!("invalid sort pattern `{pattern}`: {e}")))
        })
        .collect()
}

fn first_match(patterns: &[Regex], text: &str) -> usize {
    patterns
        .iter()
        .position(|p| p.is_match(text))
        .unwrap_or(patterns.len())
}

/// Which blank-line separated group a declaration belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey {
    custom_rank: usize,
    testing_only: bool,
    kind_rank: u8,
    non_main: bool,
    source_set: String,
    configuration: String,
}

impl GroupKey {
    /// Statements that aren't declarations sort after every group.
    fn trailing() -> Self {
        Self {
            custom_rank: usize::MAX,
            testing_only: true,
            kind_rank: u8::MAX,
            non_main: true,
            source_set: String::new(),
            configuration: String::new(),
        }
    }
}

/// Position of a declaration inside its group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ItemKey {
    is_project: bool,
    identifier: String,
    text: String,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyOrdering {
    comparators: Vec<Regex>,
}

impl DependencyOrdering {
    pub fn new(patterns: &[String]) -> Result<Self> {
        Ok(Self {
            comparators: compile(patterns)?,
        })
    }

    pub fn group_key(&self, configuration: &ConfigurationName, statement_text: &str) -> GroupKey {
        let (source_set, kind) = configuration.parts();
        GroupKey {
            custom_rank: first_match(&self.comparators, statement_text.trim_start()),
            testing_only: source_set.is_testing_only(),
            kind_rank: kind.sort_rank(),
            non_main: !source_set.is_main(),
            source_set: source_set.to_string(),
            configuration: configuration.to_string(),
        }
    }

    pub fn item_key(&self, is_project: bool, identifier: &str, statement_text: &str) -> ItemKey {
        ItemKey {
            is_project,
            identifier: identifier.to_lowercase(),
            text: statement_text.to_string(),
        }
    }

    pub fn declaration_keys(&self, declaration: &Declaration, statement_text: &str) -> (GroupKey, ItemKey) {
        (
            self.group_key(&ConfigurationName::new(declaration.configuration.as_str()), statement_text),
            self.item_key(declaration.is_project(), declaration.target_identifier(), statement_text),
        )
    }

    /// Keys of any statement of a dependencies block.
    pub fn statement_keys(&self, statement: &Statement, text: &str) -> (GroupKey, ItemKey) {
        let code = statement.code_text(text);
        match &statement.declaration {
            Some(declaration) => self.declaration_keys(declaration, code),
            None => (GroupKey::trailing(), self.item_key(false, "", "")),
        }
    }
}

/// Ranks plugin statements by the first matching pattern, then by text.
#[derive(Debug, Clone)]
pub struct PluginOrdering {
    comparators: Vec<Regex>,
}

impl PluginOrdering {
    pub const DEFAULT_PATTERNS: [&'static str; 8] = [
        r#"id\("com\.android.*"\)"#,
        r#"id\("android-.*"\)"#,
        r#"id\("java-library"\)"#,
        r#"kotlin\("jvm"\)"#,
        r"android.*",
        r"javaLibrary.*",
        r"kotlin.*",
        r"id.*",
    ];

    pub fn new(patterns: &[String]) -> Result<Self> {
        Ok(Self {
            comparators: compile(patterns)?,
        })
    }

    pub fn key(&self, statement_text: &str) -> (usize, String) {
        let trimmed = statement_text.trim();
        (first_match(&self.comparators, trimmed), trimmed.to_string())
    }
}

impl Default for PluginOrdering {
    fn default() -> Self {
        let patterns: Vec<String> = Self::DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect();
        Self {
            comparators: compile(&patterns).unwrap_or_default(),
        }
    }
}
