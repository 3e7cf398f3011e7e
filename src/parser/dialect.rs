//! The two build-script dialects.
//!
//! They share the span and comment model; only quoting and invocation
//! syntax differ, which the printers below encapsulate.

use crate::graph::{ConfigurationName, DependencyTarget};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Kotlin script (`build.gradle.kts`).
    #[default]
    Typed,
    /// Groovy (`build.gradle`).
    Dynamic,
}

impl Dialect {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("kts") => Dialect::Typed,
            _ => Dialect::Dynamic,
        }
    }

    pub fn printer(&self) -> &'static dyn DialectPrinter {
        match self {
            Dialect::Typed => &KotlinScript,
            Dialect::Dynamic => &GroovyScript,
        }
    }
}

pub trait DialectPrinter: Send + Sync {
    fn line_comment(&self) -> &'static str {
        "//"
    }

    /// Comments out one line of code.
    fn render_comment(&self, code: &str) -> String {
        format!("{} {}", self.line_comment(), code)
    }

    /// The configuration token as it appears before the invocation arguments.
    fn render_configuration(&self, configuration: &ConfigurationName) -> String;

    /// A complete declaration statement without indentation.
    fn render_invocation(
        &self,
        configuration: &ConfigurationName,
        target: &DependencyTarget,
        test_fixtures: bool,
    ) -> String;
}

pub struct KotlinScript;

pub struct GroovyScript;

/// Version catalog aliases are written as bare accessors.
fn is_catalog_alias(target: &DependencyTarget) -> Option<String> {
    match target {
        DependencyTarget::External(coords) if coords.group.is_none() && coords.name.starts_with("libs.") => {
            Some(coords.name.clone())
        }
        _ => None,
    }
}

impl DialectPrinter for KotlinScript {
    fn render_configuration(&self, configuration: &ConfigurationName) -> String {
        if configuration.has_typed_accessor() {
            configuration.to_string()
        } else {
            format!("\"{}\"", configuration)
        }
    }

    fn render_invocation(
        &self,
        configuration: &ConfigurationName,
        target: &DependencyTarget,
        test_fixtures: bool,
    ) -> String {
        let argument = match target {
            DependencyTarget::Project(path) => format!("project(\"{}\")", path),
            DependencyTarget::External(coords) => {
                is_catalog_alias(target).unwrap_or_else(|| format!("\"{}\"", coords.notation()))
            }
        };
        let argument = if test_fixtures {
            format!("testFixtures({argument})")
        } else {
            argument
        };
        format!("{}({})", self.render_configuration(configuration), argument)
    }
}

impl DialectPrinter for GroovyScript {
    fn render_configuration(&self, configuration: &ConfigurationName) -> String {
        configuration.to_string()
    }

    fn render_invocation(
        &self,
        configuration: &ConfigurationName,
        target: &DependencyTarget,
        test_fixtures: bool,
    ) -> String {
        let argument = match target {
            DependencyTarget::Project(path) => format!("project('{}')", path),
            DependencyTarget::External(coords) => {
                is_catalog_alias(target).unwrap_or_else(|| format!("'{}'", coords.notation()))
            }
        };
        let argument = if test_fixtures {
            format!("testFixtures({argument})")
        } else {
            argument
        };
        format!("{} {}", self.render_configuration(configuration), argument)
    }
}
