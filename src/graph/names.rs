//! Source set and configuration names.
//!
//! Every configuration name maps to exactly one source set and one role.
//! The mapping is total: names that don't follow the Gradle conventions
//! fall back to an implementation-like configuration of `main`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named partition of a project's code (`main`, `test`, `debug`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceSetName(String);

impl SourceSetName {
    pub const MAIN: &'static str = "main";
    pub const TEST: &'static str = "test";
    pub const TEST_FIXTURES: &'static str = "testFixtures";
    pub const ANDROID_TEST: &'static str = "androidTest";
    pub const DEBUG: &'static str = "debug";
    pub const RELEASE: &'static str = "release";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn main() -> Self {
        Self::new(Self::MAIN)
    }

    pub fn test() -> Self {
        Self::new(Self::TEST)
    }

    pub fn test_fixtures() -> Self {
        Self::new(Self::TEST_FIXTURES)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_main(&self) -> bool {
        self.0 == Self::MAIN
    }

    pub fn is_test_fixtures(&self) -> bool {
        self.0.to_ascii_lowercase().starts_with("testfixtures")
    }

    /// `test*` and `androidTest*` source sets never publish anything to
    /// consumers, so they have no api-like configuration.
    pub fn is_testing_only(&self) -> bool {
        if self.is_test_fixtures() {
            return false;
        }
        let lower = self.0.to_ascii_lowercase();
        lower.starts_with("test") || lower.starts_with("androidtest")
    }

    /// `debug` -> `Debug`, used when building prefixed configuration names.
    pub fn capitalized(&self) -> String {
        capitalize(&self.0)
    }
}

impl fmt::Display for SourceSetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceSetName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Whether a declaration's exports propagate to consumers of the declaring project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    ApiLike,
    ImplementationLike,
}

/// The base bucket a configuration name is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigurationKind {
    Api,
    Implementation,
    CompileOnlyApi,
    CompileOnly,
    RuntimeOnly,
    /// Legacy `compile`, transitively exposed like `api`.
    Compile,
    /// Legacy `runtime`.
    Runtime,
    AnnotationProcessor,
    Kapt,
    Ksp,
    /// Anything that isn't a conventional dependency configuration.
    Other,
}

impl ConfigurationKind {
    /// Kinds recognised as a capitalized suffix, longest first so that
    /// `CompileOnlyApi` wins over `Api`.
    const SUFFIXES: [(&'static str, ConfigurationKind); 8] = [
        ("AnnotationProcessor", ConfigurationKind::AnnotationProcessor),
        ("CompileOnlyApi", ConfigurationKind::CompileOnlyApi),
        ("Implementation", ConfigurationKind::Implementation),
        ("CompileOnly", ConfigurationKind::CompileOnly),
        ("RuntimeOnly", ConfigurationKind::RuntimeOnly),
        ("Compile", ConfigurationKind::Compile),
        ("Runtime", ConfigurationKind::Runtime),
        ("Api", ConfigurationKind::Api),
    ];

    pub fn base_name(&self) -> &'static str {
        match self {
            ConfigurationKind::Api => "api",
            ConfigurationKind::Implementation => "implementation",
            ConfigurationKind::CompileOnlyApi => "compileOnlyApi",
            ConfigurationKind::CompileOnly => "compileOnly",
            ConfigurationKind::RuntimeOnly => "runtimeOnly",
            ConfigurationKind::Compile => "compile",
            ConfigurationKind::Runtime => "runtime",
            ConfigurationKind::AnnotationProcessor => "annotationProcessor",
            ConfigurationKind::Kapt => "kapt",
            ConfigurationKind::Ksp => "ksp",
            ConfigurationKind::Other => "",
        }
    }

    pub fn role(&self) -> Role {
        match self {
            ConfigurationKind::Api | ConfigurationKind::CompileOnlyApi | ConfigurationKind::Compile => {
                Role::ApiLike
            }
            _ => Role::ImplementationLike,
        }
    }

    pub fn is_annotation_processor(&self) -> bool {
        matches!(
            self,
            ConfigurationKind::AnnotationProcessor | ConfigurationKind::Kapt | ConfigurationKind::Ksp
        )
    }

    /// Rank used by the default dependency sort: api-like, then
    /// implementation-like, then compile-only, then runtime-only.
    pub fn sort_rank(&self) -> u8 {
        match self {
            ConfigurationKind::Api | ConfigurationKind::Compile => 0,
            ConfigurationKind::Implementation => 1,
            ConfigurationKind::CompileOnlyApi | ConfigurationKind::CompileOnly => 2,
            ConfigurationKind::RuntimeOnly | ConfigurationKind::Runtime => 3,
            ConfigurationKind::AnnotationProcessor
            | ConfigurationKind::Kapt
            | ConfigurationKind::Ksp => 4,
            ConfigurationKind::Other => 5,
        }
    }

    fn from_exact(name: &str) -> Option<Self> {
        let kind = match name {
            "api" => ConfigurationKind::Api,
            "implementation" => ConfigurationKind::Implementation,
            "compileOnlyApi" => ConfigurationKind::CompileOnlyApi,
            "compileOnly" => ConfigurationKind::CompileOnly,
            "runtimeOnly" => ConfigurationKind::RuntimeOnly,
            "compile" => ConfigurationKind::Compile,
            "runtime" => ConfigurationKind::Runtime,
            "annotationProcessor" => ConfigurationKind::AnnotationProcessor,
            "kapt" => ConfigurationKind::Kapt,
            "ksp" => ConfigurationKind::Ksp,
            _ => return None,
        };
        Some(kind)
    }
}

/// A named dependency bucket such as `api`, `debugImplementation` or `kaptTest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationName(String);

impl ConfigurationName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn api() -> Self {
        Self::new("api")
    }

    pub fn implementation() -> Self {
        Self::new("implementation")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the configuration of `kind` for `source_set`.
    pub fn for_source_set(source_set: &SourceSetName, kind: ConfigurationKind) -> Self {
        if kind == ConfigurationKind::Other {
            return Self::implementation().switch_source_set_kind(source_set);
        }
        let base = kind.base_name();
        if source_set.is_main() {
            return Self::new(base);
        }
        match kind {
            ConfigurationKind::Kapt | ConfigurationKind::Ksp => {
                Self::new(format!("{}{}", base, source_set.capitalized()))
            }
            _ => Self::new(format!("{}{}", source_set.as_str(), capitalize(base))),
        }
    }

    fn switch_source_set_kind(&self, source_set: &SourceSetName) -> Self {
        Self::for_source_set(source_set, self.kind())
    }

    /// Splits the name into its source set and base kind.
    pub fn parts(&self) -> (SourceSetName, ConfigurationKind) {
        let name = self.0.as_str();

        if let Some(kind) = ConfigurationKind::from_exact(name) {
            return (SourceSetName::main(), kind);
        }

        for (prefix, kind) in [("kapt", ConfigurationKind::Kapt), ("ksp", ConfigurationKind::Ksp)] {
            if let Some(rest) = name.strip_prefix(prefix) {
                if rest.starts_with(|c: char| c.is_ascii_uppercase()) {
                    return (SourceSetName::new(decapitalize(rest)), kind);
                }
            }
        }

        for (suffix, kind) in ConfigurationKind::SUFFIXES {
            if let Some(prefix) = name.strip_suffix(suffix) {
                if !prefix.is_empty() {
                    return (SourceSetName::new(prefix), kind);
                }
            }
        }

        (SourceSetName::main(), ConfigurationKind::Other)
    }

    pub fn source_set(&self) -> SourceSetName {
        self.parts().0
    }

    pub fn kind(&self) -> ConfigurationKind {
        self.parts().1
    }

    pub fn role(&self) -> Role {
        self.kind().role()
    }

    pub fn is_api(&self) -> bool {
        self.role() == Role::ApiLike
    }

    pub fn is_annotation_processor(&self) -> bool {
        self.kind().is_annotation_processor()
    }

    /// The same kind of configuration, declared on another source set.
    pub fn switch_source_set(&self, source_set: &SourceSetName) -> Self {
        self.switch_source_set_kind(source_set)
    }

    /// `implementation` -> `api`, `debugImplementation` -> `debugApi`.
    ///
    /// Testing-only source sets have no api configuration, so their
    /// implementation configuration is returned instead.
    pub fn api_variant(&self) -> Self {
        let source_set = self.source_set();
        if source_set.is_testing_only() {
            return Self::for_source_set(&source_set, ConfigurationKind::Implementation);
        }
        Self::for_source_set(&source_set, ConfigurationKind::Api)
    }

    pub fn implementation_variant(&self) -> Self {
        Self::for_source_set(&self.source_set(), ConfigurationKind::Implementation)
    }

    /// True when the Kotlin DSL generates a typed accessor for this name,
    /// i.e. it doesn't need to be written as a string invocation.
    pub fn has_typed_accessor(&self) -> bool {
        let (source_set, kind) = self.parts();
        if kind == ConfigurationKind::Other {
            return true;
        }
        const BUILT_IN: [&str; 12] = [
            "main",
            "test",
            "testFixtures",
            "androidTest",
            "debug",
            "release",
            "testDebug",
            "testRelease",
            "androidTestDebug",
            "androidTestRelease",
            "kapt",
            "ksp",
        ];
        BUILT_IN.contains(&source_set.as_str())
    }
}

impl fmt::Display for ConfigurationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConfigurationName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ConfigurationName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

pub(crate) fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn decapitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
