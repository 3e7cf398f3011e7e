//! Unused Annotation Processor Rule
//!
//! A `kapt`, `ksp` or `annotationProcessor` declaration of a known code
//! generator when no source set that sees the declaration uses any of the
//! generator's trigger annotations.
//!
//! ## Example
//!
//! ```kotlin
//! dependencies {
//!     kapt("com.google.dagger:dagger-compiler:2.40")  // no @Inject, @Module, @Component...
//! }
//! ```
//!
//! Generators without a binding are never reported.

use super::{Rule, RuleContext, RulePhase};
use crate::analysis::{Finding, FindingName, FixAction, Usage};
use crate::config::CodeGeneratorBinding;
use crate::graph::{ConfiguredDependency, DependencyTarget};
use std::iter;

pub struct UnusedAnnotationProcessorRule {
    bindings: Vec<CodeGeneratorBinding>,
}

impl UnusedAnnotationProcessorRule {
    pub fn new(bindings: Vec<CodeGeneratorBinding>) -> Self {
        Self { bindings }
    }

    fn binding_for(&self, dependency: &ConfiguredDependency) -> Option<&CodeGeneratorBinding> {
        let DependencyTarget::External(coordinates) = &dependency.target else {
            return None;
        };
        let identifier = coordinates.identifier();
        self.bindings
            .iter()
            .find(|binding| binding.generator_coordinates == identifier)
    }

    /// The binding of `dependency` when it is a known generator none of
    /// whose annotations are used where the declaration is visible.
    pub(crate) fn unused_binding(
        &self,
        ctx: &RuleContext<'_>,
        dependency: &ConfiguredDependency,
    ) -> Option<&CodeGeneratorBinding> {
        if !dependency.configuration.is_annotation_processor() {
            return None;
        }
        let binding = self.binding_for(dependency)?;
        let project = ctx.project;
        let declaring = dependency.source_set();
        let usage = iter::once(declaring.clone())
            .chain(project.downstream_of(&declaring))
            .fold(Usage::NotReferenced, |acc, source_set| {
                if acc == Usage::Referenced {
                    return acc;
                }
                acc.or(ctx
                    .usages
                    .references_any(&project.path, &source_set, &binding.annotations))
            });
        (usage == Usage::NotReferenced).then_some(binding)
    }
}

impl Rule for UnusedAnnotationProcessorRule {
    fn name(&self) -> FindingName {
        FindingName::UnusedAnnotationProcessor
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Declarations
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for dependency in &ctx.project.dependencies {
            let Some(binding) = self.unused_binding(ctx, dependency) else {
                continue;
            };
            findings.push(
                ctx.finding(FindingName::UnusedAnnotationProcessor, dependency)
                    .with_message(format!(
                        "The annotation processor '{}' ({}) is declared but none of its annotations are used.",
                        dependency.target.identifier(),
                        binding.name,
                    ))
                    .with_fix(FixAction::Remove {
                        dependency: dependency.clone(),
                    }),
            );
        }
        findings
    }
}
