//! Rule selection and the opt-in rules, run against scratch workspaces.

mod common;

use common::{report_only, settings, TestWorkspace};
use moduleaudit::analysis::{FindingName, RulePhase, RuleSet};
use moduleaudit::config::{CodeGeneratorBinding, Settings};
use moduleaudit::error::Error;

fn with_checks(base: Settings, configure: impl FnOnce(&mut Settings)) -> Settings {
    let mut settings = base;
    configure(&mut settings);
    settings
}

mod selection {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = RuleSet::from_settings(&Settings::default()).unwrap();
        assert_eq!(rules.rules().len(), 6);
        assert_eq!(rules.in_phase(RulePhase::Declarations).count(), 5);
        assert_eq!(rules.in_phase(RulePhase::Inheritance).count(), 1);
        assert_eq!(rules.in_phase(RulePhase::Formatting).count(), 0);
    }

    #[test]
    fn test_every_rule_enabled() {
        let settings = with_checks(Settings::default(), |s| {
            s.checks.redundant = true;
            s.checks.sort_dependencies = true;
            s.checks.sort_plugins = true;
        });
        let rules = RuleSet::from_settings(&settings).unwrap();
        assert_eq!(rules.rules().len(), 9);
        assert_eq!(rules.in_phase(RulePhase::Formatting).count(), 2);
    }

    #[test]
    fn test_nothing_enabled() {
        let settings = with_checks(Settings::default(), |s| {
            s.checks.unused = false;
            s.checks.overshot = false;
            s.checks.must_be_api = false;
            s.checks.inherited = false;
            s.checks.unused_annotation_processor = false;
            s.checks.unused_kapt_plugin = false;
        });
        assert!(RuleSet::from_settings(&settings).unwrap().is_empty());
    }

    #[test]
    fn test_bad_comparator_fails_sorting_rules() {
        let settings = with_checks(Settings::default(), |s| {
            s.checks.sort_dependencies = true;
            s.sort.dependency_comparators = vec!["(".into()];
        });
        assert!(matches!(RuleSet::from_settings(&settings), Err(Error::Config(_))));
    }

    #[test]
    fn test_finding_names_and_aliases() {
        assert_eq!(FindingName::from_name("unused-dependency"), Some(FindingName::UnusedDependency));
        assert_eq!(FindingName::from_name("overShot"), Some(FindingName::OvershotDependency));
        assert_eq!(FindingName::from_name("Must Be Api"), Some(FindingName::MustBeApi));
        assert_eq!(
            FindingName::from_name("inheritedImplementation"),
            Some(FindingName::InheritedDependency)
        );
        assert_eq!(
            FindingName::from_name("unusedKapt"),
            Some(FindingName::UnusedAnnotationProcessor)
        );
        assert_eq!(
            FindingName::from_name("unusedKaptPlugin"),
            Some(FindingName::UnusedKaptPlugin)
        );
        assert_eq!(FindingName::from_name("bogus"), None);

        let mut codes: Vec<&str> = FindingName::ALL.iter().map(|n| n.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), FindingName::ALL.len());
        assert!(FindingName::ProjectDepth.is_report_only());
        assert!(!FindingName::UnusedDependency.is_report_only());
    }
}

mod redundant {
    use super::*;

    fn workspace() -> TestWorkspace {
        TestWorkspace::new()
            .project(":lib1", "")
            .exports(":lib1", "main", &["com.example.lib1.Lib1Class"])
            .project(":lib2", "dependencies {\n  api(project(\":lib1\"))\n}\n")
            .exports(":lib2", "main", &["com.example.lib2.Lib2Class"])
            .public_references(":lib2", "main", &["com.example.lib1.Lib1Class"])
            .project(
                ":app",
                "dependencies {\n  api(project(\":lib1\"))\n  api(project(\":lib2\"))\n}\n",
            )
            .public_references(":app", "main", &["com.example.lib2.Lib2Class"])
    }

    fn redundant_only(base: Settings) -> Settings {
        with_checks(base, |s| {
            s.checks.redundant = true;
            s.checks.unused = false;
        })
    }

    #[test]
    fn test_api_declaration_already_provided() {
        let workspace = workspace();
        let (_, outcome) = workspace.run(&redundant_only(report_only()));

        assert_eq!(outcome.issue_count(), 1);
        let finding = &outcome.findings[0];
        assert_eq!(finding.name, FindingName::RedundantDependency);
        assert_eq!(finding.project.as_str(), ":app");
        assert_eq!(finding.dependency_identifier, ":lib1");
        assert_eq!(finding.source.as_deref(), Some(":lib2"));
    }

    #[test]
    fn test_redundant_declaration_is_commented_out() {
        let workspace = workspace();
        let (_, outcome) = workspace.run(&redundant_only(settings()));

        assert_eq!(outcome.fixed_count(), 1);
        assert_eq!(
            workspace.build_file(":app"),
            "dependencies {\n  // api(project(\":lib1\"))  // ModuleAudit finding [redundant-dependency]\n  api(project(\":lib2\"))\n}\n"
        );
    }

    #[test]
    fn test_used_declaration_is_not_redundant() {
        let workspace = workspace().public_references(
            ":app",
            "main",
            &["com.example.lib1.Lib1Class", "com.example.lib2.Lib2Class"],
        );
        let (_, outcome) = workspace.run(&redundant_only(report_only()));
        assert!(outcome.findings.is_empty());
    }
}

mod annotation_processors {
    use super::*;

    const DAGGER: &str = "dependencies {\n  kapt(\"com.google.dagger:dagger-compiler:2.40\")\n}\n";

    #[test]
    fn test_unused_processor() {
        let workspace = TestWorkspace::new()
            .project(":app", DAGGER)
            .references(":app", "main", &["kotlin.String"]);
        let (_, outcome) = workspace.run(&report_only());

        assert_eq!(outcome.issue_count(), 1);
        let finding = &outcome.findings[0];
        assert_eq!(finding.name, FindingName::UnusedAnnotationProcessor);
        assert_eq!(finding.dependency_identifier, "com.google.dagger:dagger-compiler");
        assert!(finding.message.contains("Dagger"));
    }

    #[test]
    fn test_trigger_annotation_keeps_processor() {
        let workspace = TestWorkspace::new()
            .project(":app", DAGGER)
            .references(":app", "main", &["dagger.Module"]);
        let (_, outcome) = workspace.run(&report_only());
        assert!(outcome.findings.is_empty());
    }

    #[test]
    fn test_configured_generator() {
        let workspace = TestWorkspace::new()
            .project(":app", "dependencies {\n  ksp(\"com.example:processor:1.0\")\n}\n")
            .references(":app", "main", &["kotlin.String"]);

        let (_, unconfigured) = workspace.run(&report_only());
        assert!(unconfigured.findings.is_empty());

        let settings = with_checks(report_only(), |s| {
            s.additional_code_generators = vec![CodeGeneratorBinding::new(
                "Custom",
                "com.example:processor",
                &["com.example.Generate"],
            )];
        });
        let (_, configured) = workspace.run(&settings);
        assert_eq!(configured.issue_count(), 1);
        assert_eq!(configured.findings[0].name, FindingName::UnusedAnnotationProcessor);
    }
}

mod kapt_plugin {
    use super::*;

    const KAPT_APP: &str = "plugins {\n  kotlin(\"jvm\")\n  kotlin(\"kapt\")\n}\n\ndependencies {\n  kapt(\"com.google.dagger:dagger-compiler:2.40\")\n}\n";

    #[test]
    fn test_plugin_goes_with_its_last_processor() {
        let workspace = TestWorkspace::new()
            .project(":app", KAPT_APP)
            .references(":app", "main", &["kotlin.String"]);
        let (_, outcome) = workspace.run(&report_only());

        let mut names: Vec<FindingName> = outcome.findings.iter().map(|f| f.name).collect();
        names.sort();
        assert_eq!(
            names,
            vec![FindingName::UnusedAnnotationProcessor, FindingName::UnusedKaptPlugin]
        );
        let plugin = outcome
            .findings
            .iter()
            .find(|f| f.name == FindingName::UnusedKaptPlugin)
            .unwrap();
        assert_eq!(plugin.dependency_identifier, "org.jetbrains.kotlin.kapt");
        assert_eq!(plugin.position.map(|p| p.line), Some(3));
    }

    #[test]
    fn test_plugin_and_processor_are_deleted() {
        let workspace = TestWorkspace::new()
            .project(":app", KAPT_APP)
            .references(":app", "main", &["kotlin.String"]);
        let settings = with_checks(settings(), |s| s.delete_unused = true);
        let (_, outcome) = workspace.run(&settings);

        assert_eq!(outcome.fixed_count(), 2);
        assert_eq!(
            workspace.build_file(":app"),
            "plugins {\n  kotlin(\"jvm\")\n}\n\ndependencies {\n}\n"
        );
        let (_, second) = workspace.run(&settings);
        assert!(second.findings.is_empty());
    }

    #[test]
    fn test_used_processor_keeps_plugin() {
        let workspace = TestWorkspace::new()
            .project(":app", KAPT_APP)
            .references(":app", "main", &["dagger.Module"]);
        let (_, outcome) = workspace.run(&report_only());
        assert!(outcome.findings.is_empty());
    }

    #[test]
    fn test_suppressed_plugin() {
        let text = KAPT_APP.replace("  kotlin(\"kapt\")", "  @Suppress(\"unusedKaptPlugin\")\n  kotlin(\"kapt\")");
        let workspace = TestWorkspace::new()
            .project(":app", &text)
            .references(":app", "main", &["kotlin.String"]);
        let (_, outcome) = workspace.run(&report_only());

        let names: Vec<FindingName> = outcome.findings.iter().map(|f| f.name).collect();
        assert_eq!(names, vec![FindingName::UnusedAnnotationProcessor]);
    }
}

mod sorting {
    use super::*;

    const UNSORTED: &str = "plugins {\n  kotlin(\"jvm\")\n  id(\"com.android.library\")\n}\n\ndependencies {\n  testImplementation(\"junit:junit:4.13.2\")\n  implementation(\"com.example:ext:1.0\")\n  api(\"com.squareup:okio:3.0.0\")\n}\n";

    fn sorting(base: Settings) -> Settings {
        with_checks(base, |s| {
            s.checks.sort_dependencies = true;
            s.checks.sort_plugins = true;
        })
    }

    #[test]
    fn test_unsorted_blocks_are_reported_once_each() {
        let workspace = TestWorkspace::new().project(":lib", UNSORTED);
        let (_, outcome) = workspace.run(&sorting(report_only()));

        let mut names: Vec<FindingName> = outcome.findings.iter().map(|f| f.name).collect();
        names.sort();
        assert_eq!(names, vec![FindingName::SortDependencies, FindingName::SortPlugins]);
        assert_eq!(workspace.build_file(":lib"), UNSORTED);
    }

    #[test]
    fn test_blocks_are_sorted_in_place() {
        let workspace = TestWorkspace::new().project(":lib", UNSORTED);
        let (_, outcome) = workspace.run(&sorting(settings()));

        assert_eq!(outcome.fixed_count(), 2);
        assert_eq!(
            workspace.build_file(":lib"),
            "plugins {\n  id(\"com.android.library\")\n  kotlin(\"jvm\")\n}\n\ndependencies {\n  api(\"com.squareup:okio:3.0.0\")\n\n  implementation(\"com.example:ext:1.0\")\n\n  testImplementation(\"junit:junit:4.13.2\")\n}\n"
        );

        let (_, second) = workspace.run(&sorting(settings()));
        assert!(second.findings.is_empty());
    }
}
