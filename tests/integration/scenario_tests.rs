//! End-to-end scenarios: snapshot in, findings out, build files rewritten.

mod common;

use common::{report_only, settings, TestWorkspace};
use moduleaudit::analysis::FindingName;
use moduleaudit::config::Settings;
use moduleaudit::error::Error;
use moduleaudit::graph::{ProjectPath, SourceSetName};
use serde_json::json;

fn libraries(workspace: TestWorkspace) -> TestWorkspace {
    workspace
        .project(":lib1", "")
        .exports(":lib1", "main", &["com.example.lib1.Lib1Class"])
        .project(":lib2", "")
        .exports(":lib2", "main", &["com.example.lib2.Lib2Class"])
}

mod unused {
    use super::*;

    #[test]
    fn test_unused_dependency_is_commented_out() {
        let workspace = libraries(TestWorkspace::new())
            .project(
                ":app",
                "dependencies {\n  implementation(project(\":lib1\"))\n  implementation(project(\":lib2\"))\n}\n",
            )
            .references(":app", "main", &["com.example.lib2.Lib2Class"]);

        let (workspace_state, outcome) = workspace.run(&settings());

        assert_eq!(outcome.issue_count(), 1);
        assert_eq!(outcome.fixed_count(), 1);
        assert!(outcome.is_success(true));
        assert_eq!(outcome.findings[0].name, FindingName::UnusedDependency);
        assert_eq!(outcome.findings[0].dependency_identifier, ":lib1");

        assert_eq!(
            workspace.build_file(":app"),
            "dependencies {\n  // implementation(project(\":lib1\"))  // ModuleAudit finding [unused-dependency]\n  implementation(project(\":lib2\"))\n}\n"
        );
        let app = workspace_state.graph.project(&ProjectPath::new(":app")).unwrap();
        assert_eq!(app.dependencies.len(), 1);
    }

    #[test]
    fn test_delete_unused_removes_the_statement() {
        let workspace = libraries(TestWorkspace::new())
            .project(
                ":app",
                "dependencies {\n  implementation(project(\":lib1\"))\n  implementation(project(\":lib2\"))\n}\n",
            )
            .references(":app", "main", &["com.example.lib2.Lib2Class"]);

        let settings = Settings {
            delete_unused: true,
            ..Settings::default()
        };
        workspace.run(&settings);

        assert_eq!(
            workspace.build_file(":app"),
            "dependencies {\n  implementation(project(\":lib2\"))\n}\n"
        );
    }

    #[test]
    fn test_report_only_leaves_files_alone() {
        let text = "dependencies {\n  implementation(project(\":lib1\"))\n}\n";
        let workspace = libraries(TestWorkspace::new()).project(":app", text);

        let (_, outcome) = workspace.run(&report_only());

        assert_eq!(outcome.issue_count(), 1);
        assert!(!outcome.findings[0].fixed);
        assert!(!outcome.is_success(false));
        assert_eq!(workspace.build_file(":app"), text);
    }

    #[test]
    fn test_unavailable_references_keep_the_dependency() {
        let workspace = libraries(TestWorkspace::new())
            .project(":app", "dependencies {\n  implementation(project(\":lib1\"))\n}\n")
            .unavailable(":app", "main");

        let (_, outcome) = workspace.run(&settings());

        assert!(outcome.findings.is_empty());
        assert!(outcome
            .warnings
            .iter()
            .any(|w| matches!(w, Error::OracleUnavailable { project, .. } if project == ":app")));
    }

    #[test]
    fn test_unknown_external_artifact_is_kept() {
        let workspace = TestWorkspace::new()
            .project(":app", "dependencies {\n  implementation(\"com.squareup.okio:okio:3.0.0\")\n}\n");
        let (_, outcome) = workspace.run(&report_only());
        assert!(outcome.findings.is_empty());
    }

    #[test]
    fn test_known_external_artifact_is_checked() {
        let workspace = TestWorkspace::new()
            .project(":app", "dependencies {\n  implementation(\"com.squareup.okio:okio:3.0.0\")\n}\n")
            .external_exports("com.squareup.okio:okio", &["okio.Buffer"])
            .references(":app", "main", &["kotlin.String"]);

        let (_, outcome) = workspace.run(&report_only());

        assert_eq!(outcome.issue_count(), 1);
        assert_eq!(outcome.findings[0].dependency_identifier, "com.squareup.okio:okio");
    }

    #[test]
    fn test_groovy_noinspection_suppresses() {
        let workspace = libraries(TestWorkspace::new()).groovy_project(
            ":app",
            "dependencies {\n    //noinspection unused\n    implementation project(':lib1')\n}\n",
        );
        let (_, outcome) = workspace.run(&settings());
        assert_eq!(outcome.issue_count(), 0);
    }

    #[test]
    fn test_ignore_unused_finding() {
        let workspace = libraries(TestWorkspace::new())
            .project(":app", "dependencies {\n  implementation(project(\":lib1\"))\n}\n");
        let settings = Settings {
            ignore_unused_finding: vec![":app".to_string()],
            auto_correct: false,
            ..Settings::default()
        };
        let (_, outcome) = workspace.run(&settings);
        assert_eq!(outcome.issue_count(), 0);
    }
}

mod visibility {
    use super::*;

    #[test]
    fn test_must_be_api_retargets_the_configuration() {
        let workspace = libraries(TestWorkspace::new())
            .project(":app", "dependencies {\n  implementation(project(\":lib1\"))\n}\n")
            .public_references(":app", "main", &["com.example.lib1.Lib1Class"]);

        let (_, outcome) = workspace.run(&settings());

        assert_eq!(outcome.issue_count(), 1);
        assert_eq!(outcome.findings[0].name, FindingName::MustBeApi);
        assert_eq!(workspace.build_file(":app"), "dependencies {\n  api(project(\":lib1\"))\n}\n");
    }

    #[test]
    fn test_private_usage_stays_implementation() {
        let text = "dependencies {\n  implementation(project(\":lib1\"))\n}\n";
        let workspace = libraries(TestWorkspace::new())
            .project(":app", text)
            .references(":app", "main", &["com.example.lib1.Lib1Class"]);

        let (_, outcome) = workspace.run(&settings());

        assert!(outcome.findings.is_empty());
        assert_eq!(workspace.build_file(":app"), text);
    }
}

mod inheritance {
    use super::*;

    fn chain() -> TestWorkspace {
        libraries(TestWorkspace::new())
            .project(":lib2", "dependencies {\n  api(project(\":lib1\"))\n}\n")
            .exports(":lib2", "main", &["com.example.lib2.Lib2Class"])
            .references(":lib2", "main", &["com.example.lib1.Lib1Class"])
            .project(":app", "dependencies {\n  implementation(project(\":lib2\"))\n}\n")
            .references(
                ":app",
                "main",
                &["com.example.lib1.Lib1Class", "com.example.lib2.Lib2Class"],
            )
    }

    #[test]
    fn test_inherited_dependency_is_declared() {
        let workspace = chain();
        let (state, outcome) = workspace.run(&settings());

        let inherited: Vec<_> = outcome
            .findings
            .iter()
            .filter(|f| f.name == FindingName::InheritedDependency)
            .collect();
        assert_eq!(inherited.len(), 1);
        assert_eq!(inherited[0].dependency_identifier, ":lib1");
        assert_eq!(inherited[0].source.as_deref(), Some(":lib2"));
        assert!(inherited[0].fixed);

        let text = workspace.build_file(":app");
        assert!(text.contains("  implementation(project(\":lib1\"))\n"));
        assert!(text.contains("  implementation(project(\":lib2\"))\n"));

        let app = state.graph.project(&ProjectPath::new(":app")).unwrap();
        assert_eq!(app.dependencies.len(), 2);
    }

    #[test]
    fn test_inherited_in_report_only_mode() {
        let workspace = chain();
        let (_, outcome) = workspace.run(&report_only());
        assert!(outcome
            .unfixed()
            .any(|f| f.name == FindingName::InheritedDependency && f.dependency_identifier == ":lib1"));
        assert!(!workspace.build_file(":app").contains(":lib1"));
    }

    /// `:lib2` leaks `:lib1` through an `implementation` edge, `:lib3` uses
    /// `:lib1` through its `api` dependency on `:lib2`.
    fn leaked_implementation() -> TestWorkspace {
        libraries(TestWorkspace::new())
            .project(":lib2", "dependencies {\n  implementation(project(\":lib1\"))\n}\n")
            .exports(":lib2", "main", &["com.example.lib2.Lib2Class"])
            .public_references(":lib2", "main", &["com.example.lib1.Lib1Class"])
            .project(":lib3", "dependencies {\n  api(project(\":lib2\"))\n}\n")
            .references(":lib3", "main", &["com.example.lib1.Lib1Class"])
    }

    #[test]
    fn test_must_be_api_edge_counts_as_api_in_the_same_run() {
        let workspace = leaked_implementation();
        let (_, outcome) = workspace.run(&report_only());

        let found: Vec<(&str, FindingName, &str)> = outcome
            .findings
            .iter()
            .map(|f| (f.project.as_str(), f.name, f.dependency_identifier.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (":lib2", FindingName::MustBeApi, ":lib1"),
                (":lib3", FindingName::InheritedDependency, ":lib1"),
            ]
        );
        let inherited = outcome
            .findings
            .iter()
            .find(|f| f.name == FindingName::InheritedDependency)
            .unwrap();
        assert_eq!(inherited.source.as_deref(), Some(":lib2"));
        assert_eq!(inherited.configuration.as_ref().map(|c| c.as_str()), Some("implementation"));
    }

    #[test]
    fn test_must_be_api_edge_is_fixed_without_losing_the_consumer() {
        let workspace = leaked_implementation();
        let (state, outcome) = workspace.run(&settings());

        assert!(outcome
            .findings
            .iter()
            .all(|f| f.name != FindingName::UnusedDependency));
        assert!(outcome.findings.iter().all(|f| f.fixed));
        assert_eq!(workspace.build_file(":lib2"), "dependencies {\n  api(project(\":lib1\"))\n}\n");

        let lib3 = workspace.build_file(":lib3");
        assert!(lib3.contains("  api(project(\":lib2\"))\n"));
        assert!(lib3.contains("  implementation(project(\":lib1\"))\n"));
        let lib3 = state.graph.project(&ProjectPath::new(":lib3")).unwrap();
        assert_eq!(lib3.dependencies.len(), 2);
    }

    #[test]
    fn test_inherited_check_can_be_disabled() {
        let workspace = chain();
        let mut settings = report_only();
        settings.checks.inherited = false;
        let (_, outcome) = workspace.run(&settings);
        assert!(outcome.findings.is_empty());
    }
}

mod overshot {
    use super::*;

    #[test]
    fn test_test_dependency_used_in_main_moves() {
        let workspace = libraries(TestWorkspace::new())
            .project(":app", "dependencies {\n  testImplementation(project(\":lib1\"))\n}\n")
            .references(":app", "main", &["com.example.lib1.Lib1Class"]);

        let settings = Settings {
            delete_unused: true,
            ..Settings::default()
        };
        let (state, outcome) = workspace.run(&settings);

        let names: Vec<FindingName> = outcome.findings.iter().map(|f| f.name).collect();
        assert!(names.contains(&FindingName::UnusedDependency));
        assert!(names.contains(&FindingName::OvershotDependency));
        assert_eq!(
            workspace.build_file(":app"),
            "dependencies {\n  implementation(project(\":lib1\"))\n}\n"
        );

        let app = state.graph.project(&ProjectPath::new(":app")).unwrap();
        assert_eq!(app.dependencies.len(), 1);
        assert_eq!(app.dependencies[0].source_set(), SourceSetName::main());
    }

    #[test]
    fn test_suppressed_overshot_keeps_the_original() {
        let text = "dependencies {\n  @Suppress(\"overshot\")\n  implementation(project(\":lib1\"))\n}\n";
        let workspace = libraries(TestWorkspace::new())
            .project(":app", text)
            .references(":app", "test", &["com.example.lib1.Lib1Class"]);

        let settings = Settings {
            delete_unused: true,
            ..Settings::default()
        };
        let (state, outcome) = workspace.run(&settings);

        assert_eq!(outcome.issue_count(), 0);
        assert_eq!(workspace.build_file(":app"), text);
        let app = state.graph.project(&ProjectPath::new(":app")).unwrap();
        assert_eq!(app.dependencies.len(), 1);
    }
}

mod stability {
    use super::*;

    #[test]
    fn test_second_run_finds_nothing_to_fix() {
        let workspace = libraries(TestWorkspace::new())
            .project(":lib2", "dependencies {\n  implementation(project(\":lib1\"))\n}\n")
            .exports(":lib2", "main", &["com.example.lib2.Lib2Class"])
            .public_references(":lib2", "main", &["com.example.lib1.Lib1Class"])
            .project(":lib3", "dependencies {\n  api(project(\":lib2\"))\n}\n")
            .exports(":lib3", "main", &["com.example.lib3.Lib3Class"])
            .references(
                ":lib3",
                "main",
                &["com.example.lib1.Lib1Class", "com.example.lib2.Lib2Class"],
            )
            .project(
                ":app",
                "dependencies {\n  implementation(project(\":lib3\"))\n  implementation(project(\":lib1\"))\n  testImplementation(project(\":lib2\"))\n}\n",
            )
            .references(":app", "main", &["com.example.lib3.Lib3Class", "com.example.lib2.Lib2Class"]);

        let (_, first) = workspace.run(&settings());
        assert!(first.fixed_count() >= 3);
        assert!(first.is_success(true));
        let files: Vec<String> = [":lib2", ":lib3", ":app"]
            .iter()
            .map(|p| workspace.build_file(p))
            .collect();

        let (_, second) = workspace.run(&settings());
        let fixable: Vec<_> = second.findings.iter().filter(|f| f.is_fixable()).collect();
        assert!(fixable.is_empty(), "second run still has fixes: {fixable:?}");
        let after: Vec<String> = [":lib2", ":lib3", ":app"]
            .iter()
            .map(|p| workspace.build_file(p))
            .collect();
        assert_eq!(files, after);
    }
}

mod failures {
    use super::*;

    #[test]
    fn test_hand_edited_file_fails_its_pass_only() {
        let text = "dependencies {\n  implementation(project(\":lib2\"))\n}\n";
        let workspace = libraries(TestWorkspace::new())
            .project(":app", text)
            .declared(
                ":app",
                json!([
                    { "configuration": "implementation", "project": ":lib1" },
                    { "configuration": "implementation", "project": ":lib2" }
                ]),
            )
            .references(":app", "main", &["com.example.lib2.Lib2Class"])
            .project(":other", "dependencies {\n  implementation(project(\":lib1\"))\n}\n");

        let settings = Settings {
            strict: false,
            ..Settings::default()
        };
        let (_, outcome) = workspace.run(&settings);

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].project, ProjectPath::new(":app"));
        assert!(matches!(outcome.failures[0].error, Error::FixSpanMismatch { .. }));
        assert_eq!(workspace.build_file(":app"), text);

        // The unrelated project was still fixed.
        assert!(workspace.build_file(":other").contains("// implementation(project(\":lib1\"))"));
        assert!(!outcome.is_success(true));
    }

    #[test]
    fn test_unknown_project_is_a_warning() {
        let workspace = TestWorkspace::new()
            .project(":app", "dependencies {\n  implementation(project(\":missing\"))\n}\n");
        let (_, outcome) = workspace.run(&report_only());
        assert!(outcome
            .warnings
            .iter()
            .any(|w| matches!(w, Error::GraphInconsistency { target, .. } if target == ":missing")));
    }

    #[test]
    fn test_do_not_check() {
        let workspace = libraries(TestWorkspace::new())
            .project(":app", "dependencies {\n  implementation(project(\":lib1\"))\n}\n");
        let settings = Settings {
            do_not_check: vec![":app".to_string()],
            ..Settings::default()
        };
        let (_, outcome) = workspace.run(&settings);
        assert!(outcome.findings.is_empty());
    }
}

mod depths {
    use super::*;

    #[test]
    fn test_depths_reflect_fixes() {
        let workspace = libraries(TestWorkspace::new())
            .sources(":lib1", "main", 1)
            .project(":lib2", "dependencies {\n  api(project(\":lib1\"))\n}\n")
            .exports(":lib2", "main", &["com.example.lib2.Lib2Class"])
            .references(":lib2", "main", &["com.example.lib1.Lib1Class"])
            .sources(":lib2", "main", 2)
            .project(
                ":app",
                "dependencies {\n  implementation(project(\":lib2\"))\n  implementation(project(\":unusedlib\"))\n}\n",
            )
            .references(":app", "main", &["com.example.lib2.Lib2Class"])
            .sources(":app", "main", 1)
            .sources(":app", "test", 1)
            .project(":unusedlib", "dependencies {\n  api(project(\":lib2\"))\n}\n")
            .exports(":unusedlib", "main", &["com.example.unused.Thing"])
            .references(":unusedlib", "main", &["com.example.lib2.Lib2Class"])
            .sources(":unusedlib", "main", 1);

        let mut settings = settings();
        settings.checks.depths = true;
        let (_, outcome) = workspace.run(&settings);

        let depth_of = |project: &str, source_set: &str| {
            outcome
                .depths
                .iter()
                .find(|d| d.project == ProjectPath::new(project) && d.source_set.as_str() == source_set)
                .map(|d| d.depth)
        };
        assert_eq!(depth_of(":lib1", "main"), Some(0));
        assert_eq!(depth_of(":lib2", "main"), Some(1));
        // Before the fix :app reached :lib2 through :unusedlib as well.
        assert_eq!(depth_of(":app", "main"), Some(2));
        assert_eq!(depth_of(":app", "test"), Some(2));
        assert_eq!(depth_of(":app", "testFixtures"), None);

        let app = outcome
            .depths
            .iter()
            .find(|d| d.project == ProjectPath::new(":app") && d.source_set.is_main())
            .unwrap();
        assert_eq!(app.most_expensive, vec![ProjectPath::new(":lib2")]);

        // Depth findings are informational.
        assert!(outcome
            .findings
            .iter()
            .filter(|f| f.name == FindingName::ProjectDepth)
            .all(|f| f.is_report_only()));
        assert!(outcome.is_success(true));
    }
}
