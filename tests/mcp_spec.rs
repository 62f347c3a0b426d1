//! MCP server integration tests.
//!
//! Tests drive the tool logic through the server's `run_*` methods and
//! assert on the shape of the text responses, since every tool answers with
//! a single human-readable block. Project names are always passed explicitly
//! so the tests do not depend on the working directory.

use project_context::mcp::McpServer;
use project_context::models::{Category, TaskPriority};
use project_context::store::Store;
use tempfile::TempDir;

/// Helper to create a test MCP server backed by a store file in a temp dir.
fn setup() -> (McpServer, Store, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = Store::open(dir.path().join("store.json"));
    let server = McpServer::new(store.clone());
    (server, store, dir)
}

// ============================================================
// Rule catalog tools
// ============================================================

mod rule_tools {
    use super::*;

    mod add_rule {
        use super::*;

        #[test]
        fn reports_the_new_category_count() {
            let (server, _store, _dir) = setup();

            let first = server
                .run_add_rule("business_rules", "invoices are immutable", Some("app"))
                .expect("Tool failed");
            let second = server
                .run_add_rule("business_rules", "orders need approval", Some("app"))
                .expect("Tool failed");

            assert!(first.contains("Total rules in this category: 1"));
            assert!(second.contains("Total rules in this category: 2"));
            assert!(second.contains("orders need approval"));
        }

        #[test]
        fn rejects_an_unknown_category() {
            let (server, store, _dir) = setup();

            let result = server.run_add_rule("secret_rules", "nope", Some("app"));

            assert!(result.is_err());
            // A refused call never creates the document as a side effect.
            assert!(store.document("app").is_none());
        }
    }

    mod get_context {
        use super::*;

        #[test]
        fn reports_not_found_for_an_unknown_project() {
            let (server, store, _dir) = setup();

            let text = server
                .run_get_context(Some("ghost"), None)
                .expect("Tool failed");

            assert!(text.contains("No context found for project \"ghost\""));
            assert!(store.document("ghost").is_none());
        }

        #[test]
        fn distinguishes_an_empty_document_from_a_missing_one() {
            let (server, _store, _dir) = setup();
            server
                .run_add_rule("context", "temporary", Some("app"))
                .expect("Tool failed");
            server
                .run_remove_rule("context", 0, Some("app"))
                .expect("Tool failed");

            let text = server
                .run_get_context(Some("app"), None)
                .expect("Tool failed");

            assert!(text.contains("# Project Context: app"));
            assert!(text.contains("No rules defined yet."));
        }

        #[test]
        fn lists_categories_in_fixed_order_skipping_empty_ones() {
            let (server, _store, _dir) = setup();
            server
                .run_add_rule("deploy_rules", "deploy only from main", Some("app"))
                .expect("Tool failed");
            server
                .run_add_rule("business_rules", "invoices are immutable", Some("app"))
                .expect("Tool failed");

            let text = server
                .run_get_context(Some("app"), None)
                .expect("Tool failed");

            let business = text.find("## Business Rules (1)").expect("heading missing");
            let deploy = text.find("## Deploy Rules (1)").expect("heading missing");
            assert!(business < deploy);
            assert!(!text.contains("## Code Standards"));
        }

        #[test]
        fn restricts_output_to_the_requested_category() {
            let (server, _store, _dir) = setup();
            server
                .run_add_rule("business_rules", "invoices are immutable", Some("app"))
                .expect("Tool failed");
            server
                .run_add_rule("architecture", "hexagonal", Some("app"))
                .expect("Tool failed");

            let text = server
                .run_get_context(Some("app"), Some("architecture"))
                .expect("Tool failed");

            assert!(text.contains("## Architecture (1)"));
            assert!(!text.contains("## Business Rules"));
        }

        #[test]
        fn is_idempotent() {
            let (server, _store, _dir) = setup();
            server
                .run_add_rule("context", "stable", Some("app"))
                .expect("Tool failed");

            let first = server.run_get_context(Some("app"), None).expect("Tool failed");
            let second = server.run_get_context(Some("app"), None).expect("Tool failed");

            assert_eq!(first, second);
        }
    }

    mod list_projects {
        use super::*;

        #[test]
        fn reports_when_nothing_is_stored() {
            let (server, _store, _dir) = setup();

            assert_eq!(server.run_list_projects(true), "No projects with stored context.");
        }

        #[test]
        fn summarizes_every_project() {
            let (server, store, _dir) = setup();
            server
                .run_add_rule("business_rules", "a", Some("alpha"))
                .expect("Tool failed");
            store.add_task("alpha", "ship".to_string(), None, TaskPriority::Medium);
            server
                .run_add_rule("context", "b", Some("beta"))
                .expect("Tool failed");

            let text = server.run_list_projects(false);

            assert!(text.contains("## alpha"));
            assert!(text.contains("Total rules: 1"));
            assert!(text.contains("Tasks: 1"));
            assert!(text.contains("## beta"));
            assert!(text.contains("Database: Not configured"));
            assert!(!text.contains("### Rule Details:"));
        }

        #[test]
        fn detailed_listing_includes_per_category_counts() {
            let (server, _store, _dir) = setup();
            server
                .run_add_rule("code_standards", "no unwrap in handlers", Some("app"))
                .expect("Tool failed");

            let text = server.run_list_projects(true);

            assert!(text.contains("### Rule Details:"));
            assert!(text.contains("- Code Standards: 1"));
            assert!(text.contains("- Deploy Rules: 0"));
        }
    }

    mod remove_rule {
        use super::*;

        #[test]
        fn returns_the_removed_rule_text() {
            let (server, _store, _dir) = setup();
            server
                .run_add_rule("server_config", "port 8080", Some("app"))
                .expect("Tool failed");

            let text = server
                .run_remove_rule("server_config", 0, Some("app"))
                .expect("Tool failed");

            assert!(text.contains("Rule removed from project \"app\""));
            assert!(text.contains("port 8080"));
        }

        #[test]
        fn refuses_an_out_of_range_index() {
            let (server, _store, _dir) = setup();
            server
                .run_add_rule("server_config", "port 8080", Some("app"))
                .expect("Tool failed");

            let result = server.run_remove_rule("server_config", 3, Some("app"));

            let err = result.expect_err("should refuse");
            assert!(err.message.contains("out of range"));
        }

        #[test]
        fn refuses_an_unknown_project() {
            let (server, _store, _dir) = setup();

            let result = server.run_remove_rule("server_config", 0, Some("ghost"));

            let err = result.expect_err("should refuse");
            assert!(err.message.contains("not found"));
        }
    }

    mod validate_changes {
        use super::*;

        #[test]
        fn flags_literal_and_regex_protected_files() {
            let (server, store, _dir) = setup();
            store.add_rule(
                "app",
                Category::ProtectedFiles,
                "config/secrets.yml".to_string(),
            );
            store.add_rule("app", Category::ProtectedFiles, "^db/.*\\.sql$".to_string());

            let files = vec![
                "config/secrets.yml".to_string(),
                "src/app.ts".to_string(),
                "db/migrate.sql".to_string(),
            ];
            let text = server.run_validate("rotate keys", &files, Some("app"));

            assert!(text.contains("Protected file will be modified: config/secrets.yml"));
            assert!(text.contains("Protected file will be modified: db/migrate.sql"));
            assert!(!text.contains("Protected file will be modified: src/app.ts"));
            assert!(text.ends_with("Review the warnings above before proceeding."));
        }

        #[test]
        fn reports_no_conflicts_when_nothing_matches() {
            let (server, store, _dir) = setup();
            store.add_rule(
                "app",
                Category::ProtectedFiles,
                "config/secrets.yml".to_string(),
            );

            let files = vec!["src/app.ts".to_string()];
            let text = server.run_validate("refactor", &files, Some("app"));

            assert!(text.ends_with("No conflicts detected with protected files."));
        }

        #[test]
        fn includes_the_rule_digest_with_category_labels() {
            let (server, store, _dir) = setup();
            store.add_rule(
                "app",
                Category::BusinessRules,
                "invoices are immutable".to_string(),
            );
            store.add_rule("app", Category::ServerConfig, "port 8080".to_string());

            let text = server.run_validate("change billing", &[], Some("app"));

            assert!(text.contains("- [Business Rules] invoices are immutable"));
            // Server configuration is excluded from the digest.
            assert!(!text.contains("port 8080"));
        }

        #[test]
        fn short_circuits_for_an_unknown_project() {
            let (server, _store, _dir) = setup();

            let text = server.run_validate("anything", &[], Some("ghost"));

            assert!(text.contains("No context defined for \"ghost\""));
            assert!(text.contains("no rules to validate"));
        }
    }
}

// ============================================================
// Task ledger tools
// ============================================================

mod task_tools {
    use super::*;

    mod add_task {
        use super::*;

        #[test]
        fn defaults_to_medium_priority_and_pending_status() {
            let (server, _store, _dir) = setup();

            let text = server
                .run_add_task("ship the release", None, None, Some("app"))
                .expect("Tool failed");

            assert!(text.contains("ID: 0"));
            assert!(text.contains("Priority: medium"));
            assert!(text.contains("Status: pending"));
        }

        #[test]
        fn assigns_sequential_ids() {
            let (server, _store, _dir) = setup();

            server
                .run_add_task("first", None, None, Some("app"))
                .expect("Tool failed");
            let text = server
                .run_add_task("second", None, Some("urgent"), Some("app"))
                .expect("Tool failed");

            assert!(text.contains("ID: 1"));
            assert!(text.contains("Priority: urgent"));
        }

        #[test]
        fn rejects_an_unknown_priority() {
            let (server, _store, _dir) = setup();

            let result = server.run_add_task("task", None, Some("critical"), Some("app"));

            assert!(result.is_err());
        }
    }

    mod list_tasks {
        use super::*;

        #[test]
        fn reports_no_tasks_for_an_unknown_project() {
            let (server, _store, _dir) = setup();

            let text = server
                .run_list_tasks(None, Some("ghost"))
                .expect("Tool failed");

            assert!(text.contains("No tasks found for project \"ghost\""));
        }

        #[test]
        fn groups_tasks_by_status_in_display_order() {
            let (server, store, _dir) = setup();
            store.add_task("app", "pending one".to_string(), None, TaskPriority::Medium);
            store.add_task("app", "will be done".to_string(), None, TaskPriority::Medium);
            store
                .complete_task("app", 1)
                .expect("completion should succeed");

            let text = server.run_list_tasks(None, Some("app")).expect("Tool failed");

            let pending = text.find("PENDING (1)").expect("pending group missing");
            let done = text.find("DONE (1)").expect("done group missing");
            assert!(pending < done);
            assert!(text.contains("### [0] pending one"));
            assert!(text.contains("### [1] will be done"));
        }

        #[test]
        fn filters_by_status_before_grouping() {
            let (server, store, _dir) = setup();
            store.add_task("app", "open".to_string(), None, TaskPriority::Medium);
            store.add_task("app", "closed".to_string(), None, TaskPriority::Medium);
            store
                .complete_task("app", 1)
                .expect("completion should succeed");

            let text = server
                .run_list_tasks(Some("done"), Some("app"))
                .expect("Tool failed");

            assert!(text.contains("### [1] closed"));
            assert!(!text.contains("### [0] open"));
        }
    }

    mod complete_task {
        use super::*;

        #[test]
        fn marks_the_task_done() {
            let (server, store, _dir) = setup();
            store.add_task("app", "finish docs".to_string(), None, TaskPriority::Low);

            let text = server
                .run_complete_task(0, Some("app"))
                .expect("Tool failed");

            assert!(text.contains("Task [0] \"finish docs\" marked as done!"));
        }

        #[test]
        fn refuses_an_id_outside_the_sequence() {
            let (server, store, _dir) = setup();
            store.add_task("app", "only".to_string(), None, TaskPriority::Low);

            let result = server.run_complete_task(7, Some("app"));

            let err = result.expect_err("should refuse");
            assert!(err.message.contains("Task with ID 7 not found"));
        }

        #[test]
        fn refuses_an_unknown_project() {
            let (server, _store, _dir) = setup();

            let result = server.run_complete_task(0, Some("ghost"));

            let err = result.expect_err("should refuse");
            assert!(err.message.contains("not found"));
        }
    }
}

// ============================================================
// Event log tools
// ============================================================

mod log_tools {
    use super::*;

    mod record_event {
        use super::*;

        #[test]
        fn confirms_the_recorded_event() {
            let (server, _store, _dir) = setup();

            let text = server
                .run_record_event("success", "deploy finished", None, Some("app"))
                .expect("Tool failed");

            assert!(text.contains("Event recorded in project \"app\" history"));
            assert!(text.contains("deploy finished"));
        }

        #[test]
        fn rejects_an_unknown_kind() {
            let (server, _store, _dir) = setup();

            let result = server.run_record_event("fatal", "boom", None, Some("app"));

            assert!(result.is_err());
        }
    }

    mod get_history {
        use super::*;

        #[test]
        fn reports_no_history_for_an_unknown_project() {
            let (server, _store, _dir) = setup();

            let text = server
                .run_get_history(None, None, Some("ghost"))
                .expect("Tool failed");

            assert!(text.contains("No history recorded for project \"ghost\""));
        }

        #[test]
        fn shows_newest_entries_first() {
            let (server, _store, _dir) = setup();
            for message in ["first", "second", "third"] {
                server
                    .run_record_event("note", message, None, Some("app"))
                    .expect("Tool failed");
            }

            let text = server
                .run_get_history(None, None, Some("app"))
                .expect("Tool failed");

            let third = text.find("third").expect("entry missing");
            let first = text.find("first").expect("entry missing");
            assert!(third < first);
            assert!(text.contains("Showing 3 most recent record(s)"));
        }

        #[test]
        fn honors_the_limit() {
            let (server, _store, _dir) = setup();
            for n in 0..5 {
                server
                    .run_record_event("update", &format!("event {n}"), None, Some("app"))
                    .expect("Tool failed");
            }

            let text = server
                .run_get_history(None, Some(2), Some("app"))
                .expect("Tool failed");

            assert!(text.contains("Showing 2 most recent record(s)"));
            assert!(text.contains("event 4"));
            assert!(text.contains("event 3"));
            assert!(!text.contains("event 2"));
        }

        #[test]
        fn filters_by_kind() {
            let (server, _store, _dir) = setup();
            server
                .run_record_event("error", "broke", None, Some("app"))
                .expect("Tool failed");
            server
                .run_record_event("success", "fixed", None, Some("app"))
                .expect("Tool failed");

            let text = server
                .run_get_history(Some("error"), None, Some("app"))
                .expect("Tool failed");

            assert!(text.contains("broke"));
            assert!(!text.contains("fixed"));
        }

        #[test]
        fn shows_details_when_present() {
            let (server, _store, _dir) = setup();
            server
                .run_record_event(
                    "warning",
                    "disk almost full",
                    Some("93% used"),
                    Some("app"),
                )
                .expect("Tool failed");

            let text = server
                .run_get_history(None, None, Some("app"))
                .expect("Tool failed");

            assert!(text.contains("Details: 93% used"));
        }
    }
}

// ============================================================
// Database configuration tool
// ============================================================

mod database_tools {
    use super::*;

    #[test]
    fn stores_the_descriptor_and_reports_it_without_the_password() {
        let (server, store, _dir) = setup();

        let text = server.run_configure_database(
            "localhost",
            None,
            "appdb",
            "app",
            "secret",
            Some("app"),
        );

        assert!(text.contains("Host: localhost:5432"));
        assert!(text.contains("Database: appdb"));
        assert!(!text.contains("secret"));

        let config = store.database("app").expect("descriptor should exist");
        assert_eq!(config.port, 5432);
        assert_eq!(config.password, "secret");
    }

    #[test]
    fn reconfiguring_replaces_the_descriptor_in_full() {
        let (server, store, _dir) = setup();
        server.run_configure_database("old", Some(5433), "olddb", "old", "old", Some("app"));
        server.run_configure_database("new", None, "newdb", "new", "new", Some("app"));

        let config = store.database("app").expect("descriptor should exist");
        assert_eq!(config.host, "new");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "newdb");
    }

    #[tokio::test]
    async fn query_refuses_when_no_database_is_configured() {
        let (server, _store, _dir) = setup();

        let result = server.run_db_query("SELECT 1", Some("app")).await;

        let err = result.expect_err("should refuse");
        assert!(err.message.contains("No database configured for project \"app\""));
        assert!(err.message.contains("configure_database"));
    }

    #[tokio::test]
    async fn connection_failures_render_as_text_not_protocol_errors() {
        let (server, _store, _dir) = setup();
        // Port 1 on localhost refuses connections immediately.
        server.run_configure_database("127.0.0.1", Some(1), "db", "user", "pw", Some("app"));

        let text = server
            .run_db_query("SELECT 1", Some("app"))
            .await
            .expect("tool should answer with text");

        assert!(text.starts_with("Query failed:"));
    }
}
