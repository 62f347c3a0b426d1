//! MCP server exposing the project knowledge store to AI coding assistants.

mod types;

pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};

use crate::models::{Category, DatabaseConfig, LogKind, Task, TaskPriority, TaskStatus};
use crate::store::{Store, StoreError};
use crate::{pg, procs, validate};

#[derive(Clone)]
pub struct McpServer {
    store: Store,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            tool_router: Self::tool_router(),
        }
    }

    fn parse_category(s: &str) -> Result<Category, McpError> {
        Category::from_str(s).ok_or_else(|| {
            McpError::invalid_params(
                format!(
                    "Invalid category '{s}'. Must be one of: business_rules, protected_files, \
                     code_standards, architecture, context, server_config, deploy_rules"
                ),
                None,
            )
        })
    }

    fn parse_status(s: &str) -> Result<TaskStatus, McpError> {
        TaskStatus::from_str(s).ok_or_else(|| {
            McpError::invalid_params(
                format!("Invalid status '{s}'. Must be: pending, in_progress, done, or cancelled"),
                None,
            )
        })
    }

    fn parse_priority(s: &str) -> Result<TaskPriority, McpError> {
        TaskPriority::from_str(s).ok_or_else(|| {
            McpError::invalid_params(
                format!("Invalid priority '{s}'. Must be: low, medium, high, or urgent"),
                None,
            )
        })
    }

    fn parse_kind(s: &str) -> Result<LogKind, McpError> {
        LogKind::from_str(s).ok_or_else(|| {
            McpError::invalid_params(
                format!("Invalid kind '{s}'. Must be: success, error, update, note, or warning"),
                None,
            )
        })
    }

    fn refused(err: StoreError) -> McpError {
        McpError::invalid_params(err.to_string(), None)
    }

    // ============================================================
    // Tool logic - shared by MCP handlers and integration tests
    // ============================================================

    pub fn run_add_rule(
        &self,
        category: &str,
        rule: &str,
        project: Option<&str>,
    ) -> Result<String, McpError> {
        let project = Store::resolve_project(project);
        let category = Self::parse_category(category)?;
        let count = self.store.add_rule(&project, category, rule.to_string());
        Ok(format!(
            "✓ Rule added to project \"{project}\" in category \"{category}\":\n{rule}\n\n\
             Total rules in this category: {count}"
        ))
    }

    pub fn run_get_context(
        &self,
        project: Option<&str>,
        category: Option<&str>,
    ) -> Result<String, McpError> {
        let project = Store::resolve_project(project);
        let category = category.map(Self::parse_category).transpose()?;

        let Some(doc) = self.store.document(&project) else {
            return Ok(format!(
                "No context found for project \"{project}\".\n\n\
                 Use the \"add_rule\" tool to record business rules, code standards, \
                 protected files, and other project knowledge."
            ));
        };

        let categories: Vec<Category> = match category {
            Some(c) => vec![c],
            None => Category::ALL.to_vec(),
        };

        let mut out = format!("# Project Context: {project}\n\n");
        let mut empty = true;
        for cat in categories {
            let rules = doc.context.rules(cat);
            if rules.is_empty() {
                continue;
            }
            empty = false;
            out.push_str(&format!("## {} ({})\n", cat.label(), rules.len()));
            for (index, rule) in rules.iter().enumerate() {
                out.push_str(&format!("{}. {rule}\n", index + 1));
            }
            out.push('\n');
        }
        if empty {
            out.push_str("No rules defined yet.");
        }
        Ok(out)
    }

    pub fn run_list_projects(&self, detailed: bool) -> String {
        let projects = self.store.list_projects();
        if projects.is_empty() {
            return "No projects with stored context.".to_string();
        }

        let mut out = String::from("# Projects with Stored Context\n\n");
        for summary in projects {
            out.push_str(&format!("## {}\n", summary.name));
            out.push_str(&format!("Total rules: {}\n", summary.rule_total));
            out.push_str(&format!("Tasks: {}\n", summary.task_count));
            out.push_str(&format!("Logs: {}\n", summary.log_count));
            out.push_str(&format!(
                "Database: {}\n",
                if summary.has_database {
                    "Configured"
                } else {
                    "Not configured"
                }
            ));
            if detailed {
                out.push_str("\n### Rule Details:\n");
                for (category, count) in &summary.rules_by_category {
                    out.push_str(&format!("- {}: {count}\n", category.label()));
                }
            }
            out.push('\n');
        }
        out
    }

    pub fn run_remove_rule(
        &self,
        category: &str,
        index: u32,
        project: Option<&str>,
    ) -> Result<String, McpError> {
        let project = Store::resolve_project(project);
        let category = Self::parse_category(category)?;
        let removed = self
            .store
            .remove_rule(&project, category, index as usize)
            .map_err(Self::refused)?;
        Ok(format!(
            "✓ Rule removed from project \"{project}\" in category \"{category}\":\n{removed}"
        ))
    }

    pub fn run_validate(
        &self,
        description: &str,
        files: &[String],
        project: Option<&str>,
    ) -> String {
        let project = Store::resolve_project(project);
        match self.store.document(&project) {
            Some(doc) => validate::validate(&project, &doc, description, files).render(),
            None => format!(
                "No context defined for \"{project}\". There are no rules to validate."
            ),
        }
    }

    pub fn run_add_task(
        &self,
        title: &str,
        description: Option<&str>,
        priority: Option<&str>,
        project: Option<&str>,
    ) -> Result<String, McpError> {
        let project = Store::resolve_project(project);
        let priority = match priority {
            Some(s) => Self::parse_priority(s)?,
            None => TaskPriority::Medium,
        };
        let task = self.store.add_task(
            &project,
            title.to_string(),
            description.map(str::to_string),
            priority,
        );
        Ok(format!(
            "✓ Task added to project \"{project}\":\n\nID: {}\nTitle: {}\nPriority: {}\nStatus: {}",
            task.id,
            task.title,
            task.priority.as_str(),
            task.status.as_str()
        ))
    }

    pub fn run_list_tasks(
        &self,
        status: Option<&str>,
        project: Option<&str>,
    ) -> Result<String, McpError> {
        let project = Store::resolve_project(project);
        let filter = status.map(Self::parse_status).transpose()?;

        let Some(tasks) = self.store.tasks(&project) else {
            return Ok(format!("No tasks found for project \"{project}\"."));
        };
        let tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|task| filter.map_or(true, |f| task.status == f))
            .collect();

        let mut out = format!("# Project Tasks: {project}\n\n");
        for status in TaskStatus::ALL {
            let group: Vec<&Task> = tasks.iter().filter(|task| task.status == status).collect();
            if group.is_empty() {
                continue;
            }
            out.push_str(&format!(
                "## {} {} ({})\n\n",
                status.symbol(),
                status.as_str().to_uppercase(),
                group.len()
            ));
            for task in group {
                out.push_str(&format!("### [{}] {}\n", task.id, task.title));
                if let Some(description) = &task.description {
                    out.push_str(&format!("{description}\n"));
                }
                out.push_str(&format!(
                    "Priority: {} | Created: {}\n\n",
                    task.priority.as_str(),
                    task.created_at.format("%Y-%m-%d")
                ));
            }
        }
        Ok(out)
    }

    pub fn run_complete_task(
        &self,
        task_id: u32,
        project: Option<&str>,
    ) -> Result<String, McpError> {
        let project = Store::resolve_project(project);
        let task = self
            .store
            .complete_task(&project, task_id)
            .map_err(Self::refused)?;
        Ok(format!(
            "✓ Task [{}] \"{}\" marked as done!",
            task.id, task.title
        ))
    }

    pub fn run_record_event(
        &self,
        kind: &str,
        message: &str,
        details: Option<&str>,
        project: Option<&str>,
    ) -> Result<String, McpError> {
        let project = Store::resolve_project(project);
        let kind = Self::parse_kind(kind)?;
        let entry = self.store.record_event(
            &project,
            kind,
            message.to_string(),
            details.map(str::to_string),
        );
        Ok(format!(
            "{} Event recorded in project \"{project}\" history:\n{}",
            entry.kind.symbol(),
            entry.message
        ))
    }

    pub fn run_get_history(
        &self,
        kind: Option<&str>,
        limit: Option<u32>,
        project: Option<&str>,
    ) -> Result<String, McpError> {
        let project = Store::resolve_project(project);
        let kind = kind.map(Self::parse_kind).transpose()?;
        let limit = limit.unwrap_or(20) as usize;

        let Some(entries) = self.store.history(&project, kind, limit) else {
            return Ok(format!("No history recorded for project \"{project}\"."));
        };

        let mut out = format!(
            "# Project History: {project}\n\nShowing {} most recent record(s)\n\n",
            entries.len()
        );
        for entry in &entries {
            out.push_str(&format!(
                "## {} {} - {}\n",
                entry.kind.symbol(),
                entry.kind.as_str().to_uppercase(),
                entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            ));
            out.push_str(&format!("{}\n", entry.message));
            if let Some(details) = &entry.details {
                out.push_str(&format!("\nDetails: {details}\n"));
            }
            out.push('\n');
        }
        Ok(out)
    }

    pub fn run_configure_database(
        &self,
        host: &str,
        port: Option<u16>,
        database: &str,
        user: &str,
        password: &str,
        project: Option<&str>,
    ) -> String {
        let project = Store::resolve_project(project);
        let config = DatabaseConfig {
            host: host.to_string(),
            port: port.unwrap_or(5432),
            database: database.to_string(),
            user: user.to_string(),
            password: password.to_string(),
        };
        let text = format!(
            "✓ Database configuration saved for \"{project}\":\n- Host: {}:{}\n- Database: {}\n- User: {}",
            config.host, config.port, config.database, config.user
        );
        self.store.set_database(&project, config);
        text
    }

    fn project_database(&self, project: &str) -> Result<DatabaseConfig, McpError> {
        self.store.database(project).ok_or_else(|| {
            McpError::invalid_params(
                format!(
                    "No database configured for project \"{project}\". \
                     Use the \"configure_database\" tool first."
                ),
                None,
            )
        })
    }

    pub async fn run_db_query(
        &self,
        query: &str,
        project: Option<&str>,
    ) -> Result<String, McpError> {
        let project = Store::resolve_project(project);
        let config = self.project_database(&project)?;
        Ok(match pg::run_query(&config, query).await {
            Ok(report) => report,
            Err(err) => format!("Query failed: {err}"),
        })
    }

    pub async fn run_db_list_tables(&self, project: Option<&str>) -> Result<String, McpError> {
        let project = Store::resolve_project(project);
        let config = self.project_database(&project)?;
        Ok(match pg::list_tables(&config).await {
            Ok(report) => report,
            Err(err) => format!("Could not list tables: {err}"),
        })
    }

    pub async fn run_db_describe_table(
        &self,
        table_name: &str,
        project: Option<&str>,
    ) -> Result<String, McpError> {
        let project = Store::resolve_project(project);
        let config = self.project_database(&project)?;
        Ok(match pg::describe_table(&config, table_name).await {
            Ok(report) => report,
            Err(err) => format!("Could not describe table: {err}"),
        })
    }
}

#[tool_router]
impl McpServer {
    // ============================================================
    // Rule catalog
    // ============================================================

    #[tool(
        description = "Record a durable rule for the current project: business logic, protected files, coding standards, architecture notes, server configuration, or deploy constraints. Use this to capture knowledge that must not be forgotten between sessions."
    )]
    async fn add_rule(
        &self,
        params: Parameters<AddRuleRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.run_add_rule(&req.category, &req.rule, req.project.as_deref())?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Retrieve the stored context and rules for the current project. Call this at the START of every session to load the project's accumulated knowledge before making changes."
    )]
    async fn get_context(
        &self,
        params: Parameters<GetContextRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.run_get_context(req.project.as_deref(), req.category.as_deref())?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "List every project with stored context, including rule, task, and log counts and whether a database is configured."
    )]
    async fn list_projects(
        &self,
        params: Parameters<ListProjectsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.run_list_projects(req.detailed);
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "Remove one rule from a project category by its zero-based index.")]
    async fn remove_rule(
        &self,
        params: Parameters<RemoveRuleRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.run_remove_rule(&req.category, req.index, req.project.as_deref())?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Check planned changes against the project's rules BEFORE making them. Flags any affected file that matches a protected-file pattern and lists the rules to keep in mind."
    )]
    async fn validate_changes(
        &self,
        params: Parameters<ValidateChangesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.run_validate(
            &req.changes_description,
            &req.files_affected,
            req.project.as_deref(),
        );
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    // ============================================================
    // Task ledger
    // ============================================================

    #[tool(description = "Add a task to the project to track what still needs to be done.")]
    async fn add_task(
        &self,
        params: Parameters<AddTaskRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.run_add_task(
            &req.title,
            req.description.as_deref(),
            req.priority.as_deref(),
            req.project.as_deref(),
        )?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "List the project's tasks grouped by status (pending, in progress, done, cancelled), optionally filtered by one status."
    )]
    async fn list_tasks(
        &self,
        params: Parameters<ListTasksRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.run_list_tasks(req.status.as_deref(), req.project.as_deref())?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "Mark a task as done by its ID.")]
    async fn complete_task(
        &self,
        params: Parameters<CompleteTaskRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.run_complete_task(req.task_id, req.project.as_deref())?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    // ============================================================
    // Event log
    // ============================================================

    #[tool(
        description = "Record a notable event in the project history: a success, error, update, note, or warning."
    )]
    async fn record_event(
        &self,
        params: Parameters<RecordEventRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.run_record_event(
            &req.kind,
            &req.message,
            req.details.as_deref(),
            req.project.as_deref(),
        )?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Show the project's recent event history, newest first, optionally filtered by kind."
    )]
    async fn get_history(
        &self,
        params: Parameters<GetHistoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text =
            self.run_get_history(req.kind.as_deref(), req.limit, req.project.as_deref())?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    // ============================================================
    // Database passthrough
    // ============================================================

    #[tool(
        description = "Store the PostgreSQL connection settings for the current project. Replaces any previous configuration in full."
    )]
    async fn configure_database(
        &self,
        params: Parameters<ConfigureDatabaseRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.run_configure_database(
            &req.host,
            req.port,
            &req.database,
            &req.user,
            &req.password,
            req.project.as_deref(),
        );
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "Run a SQL statement against the project's configured PostgreSQL database.")]
    async fn run_query(
        &self,
        params: Parameters<RunQueryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.run_db_query(&req.query, req.project.as_deref()).await?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "List all tables in the project's configured PostgreSQL database.")]
    async fn list_tables(
        &self,
        params: Parameters<ListTablesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self.run_db_list_tables(req.project.as_deref()).await?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Describe the structure of a table (columns, types, constraints) in the project's configured PostgreSQL database."
    )]
    async fn describe_table(
        &self,
        params: Parameters<DescribeTableRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = self
            .run_db_describe_table(&req.table_name, req.project.as_deref())
            .await?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    // ============================================================
    // Process utilities
    // ============================================================

    #[tool(description = "List processes with listening TCP ports on this machine.")]
    async fn list_processes(&self) -> Result<CallToolResult, McpError> {
        let text = match procs::list_processes().await {
            Ok(report) => report,
            Err(err) => format!("Could not list processes: {err}"),
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(description = "Terminate whatever process is listening on the given port.")]
    async fn kill_process(
        &self,
        params: Parameters<KillProcessRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let text = match procs::kill_process(req.port).await {
            Ok(report) => report,
            Err(err) => format!("Could not terminate process on port {}: {err}", req.port),
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "project-context".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"project-context is a persistent knowledge store shared across sessions.
Each project (defaulted from your working directory name) accumulates rules,
tasks, and an event history that survive between conversations.

SESSION START:
1. Call get_context to load everything recorded about the current project.
2. Review business rules, protected files, and code standards before coding.

WHILE WORKING:
- Call add_rule whenever you learn something durable about the project:
  business logic, files that must not be touched, coding standards,
  architecture decisions, server configuration, deploy constraints.
- Call validate_changes BEFORE modifying files - it cross-checks the
  affected paths against the project's protected-file patterns and reminds
  you of the rules that apply.
- Track outstanding work with add_task / list_tasks / complete_task.
- Record notable outcomes with record_event (success, error, update, note,
  warning); review them later with get_history.

RULE CATEGORIES:
- business_rules: domain invariants that must hold
- protected_files: path patterns that require review before modification
  (matched as literal substrings and as regular expressions)
- code_standards: style and idiom requirements
- architecture: structural decisions and their boundaries
- context: general background knowledge
- server_config: runtime/server settings worth remembering
- deploy_rules: constraints on releasing changes

DATABASE ACCESS:
Configure once with configure_database, then use run_query, list_tables,
and describe_table against the project's PostgreSQL database.

Everything is stored in a single file in your home directory; no external
services are required for the knowledge store itself."#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(store: Store) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(store);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
