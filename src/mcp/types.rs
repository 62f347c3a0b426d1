//! Request types for MCP tools.

use rmcp::schemars::JsonSchema;
use serde::Deserialize;

// ============================================================
// Rule catalog
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddRuleRequest {
    #[schemars(
        description = "Rule category: business_rules, protected_files, code_standards, architecture, context, server_config, deploy_rules"
    )]
    pub category: String,
    #[schemars(description = "The rule or context to record")]
    pub rule: String,
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetContextRequest {
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
    #[schemars(description = "Restrict the dump to one category (optional)")]
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListProjectsRequest {
    #[schemars(description = "Show per-category rule statistics (default: true)")]
    #[serde(default = "default_true")]
    pub detailed: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveRuleRequest {
    #[schemars(description = "Category of the rule to remove")]
    pub category: String,
    #[schemars(description = "Zero-based index of the rule to remove")]
    pub index: u32,
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ValidateChangesRequest {
    #[schemars(description = "Description of the changes that will be made")]
    pub changes_description: String,
    #[schemars(description = "Files that will be modified")]
    #[serde(default)]
    pub files_affected: Vec<String>,
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
}

// ============================================================
// Task ledger
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddTaskRequest {
    #[schemars(description = "Task title")]
    pub title: String,
    #[schemars(description = "Detailed task description (optional)")]
    #[serde(default)]
    pub description: Option<String>,
    #[schemars(description = "Task priority: low, medium, high, urgent (default: medium)")]
    #[serde(default)]
    pub priority: Option<String>,
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTasksRequest {
    #[schemars(description = "Filter by status: pending, in_progress, done, cancelled (optional)")]
    #[serde(default)]
    pub status: Option<String>,
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompleteTaskRequest {
    #[schemars(description = "Task ID (zero-based creation position)")]
    pub task_id: u32,
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
}

// ============================================================
// Event log
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecordEventRequest {
    #[schemars(description = "Event kind: success, error, update, note, warning")]
    #[serde(rename = "type")]
    pub kind: String,
    #[schemars(description = "Event message")]
    pub message: String,
    #[schemars(description = "Additional details (optional)")]
    #[serde(default)]
    pub details: Option<String>,
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetHistoryRequest {
    #[schemars(description = "Filter by kind: success, error, update, note, warning (optional)")]
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[schemars(description = "Maximum number of entries to show (default: 20)")]
    #[serde(default)]
    pub limit: Option<u32>,
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
}

// ============================================================
// Database passthrough
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConfigureDatabaseRequest {
    #[schemars(description = "Database host (e.g. localhost)")]
    pub host: String,
    #[schemars(description = "Database port (default: 5432)")]
    #[serde(default)]
    pub port: Option<u16>,
    #[schemars(description = "Database name")]
    pub database: String,
    #[schemars(description = "Database user")]
    pub user: String,
    #[schemars(description = "Database password")]
    pub password: String,
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunQueryRequest {
    #[schemars(description = "SQL statement to execute (SELECT, INSERT, UPDATE, ...)")]
    pub query: String,
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTablesRequest {
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DescribeTableRequest {
    #[schemars(description = "Name of the table to describe")]
    pub table_name: String,
    #[schemars(description = "Project name (optional, detected from the current working directory if omitted)")]
    #[serde(default)]
    pub project: Option<String>,
}

// ============================================================
// Process utilities
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct KillProcessRequest {
    #[schemars(description = "Port of the process to terminate")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}
