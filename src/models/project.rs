use serde::{Deserialize, Serialize};

use super::category::Category;
use super::log::LogEntry;
use super::task::Task;

/// The seven categorized rule sequences of a project.
///
/// All seven fields exist for every document; a fresh document starts with
/// every sequence empty. Access by [`Category`] goes through [`rules`] and
/// [`rules_mut`] so no caller indexes fields by string name.
///
/// [`rules`]: RuleBook::rules
/// [`rules_mut`]: RuleBook::rules_mut
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleBook {
    pub business_rules: Vec<String>,
    pub protected_files: Vec<String>,
    pub code_standards: Vec<String>,
    pub architecture: Vec<String>,
    pub context: Vec<String>,
    pub server_config: Vec<String>,
    pub deploy_rules: Vec<String>,
}

impl RuleBook {
    pub fn rules(&self, category: Category) -> &Vec<String> {
        match category {
            Category::BusinessRules => &self.business_rules,
            Category::ProtectedFiles => &self.protected_files,
            Category::CodeStandards => &self.code_standards,
            Category::Architecture => &self.architecture,
            Category::Context => &self.context,
            Category::ServerConfig => &self.server_config,
            Category::DeployRules => &self.deploy_rules,
        }
    }

    pub fn rules_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::BusinessRules => &mut self.business_rules,
            Category::ProtectedFiles => &mut self.protected_files,
            Category::CodeStandards => &mut self.code_standards,
            Category::Architecture => &mut self.architecture,
            Category::Context => &mut self.context,
            Category::ServerConfig => &mut self.server_config,
            Category::DeployRules => &mut self.deploy_rules,
        }
    }

    /// Rule count summed across all seven categories.
    pub fn total(&self) -> usize {
        Category::ALL
            .iter()
            .map(|&category| self.rules(category).len())
            .sum()
    }
}

/// Everything recorded about one project.
///
/// Documents are created lazily the first time a mutating operation
/// references an unseen project name, and are never deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub context: RuleBook,
    pub tasks: Vec<Task>,
    pub logs: Vec<LogEntry>,
    pub database: Option<DatabaseConfig>,
}

/// Connection descriptor for a project's PostgreSQL database.
///
/// Reconfiguring a project replaces the whole descriptor; there is no
/// field-level merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}
