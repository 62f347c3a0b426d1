use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the seven fixed rule groupings of a project document.
///
/// The set is closed: no category can be introduced at runtime, and an
/// unknown category name is rejected at the tool boundary rather than
/// defaulted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    BusinessRules,
    ProtectedFiles,
    CodeStandards,
    Architecture,
    Context,
    ServerConfig,
    DeployRules,
}

impl Category {
    /// All categories in their fixed display order.
    pub const ALL: [Category; 7] = [
        Self::BusinessRules,
        Self::ProtectedFiles,
        Self::CodeStandards,
        Self::Architecture,
        Self::Context,
        Self::ServerConfig,
        Self::DeployRules,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BusinessRules => "business_rules",
            Self::ProtectedFiles => "protected_files",
            Self::CodeStandards => "code_standards",
            Self::Architecture => "architecture",
            Self::Context => "context",
            Self::ServerConfig => "server_config",
            Self::DeployRules => "deploy_rules",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "business_rules" => Some(Self::BusinessRules),
            "protected_files" => Some(Self::ProtectedFiles),
            "code_standards" => Some(Self::CodeStandards),
            "architecture" => Some(Self::Architecture),
            "context" => Some(Self::Context),
            "server_config" => Some(Self::ServerConfig),
            "deploy_rules" => Some(Self::DeployRules),
            _ => None,
        }
    }

    /// Heading used when rendering context dumps and rule digests.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BusinessRules => "Business Rules",
            Self::ProtectedFiles => "Protected Files",
            Self::CodeStandards => "Code Standards",
            Self::Architecture => "Architecture",
            Self::Context => "General Context",
            Self::ServerConfig => "Server Configuration",
            Self::DeployRules => "Deploy Rules",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
