use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An append-only record of a notable event on a project.
///
/// Entries are never mutated or removed; ordering is strictly by insertion,
/// which coincides with timestamp order since timestamps are taken at
/// insertion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    pub details: Option<String>,
}

/// The kind of event a log entry records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Success,
    Error,
    Update,
    Note,
    Warning,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Update => "update",
            Self::Note => "note",
            Self::Warning => "warning",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            "update" => Some(Self::Update),
            "note" => Some(Self::Note),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }

    /// Marker used when rendering history entries.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Error => "❌",
            Self::Update => "🔄",
            Self::Note => "📝",
            Self::Warning => "⚠️",
        }
    }
}
