//! Whole-document persistent store for project knowledge.
//!
//! One JSON file holds the full mapping from project name to
//! [`ProjectDocument`]. The file is read once when the store opens and
//! rewritten in full after every mutation. Storage I/O never blocks the
//! caller's workflow: an unreadable or unparseable file yields an empty
//! mapping, and a failed write is logged and swallowed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::models::{
    Category, DatabaseConfig, LogEntry, LogKind, ProjectDocument, Task, TaskPriority, TaskStatus,
};

type ProjectMap = BTreeMap<String, ProjectDocument>;

/// Failures from mutating operations that cannot locate their target.
///
/// Read operations report "nothing found" as normal text instead; these
/// errors mark operations that were refused without mutating state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Project \"{0}\" not found")]
    ProjectNotFound(String),
    #[error("Index {index} is out of range for category \"{category}\" ({len} rules)")]
    RuleIndexOutOfRange {
        category: Category,
        index: usize,
        len: usize,
    },
    #[error("Task with ID {0} not found")]
    TaskNotFound(u32),
}

/// Summary row produced for the project listing.
#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub name: String,
    pub rule_total: usize,
    pub rules_by_category: Vec<(Category, usize)>,
    pub task_count: usize,
    pub log_count: usize,
    pub has_database: bool,
}

/// The single owner of the project mapping.
///
/// Cloning is cheap; all clones share one in-memory mapping behind a mutex,
/// so at most one operation mutates state at a time.
#[derive(Clone)]
pub struct Store {
    path: PathBuf,
    data: Arc<Mutex<ProjectMap>>,
}

impl Store {
    /// Opens the store at `path`, loading whatever state the file holds.
    ///
    /// A missing, unreadable, or unparseable file yields an empty mapping —
    /// the store never refuses to start over storage problems.
    pub fn open(path: PathBuf) -> Self {
        let data = load(&path);
        Self {
            path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Opens the store file in the invoking user's home directory.
    pub fn open_default() -> anyhow::Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(Self::open(home.join(".project-context.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Explicit non-empty name wins; otherwise the final path segment of the
    /// current working directory.
    pub fn resolve_project(explicit: Option<&str>) -> String {
        if let Some(name) = explicit {
            if !name.is_empty() {
                return name.to_string();
            }
        }
        std::env::current_dir()
            .ok()
            .and_then(|cwd| {
                cwd.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "default".to_string())
    }

    fn lock(&self) -> MutexGuard<'_, ProjectMap> {
        self.data.lock().expect("store lock poisoned")
    }

    // ============================================================
    // Rule catalog
    // ============================================================

    /// Appends a rule to the category, creating the project document if it
    /// does not exist yet. Returns the category's new rule count.
    pub fn add_rule(&self, project: &str, category: Category, rule: String) -> usize {
        let mut data = self.lock();
        let doc = data.entry(project.to_string()).or_default();
        let rules = doc.context.rules_mut(category);
        rules.push(rule);
        let count = rules.len();
        self.persist(&data);
        count
    }

    /// Zero-based positional removal. Refuses without mutating when the
    /// project has no document or the index is out of range. Returns the
    /// removed rule text.
    pub fn remove_rule(
        &self,
        project: &str,
        category: Category,
        index: usize,
    ) -> Result<String, StoreError> {
        let mut data = self.lock();
        let doc = data
            .get_mut(project)
            .ok_or_else(|| StoreError::ProjectNotFound(project.to_string()))?;
        let rules = doc.context.rules_mut(category);
        if index >= rules.len() {
            return Err(StoreError::RuleIndexOutOfRange {
                category,
                index,
                len: rules.len(),
            });
        }
        let removed = rules.remove(index);
        self.persist(&data);
        Ok(removed)
    }

    /// Snapshot of one project's document. `None` when the project has never
    /// been referenced — reads do not auto-create documents.
    pub fn document(&self, project: &str) -> Option<ProjectDocument> {
        self.lock().get(project).cloned()
    }

    /// Summary of every known project, in deterministic name order.
    pub fn list_projects(&self) -> Vec<ProjectSummary> {
        let data = self.lock();
        data.iter()
            .map(|(name, doc)| ProjectSummary {
                name: name.clone(),
                rule_total: doc.context.total(),
                rules_by_category: Category::ALL
                    .iter()
                    .map(|&category| (category, doc.context.rules(category).len()))
                    .collect(),
                task_count: doc.tasks.len(),
                log_count: doc.logs.len(),
                has_database: doc.database.is_some(),
            })
            .collect()
    }

    // ============================================================
    // Task ledger
    // ============================================================

    /// Creates a pending task whose id is its creation position in the
    /// project's task sequence.
    pub fn add_task(
        &self,
        project: &str,
        title: String,
        description: Option<String>,
        priority: TaskPriority,
    ) -> Task {
        let mut data = self.lock();
        let doc = data.entry(project.to_string()).or_default();
        let now = Utc::now();
        let task = Task {
            id: doc.tasks.len() as u32,
            title,
            description,
            status: TaskStatus::Pending,
            priority,
            created_at: now,
            updated_at: now,
        };
        doc.tasks.push(task.clone());
        self.persist(&data);
        task
    }

    /// All tasks of a project in insertion order. `None` when the project has
    /// no document or no tasks at all.
    pub fn tasks(&self, project: &str) -> Option<Vec<Task>> {
        let data = self.lock();
        let doc = data.get(project)?;
        if doc.tasks.is_empty() {
            return None;
        }
        Some(doc.tasks.clone())
    }

    /// Marks the task at sequence position `task_id` as done and refreshes
    /// its update timestamp. Ids are dense creation positions, so position
    /// lookup and id lookup coincide.
    pub fn complete_task(&self, project: &str, task_id: u32) -> Result<Task, StoreError> {
        let mut data = self.lock();
        let doc = data
            .get_mut(project)
            .ok_or_else(|| StoreError::ProjectNotFound(project.to_string()))?;
        let task = doc
            .tasks
            .get_mut(task_id as usize)
            .ok_or(StoreError::TaskNotFound(task_id))?;
        task.status = TaskStatus::Done;
        task.updated_at = Utc::now();
        let task = task.clone();
        self.persist(&data);
        Ok(task)
    }

    // ============================================================
    // Event log
    // ============================================================

    /// Appends a log entry stamped with the current time.
    pub fn record_event(
        &self,
        project: &str,
        kind: LogKind,
        message: String,
        details: Option<String>,
    ) -> LogEntry {
        let mut data = self.lock();
        let doc = data.entry(project.to_string()).or_default();
        let entry = LogEntry {
            timestamp: Utc::now(),
            kind,
            message,
            details,
        };
        doc.logs.push(entry.clone());
        self.persist(&data);
        entry
    }

    /// The `limit` most recent entries of the (optionally kind-filtered) log,
    /// newest first. `None` when the project has no document or no entries
    /// at all.
    pub fn history(
        &self,
        project: &str,
        kind: Option<LogKind>,
        limit: usize,
    ) -> Option<Vec<LogEntry>> {
        let data = self.lock();
        let doc = data.get(project)?;
        if doc.logs.is_empty() {
            return None;
        }
        let filtered: Vec<LogEntry> = doc
            .logs
            .iter()
            .filter(|entry| kind.map_or(true, |k| entry.kind == k))
            .cloned()
            .collect();
        let tail_start = filtered.len().saturating_sub(limit);
        let mut recent = filtered[tail_start..].to_vec();
        recent.reverse();
        Some(recent)
    }

    // ============================================================
    // Database descriptor
    // ============================================================

    /// Stores the connection descriptor, replacing any previous one in full.
    pub fn set_database(&self, project: &str, config: DatabaseConfig) {
        let mut data = self.lock();
        data.entry(project.to_string()).or_default().database = Some(config);
        self.persist(&data);
    }

    pub fn database(&self, project: &str) -> Option<DatabaseConfig> {
        self.lock().get(project).and_then(|doc| doc.database.clone())
    }

    // ============================================================
    // Persistence
    // ============================================================

    /// Rewrites the whole store file. Failure is logged and swallowed: the
    /// in-memory mutation stands and the caller's workflow is not blocked.
    fn persist(&self, data: &ProjectMap) {
        let json = match serde_json::to_string_pretty(data) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!("Could not serialize store: {err}");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, json) {
            tracing::error!(
                "Could not write store file {}: {err}",
                self.path.display()
            );
        }
    }
}

fn load(path: &Path) -> ProjectMap {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!(
                    "Could not parse store file {}: {err}; starting with an empty store",
                    path.display()
                );
                ProjectMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => ProjectMap::new(),
        Err(err) => {
            tracing::warn!(
                "Could not read store file {}: {err}; starting with an empty store",
                path.display()
            );
            ProjectMap::new()
        }
    }
}
