//! Cross-checks a proposed change against a project's protected-file
//! patterns and composes the review report.
//!
//! Validation performs no mutation and persists nothing.

use regex::Regex;

use crate::models::{Category, ProjectDocument};

/// Categories whose rules appear in the consolidated digest, in order.
/// Protected-file patterns, general context, and server configuration are
/// deliberately left out of the digest.
const DIGEST_CATEGORIES: [Category; 4] = [
    Category::BusinessRules,
    Category::CodeStandards,
    Category::Architecture,
    Category::DeployRules,
];

/// One (file, pattern) conflict. A file matched by several patterns produces
/// one warning per pattern; duplicates are retained, not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub file: String,
    pub pattern: String,
}

/// The outcome of validating a proposed change against a project's rules.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub project: String,
    pub description: String,
    pub files: Vec<String>,
    pub warnings: Vec<Warning>,
    pub rules: Vec<(Category, String)>,
}

/// A pattern flags a path when it occurs as a literal substring of the path
/// or when the path matches it as a regular expression. Both checks apply to
/// every pattern; a pattern that does not compile as a regex keeps the
/// substring check only.
fn matches_pattern(path: &str, pattern: &str) -> bool {
    if path.contains(pattern) {
        return true;
    }
    match Regex::new(pattern) {
        Ok(re) => re.is_match(path),
        Err(err) => {
            tracing::debug!("protected-file pattern {pattern:?} is not a valid regex: {err}");
            false
        }
    }
}

pub fn validate(
    project: &str,
    doc: &ProjectDocument,
    description: &str,
    files: &[String],
) -> ValidationReport {
    let mut warnings = Vec::new();
    for file in files {
        for pattern in &doc.context.protected_files {
            if matches_pattern(file, pattern) {
                warnings.push(Warning {
                    file: file.clone(),
                    pattern: pattern.clone(),
                });
            }
        }
    }

    let mut rules = Vec::new();
    for category in DIGEST_CATEGORIES {
        for rule in doc.context.rules(category) {
            rules.push((category, rule.clone()));
        }
    }

    ValidationReport {
        project: project.to_string(),
        description: description.to_string(),
        files: files.to_vec(),
        warnings,
        rules,
    }
}

impl ValidationReport {
    /// Renders the human-readable review report.
    pub fn render(&self) -> String {
        let mut out = format!("# Change Validation - {}\n\n", self.project);
        out.push_str(&format!("## Described Changes\n{}\n\n", self.description));

        if !self.files.is_empty() {
            out.push_str("## Affected Files\n");
            for file in &self.files {
                out.push_str(&format!("- {file}\n"));
            }
            out.push('\n');
        }

        if !self.warnings.is_empty() {
            out.push_str("## ⚠️ Warnings\n");
            for warning in &self.warnings {
                out.push_str(&format!(
                    "⚠️ Protected file will be modified: {} (rule: {})\n",
                    warning.file, warning.pattern
                ));
            }
            out.push('\n');
        }

        out.push_str("## Rules to Consider\n\n");
        if self.rules.is_empty() {
            out.push_str("No specific rules defined.\n");
        } else {
            for (category, rule) in &self.rules {
                out.push_str(&format!("- [{}] {rule}\n", category.label()));
            }
        }

        out.push('\n');
        out.push_str(if self.warnings.is_empty() {
            "✓ No conflicts detected with protected files."
        } else {
            "⚠️ Review the warnings above before proceeding."
        });
        out
    }
}
