//! Canonical project model
//!
//! The normalized form every analysis consumes: a flat task list plus
//! project metadata. Produced by [`crate::normalize`]; field defaults and
//! coercion rules live there, not here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single task after normalization.
///
/// IDs are unique and non-empty within a project. Dependencies are
/// predecessor task IDs in source order and may reference IDs that do not
/// exist — the graph builder drops those silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Free-text description (empty when the source has none).
    #[serde(default)]
    pub description: String,
    /// Estimated duration, ≥ 0.
    pub duration: f64,
    /// Unit the duration is expressed in ("days" unless the source says otherwise).
    pub duration_unit: String,
    /// Predecessor task IDs.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Assigned resource names.
    #[serde(default)]
    pub resources: Vec<String>,
    /// Normalized status.
    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    /// Creates a task with defaults matching the normalizer's
    /// (duration 1, unit "days", status not started).
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: format!("Task {id}"),
            id,
            description: String::new(),
            duration: 1.0,
            duration_unit: "days".to_string(),
            dependencies: Vec::new(),
            resources: Vec::new(),
            status: TaskStatus::NotStarted,
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the estimated duration.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Adds a predecessor task ID.
    pub fn with_dependency(mut self, dep: impl Into<String>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    /// Adds an assigned resource.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resources.push(resource.into());
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether any non-blank resource is assigned.
    pub fn has_assigned_resources(&self) -> bool {
        self.resources.iter().any(|r| !r.trim().is_empty())
    }

    /// Whether this task has no predecessors (a project-start task).
    pub fn is_source(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// Normalized task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Delayed,
    Cancelled,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Delayed => "delayed",
            TaskStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// A date field as found in the source document.
///
/// `Parsed` when one of the recognized calendar formats matched,
/// `Raw` preserving the input text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Parsed(NaiveDate),
    Raw(String),
}

/// Project-level metadata, each field independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateValue>,
}

/// Output of [`crate::normalize::normalize`]: the canonical task list,
/// project metadata, and a fingerprint of the raw input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedProject {
    pub metadata: ProjectMetadata,
    pub tasks: Vec<Task>,
    /// SHA-256 hex digest of the raw document's serialization.
    /// Stable for identical input; intended for external bookkeeping.
    pub fingerprint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder_defaults() {
        let task = Task::new("t1");
        assert_eq!(task.id, "t1");
        assert_eq!(task.name, "Task t1");
        assert_eq!(task.duration, 1.0);
        assert_eq!(task.duration_unit, "days");
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert!(task.is_source());
        assert!(!task.has_assigned_resources());
    }

    #[test]
    fn test_blank_resources_not_assigned() {
        let task = Task::new("t1").with_resource("  ").with_resource("");
        assert!(!task.has_assigned_resources());
        let task = task.with_resource("Alice");
        assert!(task.has_assigned_resources());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(TaskStatus::NotStarted.to_string(), "not_started");
    }

    #[test]
    fn test_date_value_untagged() {
        let parsed = DateValue::Parsed(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"2024-03-01\"");
        let raw = DateValue::Raw("next quarter".to_string());
        assert_eq!(serde_json::to_string(&raw).unwrap(), "\"next quarter\"");
    }
}
