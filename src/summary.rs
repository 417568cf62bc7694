//! Project summary aggregation
//!
//! Headline figures over the canonical task list: counts by status,
//! completion percentage, total duration, dominant duration unit, and the
//! resource-allocation map. The total duration is the plain sum of task
//! durations — parallelism is ignored here; the scheduling engine owns the
//! real project duration.

use serde::{Deserialize, Serialize};

use crate::model::{Task, TaskStatus};

/// Task counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub delayed: usize,
    pub cancelled: usize,
}

/// How many tasks each resource is assigned to, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub resource: String,
    pub task_count: usize,
}

/// Headline project figures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub task_count: usize,
    /// Plain sum of task durations (ignores parallelism).
    pub total_duration: f64,
    /// Most common duration unit across tasks, "days" when there are none.
    pub duration_unit: String,
    pub status_counts: StatusCounts,
    /// Completed ÷ total × 100, rounded to one decimal.
    pub completion_percentage: f64,
    pub resource_allocation: Vec<ResourceAllocation>,
}

/// Summarizes a task list.
pub fn summarize(tasks: &[Task]) -> ProjectSummary {
    let mut status_counts = StatusCounts::default();
    for task in tasks {
        match task.status {
            TaskStatus::NotStarted => status_counts.not_started += 1,
            TaskStatus::InProgress => status_counts.in_progress += 1,
            TaskStatus::Completed => status_counts.completed += 1,
            TaskStatus::Delayed => status_counts.delayed += 1,
            TaskStatus::Cancelled => status_counts.cancelled += 1,
        }
    }

    let completion_percentage = if tasks.is_empty() {
        0.0
    } else {
        let raw = status_counts.completed as f64 / tasks.len() as f64 * 100.0;
        (raw * 10.0).round() / 10.0
    };

    let mut unit_counts: Vec<(&str, usize)> = Vec::new();
    for task in tasks {
        match unit_counts.iter_mut().find(|(u, _)| *u == task.duration_unit) {
            Some((_, n)) => *n += 1,
            None => unit_counts.push((task.duration_unit.as_str(), 1)),
        }
    }
    // first-seen unit wins ties, so strictly-greater only
    let mut dominant: Option<(&str, usize)> = None;
    for (unit, n) in &unit_counts {
        if dominant.map_or(true, |(_, best)| *n > best) {
            dominant = Some((*unit, *n));
        }
    }
    let duration_unit = dominant
        .map(|(u, _)| u.to_string())
        .unwrap_or_else(|| "days".to_string());

    let mut resource_allocation: Vec<ResourceAllocation> = Vec::new();
    for task in tasks {
        for resource in &task.resources {
            let name = resource.trim();
            if name.is_empty() {
                continue;
            }
            match resource_allocation.iter_mut().find(|a| a.resource == name) {
                Some(entry) => entry.task_count += 1,
                None => resource_allocation.push(ResourceAllocation {
                    resource: name.to_string(),
                    task_count: 1,
                }),
            }
        }
    }

    ProjectSummary {
        task_count: tasks.len(),
        total_duration: tasks.iter().map(|t| t.duration).sum(),
        duration_unit,
        status_counts,
        completion_percentage,
        resource_allocation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.task_count, 0);
        assert_eq!(summary.total_duration, 0.0);
        assert_eq!(summary.duration_unit, "days");
        assert_eq!(summary.completion_percentage, 0.0);
        assert!(summary.resource_allocation.is_empty());
    }

    #[test]
    fn test_counts_and_completion() {
        let tasks = vec![
            Task::new("a").with_status(TaskStatus::Completed).with_duration(2.0),
            Task::new("b").with_status(TaskStatus::Completed),
            Task::new("c").with_status(TaskStatus::InProgress),
            Task::new("d").with_status(TaskStatus::Delayed),
        ];
        let summary = summarize(&tasks);
        assert_eq!(summary.task_count, 4);
        assert_eq!(summary.status_counts.completed, 2);
        assert_eq!(summary.status_counts.in_progress, 1);
        assert_eq!(summary.status_counts.delayed, 1);
        assert_eq!(summary.completion_percentage, 50.0);
        assert_eq!(summary.total_duration, 5.0);
    }

    #[test]
    fn test_completion_rounds_to_one_decimal() {
        let tasks = vec![
            Task::new("a").with_status(TaskStatus::Completed),
            Task::new("b"),
            Task::new("c"),
        ];
        // 1/3 = 33.333... -> 33.3
        assert_eq!(summarize(&tasks).completion_percentage, 33.3);
    }

    #[test]
    fn test_resource_allocation_first_seen_order() {
        let tasks = vec![
            Task::new("a").with_resource("Bob").with_resource("Alice"),
            Task::new("b").with_resource("Alice").with_resource(" "),
        ];
        let summary = summarize(&tasks);
        assert_eq!(
            summary.resource_allocation,
            vec![
                ResourceAllocation { resource: "Bob".to_string(), task_count: 1 },
                ResourceAllocation { resource: "Alice".to_string(), task_count: 2 },
            ]
        );
    }

    #[test]
    fn test_dominant_duration_unit() {
        let mut tasks = vec![Task::new("a"), Task::new("b"), Task::new("c")];
        tasks[1].duration_unit = "weeks".to_string();
        tasks[2].duration_unit = "weeks".to_string();
        // "days" appears once, "weeks" twice
        assert_eq!(summarize(&tasks).duration_unit, "weeks");
    }
}
