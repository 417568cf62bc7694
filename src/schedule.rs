//! Critical path / scheduling engine
//!
//! Classic CPM over the task dependency graph: earliest/latest start times,
//! slack, the duration-weighted longest path, bottlenecks, and near-critical
//! tasks. The critical path is found with a single longest-path pass over
//! the topologically-sorted DAG (earliest finish doubles as the path
//! weight), so the cost is linear in nodes + edges.
//!
//! Malformed dependency data is user error, not system error: cycles are
//! broken heuristically before the passes run (see
//! [`DependencyGraph::break_cycles`]) and the removed edges are reported on
//! the result.

use petgraph::graph::NodeIndex;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::config::Thresholds;
use crate::graph::DependencyGraph;
use crate::model::Task;

/// Tolerance for float comparisons on accumulated durations.
const EPSILON: f64 = 1e-9;

/// Result of a critical-path analysis pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriticalPathResult {
    /// Task IDs along the duration-weighted longest path, in order.
    pub path: Vec<String>,
    /// Total duration along `path` — the minimum project duration.
    pub total_duration: f64,
    /// Earliest start time per task.
    pub earliest_start: HashMap<String, f64>,
    /// Latest start time per task without delaying the project end.
    pub latest_start: HashMap<String, f64>,
    /// `latest_start − earliest_start` per task; 0 on the critical path.
    pub slack: HashMap<String, f64>,
    /// Critical-path tasks whose duration exceeds
    /// `bottleneck_factor × mean(path durations)`, in path order.
    pub bottlenecks: Vec<String>,
    /// Non-critical tasks with `0 < slack ≤ near_critical_slack`.
    pub near_critical: Vec<String>,
    /// Dependency edges dropped to break cycles, as (from, to) pairs.
    pub removed_edges: Vec<(String, String)>,
}

impl CriticalPathResult {
    /// The critical-path task IDs as a set.
    pub fn critical_ids(&self) -> HashSet<String> {
        self.path.iter().cloned().collect()
    }

    pub fn is_critical(&self, id: &str) -> bool {
        self.path.iter().any(|p| p == id)
    }
}

/// Computes the critical path with default thresholds.
pub fn compute_critical_path(tasks: &[Task]) -> CriticalPathResult {
    compute_critical_path_with(tasks, &Thresholds::default())
}

/// Computes the critical path, ES/LS/slack, bottlenecks, and near-critical
/// tasks in one graph build.
pub fn compute_critical_path_with(tasks: &[Task], thresholds: &Thresholds) -> CriticalPathResult {
    if tasks.is_empty() {
        return CriticalPathResult::default();
    }

    let mut graph = DependencyGraph::build(tasks);
    let (order, removed_edges) = graph.break_cycles();

    // Forward pass: earliest start, earliest finish.
    let mut es: HashMap<NodeIndex, f64> = HashMap::with_capacity(order.len());
    let mut ef: HashMap<NodeIndex, f64> = HashMap::with_capacity(order.len());
    for &node in &order {
        let start = graph
            .neighbors_idx(node, Direction::Incoming)
            .into_iter()
            .filter_map(|p| ef.get(&p).copied())
            .fold(0.0_f64, f64::max);
        es.insert(node, start);
        ef.insert(node, start + graph.duration_idx(node));
    }
    let project_duration = ef.values().fold(0.0_f64, |acc, &v| acc.max(v));

    // Backward pass: latest start.
    let mut ls: HashMap<NodeIndex, f64> = HashMap::with_capacity(order.len());
    for &node in order.iter().rev() {
        let successors = graph.neighbors_idx(node, Direction::Outgoing);
        let latest_finish = if successors.is_empty() {
            project_duration
        } else {
            successors
                .into_iter()
                .filter_map(|s| ls.get(&s).copied())
                .fold(f64::INFINITY, f64::min)
        };
        ls.insert(node, latest_finish - graph.duration_idx(node));
    }

    // Longest path: earliest finish is exactly the path weight, so the
    // endpoint is the first node (insertion order) reaching the project
    // duration, and the path walks back through the first predecessor whose
    // finish matches the current start. First-match keeps ties stable.
    let endpoint = graph
        .node_indices_ordered()
        .into_iter()
        .find(|n| ef.get(n).is_some_and(|&v| (v - project_duration).abs() < EPSILON));
    let mut path_idx: Vec<NodeIndex> = Vec::new();
    if let Some(end) = endpoint {
        let mut current = end;
        path_idx.push(current);
        loop {
            let target = es.get(&current).copied().unwrap_or(0.0);
            let along = graph
                .neighbors_idx(current, Direction::Incoming)
                .into_iter()
                .find(|p| ef.get(p).is_some_and(|&v| (v - target).abs() < EPSILON));
            match along {
                Some(pred) => {
                    path_idx.push(pred);
                    current = pred;
                }
                None => break,
            }
        }
        path_idx.reverse();
    }
    let path: Vec<String> = path_idx.iter().map(|&n| graph.id_of(n).to_string()).collect();
    let path_set: HashSet<&str> = path.iter().map(String::as_str).collect();

    // Per-task maps keyed by ID.
    let mut earliest_start = HashMap::with_capacity(order.len());
    let mut latest_start = HashMap::with_capacity(order.len());
    let mut slack = HashMap::with_capacity(order.len());
    for &node in &order {
        let id = graph.id_of(node).to_string();
        let e = es.get(&node).copied().unwrap_or(0.0);
        let l = ls.get(&node).copied().unwrap_or(0.0);
        earliest_start.insert(id.clone(), e);
        latest_start.insert(id.clone(), l);
        slack.insert(id, l - e);
    }

    // Bottlenecks relative to the mean duration on the path itself.
    let mut bottlenecks = Vec::new();
    if !path.is_empty() {
        let mean = path.iter().map(|id| graph.duration_of(id)).sum::<f64>() / path.len() as f64;
        bottlenecks = path
            .iter()
            .filter(|id| graph.duration_of(id.as_str()) > thresholds.bottleneck_factor * mean)
            .cloned()
            .collect();
    }

    let near_critical: Vec<String> = graph
        .task_ids()
        .into_iter()
        .filter(|id| !path_set.contains(id))
        .filter(|id| {
            slack
                .get(*id)
                .is_some_and(|&s| s > EPSILON && s <= thresholds.near_critical_slack + EPSILON)
        })
        .map(str::to_string)
        .collect();

    debug!(
        tasks = tasks.len(),
        path_len = path.len(),
        total_duration = project_duration,
        removed = removed_edges.len(),
        "critical path computed"
    );

    CriticalPathResult {
        path,
        total_duration: project_duration,
        earliest_start,
        latest_start,
        slack,
        bottlenecks,
        near_critical,
        removed_edges,
    }
}

// =============================================================================
// Advanced schedule
// =============================================================================

/// One per-task row of the advanced schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub task_id: String,
    pub task_name: String,
    pub duration: f64,
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
    pub slack: f64,
    pub is_critical: bool,
}

/// A critical-path task disproportionately long against the project-wide
/// mean duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleneckDetail {
    pub task_id: String,
    pub task_name: String,
    pub duration: f64,
    pub average_duration: f64,
    /// duration ÷ project-wide mean duration.
    pub impact_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearCriticalDetail {
    pub task_id: String,
    pub task_name: String,
    pub slack: f64,
}

/// Aggregate figures for the schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectStatistics {
    pub total_tasks: usize,
    pub critical_path_tasks: usize,
    /// Fraction of tasks on the critical path.
    pub critical_ratio: f64,
    pub duration_on_critical_path: f64,
    /// Project duration equals the critical-path duration.
    pub total_project_duration: f64,
    pub average_slack: f64,
}

/// Per-task schedule rows plus project statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvancedSchedule {
    pub rows: Vec<ScheduleRow>,
    pub bottlenecks: Vec<BottleneckDetail>,
    pub near_critical: Vec<NearCriticalDetail>,
    pub statistics: ProjectStatistics,
}

/// Computes the advanced schedule with default thresholds.
pub fn compute_advanced_schedule(tasks: &[Task]) -> AdvancedSchedule {
    compute_advanced_schedule_with(tasks, &Thresholds::default())
}

/// Computes the advanced schedule (one fresh critical-path pass).
pub fn compute_advanced_schedule_with(tasks: &[Task], thresholds: &Thresholds) -> AdvancedSchedule {
    let cp = compute_critical_path_with(tasks, thresholds);
    AdvancedSchedule::from_critical_path(tasks, &cp, thresholds)
}

impl AdvancedSchedule {
    /// Builds schedule rows and statistics from an existing critical-path
    /// result, avoiding a second graph build within one analysis pass.
    pub fn from_critical_path(
        tasks: &[Task],
        cp: &CriticalPathResult,
        thresholds: &Thresholds,
    ) -> Self {
        let critical: HashSet<&str> = cp.path.iter().map(String::as_str).collect();
        let names: HashMap<&str, &str> = tasks
            .iter()
            .map(|t| (t.id.as_str(), t.name.as_str()))
            .collect();

        let rows: Vec<ScheduleRow> = tasks
            .iter()
            .map(|task| {
                let es = cp.earliest_start.get(&task.id).copied().unwrap_or(0.0);
                let ls = cp.latest_start.get(&task.id).copied().unwrap_or(0.0);
                ScheduleRow {
                    task_id: task.id.clone(),
                    task_name: task.name.clone(),
                    duration: task.duration,
                    earliest_start: es,
                    earliest_finish: es + task.duration,
                    latest_start: ls,
                    latest_finish: ls + task.duration,
                    slack: cp.slack.get(&task.id).copied().unwrap_or(0.0),
                    is_critical: critical.contains(task.id.as_str()),
                }
            })
            .collect();

        // Bottleneck detail uses the project-wide mean, unlike
        // CriticalPathResult::bottlenecks which is relative to the path.
        let mut bottlenecks = Vec::new();
        if !tasks.is_empty() {
            let average = tasks.iter().map(|t| t.duration).sum::<f64>() / tasks.len() as f64;
            for id in &cp.path {
                let Some(task) = tasks.iter().find(|t| &t.id == id) else {
                    continue;
                };
                if task.duration > thresholds.bottleneck_factor * average {
                    bottlenecks.push(BottleneckDetail {
                        task_id: task.id.clone(),
                        task_name: task.name.clone(),
                        duration: task.duration,
                        average_duration: average,
                        impact_factor: task.duration / average,
                    });
                }
            }
        }

        let near_critical: Vec<NearCriticalDetail> = cp
            .near_critical
            .iter()
            .map(|id| NearCriticalDetail {
                task_id: id.clone(),
                task_name: names.get(id.as_str()).unwrap_or(&"").to_string(),
                slack: cp.slack.get(id).copied().unwrap_or(0.0),
            })
            .collect();

        let average_slack = if cp.slack.is_empty() {
            0.0
        } else {
            cp.slack.values().sum::<f64>() / cp.slack.len() as f64
        };
        let statistics = ProjectStatistics {
            total_tasks: tasks.len(),
            critical_path_tasks: cp.path.len(),
            critical_ratio: if tasks.is_empty() {
                0.0
            } else {
                cp.path.len() as f64 / tasks.len() as f64
            },
            duration_on_critical_path: cp.total_duration,
            total_project_duration: cp.total_duration,
            average_slack,
        };

        Self { rows, bottlenecks, near_critical, statistics }
    }
}
