//! Heuristic risk analysis
//!
//! Seven independent detectors over the normalized task list and the
//! critical-path ID set, aggregated into weighted category scores, an overall
//! ordinal risk level, and template-generated recommendations. Every detector
//! is total: any well-formed task list, including the empty one, produces a
//! report, never an error.
//!
//! Flagged entities touching the critical path are rated High; the remaining
//! ratings follow per-detector rules. The parallel-task grouping is a greedy,
//! order-dependent heuristic, deliberately not an exact independent-set
//! computation — exactness would change the reported counts.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::config::Thresholds;
use crate::model::Task;

/// Ordinal risk rating for one flagged entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Overall project risk level, derived from the total flag count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallRisk {
    VeryLow,
    Low,
    Medium,
    High,
}

impl std::fmt::Display for OverallRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OverallRisk::VeryLow => "Very Low",
            OverallRisk::Low => "Low",
            OverallRisk::Medium => "Medium",
            OverallRisk::High => "High",
        };
        write!(f, "{s}")
    }
}

/// A task flagged by a detector with no extra context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFlag {
    pub task_id: String,
    pub task_name: String,
    pub risk_level: RiskLevel,
}

/// A task whose duration dwarfs the project-wide average.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleneckRisk {
    pub task_id: String,
    pub task_name: String,
    pub duration: f64,
    pub average_duration: f64,
    /// duration ÷ average_duration.
    pub duration_ratio: f64,
    pub risk_level: RiskLevel,
}

/// A resource assigned to more tasks than the overload threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverloadedResource {
    pub resource: String,
    pub task_count: usize,
    pub task_ids: Vec<String>,
    /// How many of its tasks sit on the critical path.
    pub critical_tasks: usize,
    pub risk_level: RiskLevel,
}

/// A complex task (many dependencies or resources) with a short duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineRisk {
    pub task_id: String,
    pub task_name: String,
    pub duration: f64,
    pub dependency_count: usize,
    pub resource_count: usize,
    pub reason: String,
    pub risk_level: RiskLevel,
}

/// A task whose recursively-expanded dependency chain is too long.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongChainRisk {
    pub task_id: String,
    pub task_name: String,
    pub chain: Vec<String>,
    pub risk_level: RiskLevel,
}

/// A resource shared by a group of tasks that could run in parallel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConflict {
    pub resource: String,
    pub task_ids: Vec<String>,
    pub critical_tasks: usize,
    pub risk_level: RiskLevel,
}

/// Weighted per-category risk scores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskScores {
    pub resource_risks: u32,
    pub dependency_risks: u32,
    pub timeline_risks: u32,
    pub resource_conflicts: u32,
}

/// Cross-detector risk metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Resource-less and bottleneck flags sitting on the critical path.
    pub critical_path_risk_count: usize,
    pub resource_risk_ratio: f64,
    pub dependency_risk_ratio: f64,
    /// 3 × high + 2 × medium + 1 × low.
    pub total_risk_score: u32,
}

/// Full risk analysis output. Holds no reference back to the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub total_risks: usize,
    pub risk_level: OverallRisk,
    pub scores: RiskScores,
    pub metrics: RiskMetrics,
    pub no_resources: Vec<TaskFlag>,
    pub no_dependencies: Vec<TaskFlag>,
    pub bottlenecks: Vec<BottleneckRisk>,
    pub overloaded_resources: Vec<OverloadedResource>,
    pub timeline_risks: Vec<TimelineRisk>,
    pub dependency_conflicts: Vec<LongChainRisk>,
    pub resource_conflicts: Vec<ResourceConflict>,
    pub recommendations: Vec<String>,
}

/// Analyzes risks with default thresholds.
pub fn analyze_risks(tasks: &[Task], critical_path_ids: &HashSet<String>) -> RiskReport {
    RiskAnalyzer::new(tasks, critical_path_ids.clone()).analyze()
}

/// Risk detector runner over one task list and critical-path ID set.
pub struct RiskAnalyzer<'a> {
    tasks: &'a [Task],
    critical_ids: HashSet<String>,
    thresholds: Thresholds,
}

impl<'a> RiskAnalyzer<'a> {
    pub fn new(tasks: &'a [Task], critical_path_ids: HashSet<String>) -> Self {
        Self {
            tasks,
            critical_ids: critical_path_ids,
            thresholds: Thresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Runs all seven detectors and aggregates the report.
    pub fn analyze(&self) -> RiskReport {
        let no_resources = self.tasks_without_resources();
        let no_dependencies = self.orphan_tasks();
        let bottlenecks = self.detect_bottlenecks();
        let overloaded_resources = self.detect_overloaded_resources();
        let timeline_risks = self.detect_timeline_risks();
        let dependency_conflicts = self.detect_long_chains();
        let resource_conflicts = self.detect_resource_conflicts();

        let total_risks = no_resources.len()
            + no_dependencies.len()
            + bottlenecks.len()
            + overloaded_resources.len()
            + timeline_risks.len()
            + dependency_conflicts.len()
            + resource_conflicts.len();

        let scores = RiskScores {
            resource_risks: 10 * no_resources.len() as u32
                + 15 * overloaded_resources.len() as u32,
            dependency_risks: 5 * no_dependencies.len() as u32
                + 20 * dependency_conflicts.len() as u32,
            timeline_risks: 15 * bottlenecks.len() as u32 + 10 * timeline_risks.len() as u32,
            resource_conflicts: 20 * resource_conflicts.len() as u32,
        };

        let risk_level = match total_risks {
            0 => OverallRisk::VeryLow,
            1..=2 => OverallRisk::Low,
            3..=5 => OverallRisk::Medium,
            _ => OverallRisk::High,
        };

        let metrics = self.compute_metrics(
            &no_resources,
            &no_dependencies,
            &bottlenecks,
            &overloaded_resources,
            &timeline_risks,
            &dependency_conflicts,
            &resource_conflicts,
        );

        let recommendations = self.recommendations(
            &no_resources,
            &no_dependencies,
            &bottlenecks,
            &overloaded_resources,
            &timeline_risks,
            &dependency_conflicts,
            &resource_conflicts,
        );

        debug!(total_risks, level = %risk_level, "risk analysis complete");

        RiskReport {
            total_risks,
            risk_level,
            scores,
            metrics,
            no_resources,
            no_dependencies,
            bottlenecks,
            overloaded_resources,
            timeline_risks,
            dependency_conflicts,
            resource_conflicts,
            recommendations,
        }
    }

    fn level_for(&self, task_id: &str) -> RiskLevel {
        if self.critical_ids.contains(task_id) {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }

    // =========================================================================
    // Detectors
    // =========================================================================

    /// Tasks with no (or only blank) resources assigned.
    fn tasks_without_resources(&self) -> Vec<TaskFlag> {
        self.tasks
            .iter()
            .filter(|t| !t.has_assigned_resources())
            .map(|t| TaskFlag {
                task_id: t.id.clone(),
                task_name: t.name.clone(),
                risk_level: self.level_for(&t.id),
            })
            .collect()
    }

    /// Tasks that are neither project-start tasks nor named as anyone's
    /// dependency — possibly disconnected from the project flow.
    fn orphan_tasks(&self) -> Vec<TaskFlag> {
        let referenced: HashSet<&str> = self
            .tasks
            .iter()
            .flat_map(|t| t.dependencies.iter().map(String::as_str))
            .collect();

        self.tasks
            .iter()
            .filter(|t| !t.is_source() && !referenced.contains(t.id.as_str()))
            .map(|t| TaskFlag {
                task_id: t.id.clone(),
                task_name: t.name.clone(),
                risk_level: RiskLevel::Low,
            })
            .collect()
    }

    /// Tasks significantly longer than the project-wide average duration.
    fn detect_bottlenecks(&self) -> Vec<BottleneckRisk> {
        if self.tasks.is_empty() {
            return Vec::new();
        }
        let average =
            self.tasks.iter().map(|t| t.duration).sum::<f64>() / self.tasks.len() as f64;
        let threshold = self.thresholds.bottleneck_factor * average;

        self.tasks
            .iter()
            .filter(|t| t.duration > threshold)
            .map(|t| BottleneckRisk {
                task_id: t.id.clone(),
                task_name: t.name.clone(),
                duration: t.duration,
                average_duration: average,
                duration_ratio: t.duration / average,
                risk_level: self.level_for(&t.id),
            })
            .collect()
    }

    /// Resources assigned to more tasks than the overload threshold.
    fn detect_overloaded_resources(&self) -> Vec<OverloadedResource> {
        let assignments = self.resource_assignments();

        assignments
            .into_iter()
            .filter(|(_, tasks)| tasks.len() > self.thresholds.overload_task_count)
            .map(|(resource, tasks)| {
                let critical_tasks = tasks
                    .iter()
                    .filter(|t| self.critical_ids.contains(&t.id))
                    .count();
                OverloadedResource {
                    resource,
                    task_count: tasks.len(),
                    task_ids: tasks.iter().map(|t| t.id.clone()).collect(),
                    critical_tasks,
                    risk_level: if critical_tasks > 0 { RiskLevel::High } else { RiskLevel::Medium },
                }
            })
            .collect()
    }

    /// Complex tasks (many dependencies or resources) squeezed into short
    /// durations. Zero-duration tasks are milestones and skipped.
    fn detect_timeline_risks(&self) -> Vec<TimelineRisk> {
        let complexity = self.thresholds.complexity_threshold;
        self.tasks
            .iter()
            .filter(|t| t.duration > 0.0 && t.duration < self.thresholds.short_duration)
            .filter(|t| t.dependencies.len() > complexity || t.resources.len() > complexity)
            .map(|t| TimelineRisk {
                task_id: t.id.clone(),
                task_name: t.name.clone(),
                duration: t.duration,
                dependency_count: t.dependencies.len(),
                resource_count: t.resources.len(),
                reason: "Duration likely underestimated for a task of this complexity"
                    .to_string(),
                risk_level: self.level_for(&t.id),
            })
            .collect()
    }

    /// Tasks whose recursively-expanded dependency chain exceeds the limit.
    fn detect_long_chains(&self) -> Vec<LongChainRisk> {
        let dep_map: HashMap<&str, &[String]> = self
            .tasks
            .iter()
            .map(|t| (t.id.as_str(), t.dependencies.as_slice()))
            .collect();

        self.tasks
            .iter()
            .filter_map(|t| {
                let chain = expand_chain(&t.id, &dep_map, &HashSet::new());
                (chain.len() > self.thresholds.long_chain_length).then(|| LongChainRisk {
                    task_id: t.id.clone(),
                    task_name: t.name.clone(),
                    chain,
                    risk_level: self.level_for(&t.id),
                })
            })
            .collect()
    }

    /// Groups of tasks sharing a resource that are heuristically parallel
    /// (neither depends on the group's seed task, nor it on them).
    fn detect_resource_conflicts(&self) -> Vec<ResourceConflict> {
        let mut conflicts = Vec::new();

        for (resource, tasks) in self.resource_assignments() {
            if tasks.len() < 2 {
                continue;
            }
            for group in parallel_groups(&tasks) {
                let critical_tasks = group
                    .iter()
                    .filter(|t| self.critical_ids.contains(&t.id))
                    .count();
                conflicts.push(ResourceConflict {
                    resource: resource.clone(),
                    task_ids: group.iter().map(|t| t.id.clone()).collect(),
                    critical_tasks,
                    risk_level: if critical_tasks > 0 { RiskLevel::High } else { RiskLevel::Medium },
                });
            }
        }
        conflicts
    }

    /// resource → assigned tasks, resources in first-seen order, blank names
    /// skipped.
    fn resource_assignments(&self) -> Vec<(String, Vec<&'a Task>)> {
        let mut assignments: Vec<(String, Vec<&Task>)> = Vec::new();
        for task in self.tasks {
            for resource in &task.resources {
                let name = resource.trim();
                if name.is_empty() {
                    continue;
                }
                match assignments.iter_mut().find(|(r, _)| r == name) {
                    Some((_, tasks)) => tasks.push(task),
                    None => assignments.push((name.to_string(), vec![task])),
                }
            }
        }
        assignments
    }

    // =========================================================================
    // Aggregation
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    fn compute_metrics(
        &self,
        no_resources: &[TaskFlag],
        no_dependencies: &[TaskFlag],
        bottlenecks: &[BottleneckRisk],
        overloaded: &[OverloadedResource],
        timeline: &[TimelineRisk],
        chains: &[LongChainRisk],
        conflicts: &[ResourceConflict],
    ) -> RiskMetrics {
        let mut high = 0;
        let mut medium = 0;
        let mut low = 0;
        let levels = no_resources
            .iter()
            .map(|r| r.risk_level)
            .chain(no_dependencies.iter().map(|r| r.risk_level))
            .chain(bottlenecks.iter().map(|r| r.risk_level))
            .chain(overloaded.iter().map(|r| r.risk_level))
            .chain(timeline.iter().map(|r| r.risk_level))
            .chain(chains.iter().map(|r| r.risk_level))
            .chain(conflicts.iter().map(|r| r.risk_level));
        for level in levels {
            match level {
                RiskLevel::High => high += 1,
                RiskLevel::Medium => medium += 1,
                RiskLevel::Low => low += 1,
            }
        }

        let critical_path_risk_count = no_resources
            .iter()
            .map(|r| r.task_id.as_str())
            .chain(bottlenecks.iter().map(|r| r.task_id.as_str()))
            .filter(|id| self.critical_ids.contains(*id))
            .count();

        let task_count = self.tasks.len();
        let ratio = |n: usize| if task_count == 0 { 0.0 } else { n as f64 / task_count as f64 };

        RiskMetrics {
            high,
            medium,
            low,
            critical_path_risk_count,
            resource_risk_ratio: ratio(no_resources.len()),
            dependency_risk_ratio: ratio(no_dependencies.len()),
            total_risk_score: 3 * high as u32 + 2 * medium as u32 + low as u32,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn recommendations(
        &self,
        no_resources: &[TaskFlag],
        no_dependencies: &[TaskFlag],
        bottlenecks: &[BottleneckRisk],
        overloaded: &[OverloadedResource],
        timeline: &[TimelineRisk],
        chains: &[LongChainRisk],
        conflicts: &[ResourceConflict],
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        match no_resources {
            [] => {}
            [only] => recommendations.push(format!(
                "Assign resources to task '{}' which currently has none.",
                only.task_name
            )),
            many => recommendations.push(format!(
                "Assign resources to {} tasks that currently have none, especially to the critical path tasks.",
                many.len()
            )),
        }

        if !no_dependencies.is_empty() {
            recommendations.push(format!(
                "Review {} tasks that aren't referenced as dependencies by any other task. They might be isolated or disconnected from the project flow.",
                no_dependencies.len()
            ));
        }

        if !bottlenecks.is_empty() {
            let critical = bottlenecks
                .iter()
                .filter(|b| self.critical_ids.contains(&b.task_id))
                .count();
            if critical > 0 {
                recommendations.push(format!(
                    "Consider breaking down {critical} long-duration tasks on the critical path into smaller sub-tasks to reduce risk and improve tracking."
                ));
            }
            if bottlenecks.len() > critical {
                recommendations.push(format!(
                    "Review {} non-critical tasks with unusually long durations. They might benefit from additional resources.",
                    bottlenecks.len() - critical
                ));
            }
        }

        if !overloaded.is_empty() {
            recommendations.push(format!(
                "Redistribute work from {} potentially overloaded resources to ensure optimal performance and reduce burnout risk.",
                overloaded.len()
            ));
            for severe in overloaded
                .iter()
                .filter(|r| r.task_count > self.thresholds.severe_overload_count)
            {
                recommendations.push(format!(
                    "Resource '{}' is assigned to {} tasks which is significantly above recommended limits. Consider immediate reallocation.",
                    severe.resource, severe.task_count
                ));
            }
        }

        if !timeline.is_empty() {
            recommendations.push(format!(
                "Re-estimate {} complex tasks with very short durations; their timelines are likely optimistic.",
                timeline.len()
            ));
        }

        if !chains.is_empty() {
            recommendations.push(format!(
                "Break up {} dependency chains longer than {} tasks to reduce schedule fragility.",
                chains.len(),
                self.thresholds.long_chain_length
            ));
        }

        if !conflicts.is_empty() {
            recommendations.push(format!(
                "Stagger {} groups of potentially parallel tasks that share a resource, or assign additional resources to them.",
                conflicts.len()
            ));
        }

        if !no_resources.is_empty()
            || !no_dependencies.is_empty()
            || !bottlenecks.is_empty()
            || !overloaded.is_empty()
        {
            recommendations.push(
                "Consider implementing a regular risk review meeting to address these and other potential issues before they impact the project timeline.".to_string(),
            );
        }

        recommendations
    }
}

/// Recursive dependency-chain expansion. The visited set is cloned per
/// branch: a revisited ID terminates that branch only, sibling branches keep
/// their own history, so cyclic references cannot loop.
fn expand_chain(
    id: &str,
    dep_map: &HashMap<&str, &[String]>,
    visited: &HashSet<String>,
) -> Vec<String> {
    if visited.contains(id) {
        return vec![id.to_string()];
    }
    let mut visited = visited.clone();
    visited.insert(id.to_string());

    let mut chain = Vec::new();
    if let Some(deps) = dep_map.get(id) {
        for dep in deps.iter() {
            if dep_map.contains_key(dep.as_str()) {
                chain.extend(expand_chain(dep, dep_map, &visited));
            }
        }
    }
    chain.push(id.to_string());
    chain
}

/// Greedy parallel grouping: pop the first ungrouped task, absorb every
/// remaining task that neither depends on it nor is depended on by it.
/// Order-dependent by design.
fn parallel_groups<'a>(tasks: &[&'a Task]) -> Vec<Vec<&'a Task>> {
    let mut groups = Vec::new();
    let mut remaining: Vec<&Task> = tasks.to_vec();

    while !remaining.is_empty() {
        let seed = remaining.remove(0);
        let seed_deps: HashSet<&str> = seed.dependencies.iter().map(String::as_str).collect();
        let mut group = vec![seed];

        remaining.retain(|&other| {
            let independent = !seed_deps.contains(other.id.as_str())
                && !other.dependencies.iter().any(|d| d == &seed.id);
            if independent {
                group.push(other);
            }
            !independent
        });

        if group.len() > 1 {
            groups.push(group);
        }
    }
    groups
}
