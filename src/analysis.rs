//! One-call analysis pipeline
//!
//! Runs normalize → summary → critical path → advanced schedule → risks off
//! a single graph build and bundles the results into one serializable
//! document — the unit an owning service stores per request and slices for
//! partial-refresh endpoints. Stateless: each call is a pure function of the
//! input document.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::Thresholds;
use crate::error::{AnalysisError, Result};
use crate::model::{NormalizedProject, ProjectMetadata, Task};
use crate::normalize::normalize;
use crate::risk::{RiskAnalyzer, RiskReport};
use crate::schedule::{compute_critical_path_with, AdvancedSchedule, CriticalPathResult};
use crate::summary::{summarize, ProjectSummary};

/// Complete analysis of one project document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub metadata: ProjectMetadata,
    /// SHA-256 digest of the raw input document.
    pub fingerprint: String,
    pub tasks: Vec<Task>,
    pub summary: ProjectSummary,
    pub critical_path: CriticalPathResult,
    pub schedule: AdvancedSchedule,
    pub risks: RiskReport,
}

/// Analyzes a raw project document with default thresholds.
///
/// Fails with [`AnalysisError::InvalidInput`] for non-object or empty input
/// and [`AnalysisError::EmptyTaskList`] when normalization discovers no
/// tasks.
pub fn analyze_project(raw: &Value) -> Result<ProjectAnalysis> {
    analyze_project_with(raw, &Thresholds::default())
}

/// Analyzes a raw project document with explicit thresholds.
pub fn analyze_project_with(raw: &Value, thresholds: &Thresholds) -> Result<ProjectAnalysis> {
    let NormalizedProject { metadata, tasks, fingerprint } = normalize(raw)?;
    if tasks.is_empty() {
        return Err(AnalysisError::EmptyTaskList);
    }

    let summary = summarize(&tasks);
    let critical_path = compute_critical_path_with(&tasks, thresholds);
    let schedule = AdvancedSchedule::from_critical_path(&tasks, &critical_path, thresholds);
    let risks = RiskAnalyzer::new(&tasks, critical_path.critical_ids())
        .with_thresholds(thresholds.clone())
        .analyze();

    info!(
        tasks = tasks.len(),
        critical = critical_path.path.len(),
        total_risks = risks.total_risks,
        "project analysis complete"
    );

    Ok(ProjectAnalysis {
        metadata,
        fingerprint,
        tasks,
        summary,
        critical_path,
        schedule,
        risks,
    })
}
