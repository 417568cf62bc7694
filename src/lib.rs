//! Planalyze
//!
//! Critical-path and risk analysis for loosely-structured project-schedule
//! JSON documents (English or French field conventions, inconsistent types,
//! missing fields — what project exports actually look like).
//!
//! ## Features
//!
//! - **Schema Normalization**: synonym-table field resolution, lenient
//!   scalar coercion, bilingual status mapping, documented defaults
//! - **Dependency Graph**: petgraph digraph over task IDs; dangling and
//!   self-referential dependencies dropped, cycles broken heuristically
//! - **CPM Scheduling**: earliest/latest start, slack, longest-path critical
//!   path, bottlenecks, near-critical tasks, per-task schedule rows
//! - **Risk Heuristics**: seven independent detectors with weighted scores
//!   and template recommendations
//!
//! ## Architecture
//!
//! ```text
//! raw JSON ──► normalize ──► tasks + metadata
//!                                │
//!                                ├──► summary
//!                                ▼
//!                          DependencyGraph
//!                                │
//!                                ▼
//!                       schedule (CPM pass) ──► critical path, slack
//!                                │
//!                                ▼
//!                        risk (7 detectors) ──► RiskReport
//! ```
//!
//! Everything is synchronous and stateless per call; the graph is rebuilt
//! from the task list for every analysis pass.

pub mod analysis;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod normalize;
pub mod risk;
pub mod schedule;
pub mod summary;

pub use analysis::{analyze_project, analyze_project_with, ProjectAnalysis};
pub use config::{AnalysisConfig, Thresholds};
pub use error::{AnalysisError, Result};
pub use graph::DependencyGraph;
pub use model::{DateValue, NormalizedProject, ProjectMetadata, Task, TaskStatus};
pub use normalize::normalize;
pub use risk::{analyze_risks, OverallRisk, RiskAnalyzer, RiskLevel, RiskReport};
pub use schedule::{
    compute_advanced_schedule, compute_advanced_schedule_with, compute_critical_path,
    compute_critical_path_with, AdvancedSchedule, CriticalPathResult,
};
pub use summary::{summarize, ProjectSummary};
