//! End-to-end pipeline tests over JSON fixtures
//!
//! Exercises the public API the way an owning service would: one raw
//! document in, normalized tasks, schedule, and risk report out.

use planalyze::{
    analyze_project, analyze_risks, compute_critical_path, normalize, AnalysisError, DateValue,
    RiskLevel, TaskStatus,
};

fn fixture(content: &str) -> serde_json::Value {
    serde_json::from_str(content).unwrap()
}

#[test]
fn test_english_fixture_full_analysis() {
    let doc = fixture(include_str!("fixtures/project_en.json"));
    let analysis = analyze_project(&doc).unwrap();

    assert_eq!(analysis.metadata.name.as_deref(), Some("Website Redesign"));
    assert_eq!(analysis.metadata.manager.as_deref(), Some("Claire"));
    assert!(matches!(analysis.metadata.start_date, Some(DateValue::Parsed(_))));

    // normalized statuses
    assert_eq!(analysis.tasks[0].status, TaskStatus::Completed);
    assert_eq!(analysis.tasks[1].status, TaskStatus::InProgress);
    assert_eq!(analysis.tasks[3].status, TaskStatus::NotStarted);

    // CPM: 1 -> 2 -> 4 dominates 1 -> 3 -> 4
    assert_eq!(analysis.critical_path.path, vec!["1", "2", "4"]);
    assert_eq!(analysis.critical_path.total_duration, 10.0);
    assert_eq!(analysis.critical_path.slack["3"], 4.0);
    assert!(analysis.critical_path.removed_edges.is_empty());

    // summary: 1 of 4 tasks completed
    assert_eq!(analysis.summary.task_count, 4);
    assert_eq!(analysis.summary.completion_percentage, 25.0);
    assert_eq!(analysis.summary.duration_unit, "days");

    // task 3 has no resources and sits off the critical path
    assert_eq!(analysis.risks.no_resources.len(), 1);
    assert_eq!(analysis.risks.no_resources[0].task_id, "3");
    assert_eq!(analysis.risks.no_resources[0].risk_level, RiskLevel::Medium);
}

#[test]
fn test_resourceless_task_escalates_to_high_on_critical_path() {
    // same shape, but Copywriting now dominates: critical path is 1 -> 3 -> 4
    let doc = serde_json::json!({
        "tasks": [
            {"id": 1, "duration": 2, "resources": ["Alice"]},
            {"id": 2, "duration": 5, "dependencies": [1], "resources": ["Bob"]},
            {"id": 3, "duration": 10, "dependencies": [1], "resources": []},
            {"id": 4, "duration": 3, "dependencies": [2, 3], "resources": ["Alice"]}
        ]
    });
    let analysis = analyze_project(&doc).unwrap();
    assert_eq!(analysis.critical_path.path, vec!["1", "3", "4"]);
    assert_eq!(analysis.risks.no_resources[0].task_id, "3");
    assert_eq!(analysis.risks.no_resources[0].risk_level, RiskLevel::High);
}

#[test]
fn test_french_twin_normalizes_identically() {
    let en = normalize(&fixture(include_str!("fixtures/project_en.json"))).unwrap();
    let fr = normalize(&fixture(include_str!("fixtures/projet_fr.json"))).unwrap();

    assert_eq!(en.tasks, fr.tasks);
    assert_eq!(en.metadata, fr.metadata);
    // the raw documents differ, so the fingerprints must too
    assert_ne!(en.fingerprint, fr.fingerprint);
}

#[test]
fn test_cyclic_fixture_terminates_with_corrected_graph() {
    let doc = fixture(include_str!("fixtures/cyclic.json"));
    let analysis = analyze_project(&doc).unwrap();

    // A(2) -> B(3) -> C(4) -> A: the edge out of the cheapest node goes
    assert_eq!(
        analysis.critical_path.removed_edges,
        vec![("A".to_string(), "B".to_string())]
    );
    assert_eq!(analysis.critical_path.path, vec!["B", "C", "A"]);
    assert_eq!(analysis.critical_path.total_duration, 9.0);

    // every task still scheduled, slack defined for all
    assert_eq!(analysis.schedule.rows.len(), 3);
    assert_eq!(analysis.critical_path.slack.len(), 3);
}

#[test]
fn test_empty_and_invalid_documents() {
    let no_tasks = serde_json::json!({ "nom": "Projet vide" });
    assert!(matches!(
        analyze_project(&no_tasks),
        Err(AnalysisError::EmptyTaskList)
    ));

    let empty_list = serde_json::json!({ "tasks": [] });
    assert!(matches!(
        analyze_project(&empty_list),
        Err(AnalysisError::EmptyTaskList)
    ));

    let not_an_object = serde_json::json!([1, 2, 3]);
    assert!(matches!(
        analyze_project(&not_an_object),
        Err(AnalysisError::InvalidInput(_))
    ));
}

#[test]
fn test_partial_refresh_matches_bundled_analysis() {
    // risks computed from a previously stored critical-path ID set must
    // match the ones the full pipeline produces
    let doc = fixture(include_str!("fixtures/project_en.json"));
    let analysis = analyze_project(&doc).unwrap();

    let tasks = normalize(&doc).unwrap().tasks;
    let cp = compute_critical_path(&tasks);
    let standalone = analyze_risks(&tasks, &cp.critical_ids());

    assert_eq!(standalone.total_risks, analysis.risks.total_risks);
    assert_eq!(standalone.risk_level, analysis.risks.risk_level);
    assert_eq!(standalone.recommendations, analysis.risks.recommendations);
}

#[test]
fn test_shared_resource_on_parallel_tasks_is_flagged() {
    let doc = fixture(include_str!("fixtures/project_en.json"));
    let analysis = analyze_project(&doc).unwrap();

    // Alice is on tasks 1 and 4, which do not depend on each other directly
    assert_eq!(analysis.risks.resource_conflicts.len(), 1);
    let conflict = &analysis.risks.resource_conflicts[0];
    assert_eq!(conflict.resource, "Alice");
    assert_eq!(conflict.task_ids, vec!["1", "4"]);
    // both sit on the critical path
    assert_eq!(conflict.risk_level, RiskLevel::High);
}
