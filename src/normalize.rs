//! Schema normalization
//!
//! Turns an arbitrary, loosely-structured project JSON document into the
//! canonical [`Task`] list and [`ProjectMetadata`]. Field names are resolved
//! first-match-wins over ordered synonym tables (English and French schemas
//! are both common in the wild), scalars are coerced leniently, and missing
//! optional fields take documented defaults. Only a non-object or empty
//! top-level value is an error.

use chrono::NaiveDate;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};
use crate::model::{DateValue, NormalizedProject, ProjectMetadata, Task, TaskStatus};

// =============================================================================
// Synonym tables
// =============================================================================
//
// Ordered: the first key present in the source object wins. New synonyms are
// additive — extend the table, never branch in code.

/// Root keys checked for the task list before falling back to a scan.
const TASK_LIST_KEYS: &[&str] = &["tasks", "taches", "activities", "activites"];

const ID_KEYS: &[&str] = &["id", "identifiant", "task_id"];
const NAME_KEYS: &[&str] = &["nom", "name", "titre", "title"];
const DESCRIPTION_KEYS: &[&str] = &["description", "desc", "detail", "details"];
const DURATION_KEYS: &[&str] = &["duree_estimee", "duree", "duration", "estimated_duration"];
const DURATION_UNIT_KEYS: &[&str] = &["unite_duree", "duration_unit", "unite"];
const DEPENDENCY_KEYS: &[&str] = &["predecesseurs", "predecessors", "dependances", "dependencies"];
const RESOURCE_KEYS: &[&str] = &["ressources_requises", "resources", "ressources"];
const STATUS_KEYS: &[&str] = &["statut", "status", "etat"];

const PROJECT_NAME_KEYS: &[&str] =
    &["nom_projet", "project_name", "nom", "name", "titre", "title"];
const PROJECT_DESCRIPTION_KEYS: &[&str] =
    &["description_projet", "project_description", "description", "desc"];
const PROJECT_MANAGER_KEYS: &[&str] =
    &["responsable", "manager", "chef_projet", "project_manager"];
const START_DATE_KEYS: &[&str] = &["date_debut", "start_date", "debut", "start"];
const END_DATE_KEYS: &[&str] = &["date_fin", "end_date", "fin", "end", "date_fin_prevue"];

/// Date formats recognized for metadata normalization, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

/// Status synonyms, lowercase, English and French.
const STATUS_SYNONYMS: &[(TaskStatus, &[&str])] = &[
    (
        TaskStatus::Completed,
        &["terminé", "terminée", "terminee", "termine", "done", "complete", "completed", "finished", "achevé", "achevée", "achevee"],
    ),
    (
        TaskStatus::InProgress,
        &["en cours", "en_cours", "in progress", "in_progress", "ongoing", "started", "active"],
    ),
    (
        TaskStatus::NotStarted,
        &["non commencé", "non commencée", "non_commencee", "non commencee", "not started", "not_started", "todo", "to_do", "to do", "planned", "planifié", "planifiée", "planifiee", "à faire", "a faire"],
    ),
    (
        TaskStatus::Delayed,
        &["en retard", "en_retard", "late", "delayed", "overdue", "retardé", "retardée", "retardee"],
    ),
    (
        TaskStatus::Cancelled,
        &["annulé", "annulée", "annulee", "annule", "cancelled", "canceled", "abandonné", "abandonnée", "abandonnee", "abandonne"],
    ),
];

/// Fallback unit when no task carries an explicit duration unit.
const DEFAULT_DURATION_UNIT: &str = "days";

// =============================================================================
// Entry point
// =============================================================================

/// Normalizes a raw project document.
///
/// Fails with [`AnalysisError::InvalidInput`] when the value is not a JSON
/// object or is an empty object. Never fails for missing task fields —
/// defaults apply per field. A document in which no task list can be
/// discovered yields an empty task list; surfacing that as a business error
/// is the pipeline's job, not the normalizer's.
pub fn normalize(raw: &Value) -> Result<NormalizedProject> {
    let root = raw
        .as_object()
        .ok_or_else(|| AnalysisError::InvalidInput("input is not a JSON object".to_string()))?;
    if root.is_empty() {
        return Err(AnalysisError::InvalidInput("input document is empty".to_string()));
    }

    let metadata = extract_metadata(root);
    let mut tasks = match find_task_list(root) {
        Some((key, list)) => {
            debug!(key, count = list.len(), "task list discovered");
            normalize_tasks(list)
        }
        None => {
            debug!("no task list discovered in document");
            Vec::new()
        }
    };
    backfill_duration_units(&mut tasks);

    Ok(NormalizedProject {
        metadata,
        tasks,
        fingerprint: fingerprint(raw),
    })
}

/// SHA-256 hex digest of the document's serialization.
pub fn fingerprint(raw: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

// =============================================================================
// Task-list discovery
// =============================================================================

fn find_task_list(root: &serde_json::Map<String, Value>) -> Option<(&str, &[Value])> {
    for &key in TASK_LIST_KEYS {
        if let Some(list) = root.get(key).and_then(Value::as_array) {
            return Some((key, list));
        }
    }

    // Fallback: first root array (document order) whose leading element looks
    // like a task — at least two of {id, name, duration} key families present.
    for (key, value) in root {
        if let Some(list) = value.as_array() {
            if looks_like_task_list(list) {
                return Some((key.as_str(), list));
            }
        }
    }
    None
}

fn looks_like_task_list(list: &[Value]) -> bool {
    let Some(first) = list.first().and_then(Value::as_object) else {
        return false;
    };
    let families = [ID_KEYS, NAME_KEYS, DURATION_KEYS];
    let hits = families
        .iter()
        .filter(|keys| keys.iter().any(|k| first.contains_key(*k)))
        .count();
    hits >= 2
}

// =============================================================================
// Task normalization
// =============================================================================

fn normalize_tasks(list: &[Value]) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(list.len());
    let mut seen_ids: HashSet<String> = HashSet::with_capacity(list.len());

    for (index, entry) in list.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            warn!(index, "skipping non-object task entry");
            continue;
        };

        let id = assign_id(obj, index, &mut seen_ids);
        let name = first_match(obj, NAME_KEYS)
            .and_then(scalar_to_string)
            .unwrap_or_else(|| format!("Task {id}"));
        let description = first_match(obj, DESCRIPTION_KEYS)
            .and_then(scalar_to_string)
            .unwrap_or_default();
        let duration = extract_duration(obj, &id);
        let duration_unit = first_match(obj, DURATION_UNIT_KEYS)
            .and_then(scalar_to_string)
            .unwrap_or_default();
        let dependencies = first_match(obj, DEPENDENCY_KEYS)
            .map(to_string_list)
            .unwrap_or_default();
        let resources = first_match(obj, RESOURCE_KEYS)
            .map(to_string_list)
            .unwrap_or_default();
        let status = first_match(obj, STATUS_KEYS)
            .and_then(scalar_to_string)
            .map(|s| parse_status(&s))
            .unwrap_or_default();

        tasks.push(Task {
            id,
            name,
            description,
            duration,
            duration_unit,
            dependencies,
            resources,
            status,
        });
    }
    tasks
}

/// Resolves a task's ID: the extracted value when present and unused,
/// otherwise `task_{index+1}` keyed on ingestion order, suffix-bumped if that
/// synthesized ID is itself taken.
fn assign_id(
    obj: &serde_json::Map<String, Value>,
    index: usize,
    seen: &mut HashSet<String>,
) -> String {
    let extracted = first_match(obj, ID_KEYS).and_then(scalar_to_string);
    let base = match extracted {
        Some(id) if !seen.contains(&id) => id,
        Some(id) => {
            warn!(index, id = %id, "duplicate task ID, synthesizing fallback");
            format!("task_{}", index + 1)
        }
        None => {
            warn!(index, "task has no recognizable ID, synthesizing");
            format!("task_{}", index + 1)
        }
    };

    let mut id = base.clone();
    let mut bump = 1;
    while !seen.insert(id.clone()) {
        bump += 1;
        id = format!("{base}_{bump}");
    }
    id
}

fn extract_duration(obj: &serde_json::Map<String, Value>, id: &str) -> f64 {
    match first_match(obj, DURATION_KEYS) {
        None => 1.0,
        Some(value) => match scalar_to_f64(value) {
            Some(d) if d.is_finite() && d >= 0.0 => d,
            _ => {
                warn!(id, "invalid duration, defaulting to 1");
                1.0
            }
        },
    }
}

/// Assigns the project-wide most-common explicit unit (first-seen wins ties)
/// to tasks that carry none; "days" when no task is explicit.
fn backfill_duration_units(tasks: &mut [Task]) {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for task in tasks.iter() {
        if task.duration_unit.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(u, _)| *u == task.duration_unit) {
            Some((_, n)) => *n += 1,
            None => counts.push((task.duration_unit.clone(), 1)),
        }
    }
    // first-seen unit wins ties, so strictly-greater only
    let mut dominant: Option<(&str, usize)> = None;
    for (unit, n) in &counts {
        if dominant.map_or(true, |(_, best)| *n > best) {
            dominant = Some((unit.as_str(), *n));
        }
    }
    let dominant = dominant
        .map(|(u, _)| u.to_string())
        .unwrap_or_else(|| DEFAULT_DURATION_UNIT.to_string());

    for task in tasks.iter_mut() {
        if task.duration_unit.is_empty() {
            task.duration_unit = dominant.clone();
        }
    }
}

/// Maps a raw status string onto [`TaskStatus`], defaulting to `NotStarted`.
pub fn parse_status(raw: &str) -> TaskStatus {
    let needle = raw.trim().to_lowercase();
    for (status, synonyms) in STATUS_SYNONYMS {
        if synonyms.contains(&needle.as_str()) {
            return *status;
        }
    }
    TaskStatus::NotStarted
}

// =============================================================================
// Metadata
// =============================================================================

fn extract_metadata(root: &serde_json::Map<String, Value>) -> ProjectMetadata {
    ProjectMetadata {
        name: first_match(root, PROJECT_NAME_KEYS).and_then(scalar_to_string),
        description: first_match(root, PROJECT_DESCRIPTION_KEYS).and_then(scalar_to_string),
        manager: first_match(root, PROJECT_MANAGER_KEYS).and_then(scalar_to_string),
        start_date: first_match(root, START_DATE_KEYS).and_then(scalar_to_string).map(parse_date),
        end_date: first_match(root, END_DATE_KEYS).and_then(scalar_to_string).map(parse_date),
    }
}

fn parse_date(raw: String) -> DateValue {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), format) {
            return DateValue::Parsed(date);
        }
    }
    DateValue::Raw(raw)
}

// =============================================================================
// Generic extraction helpers
// =============================================================================

fn first_match<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(format_number(n)),
        _ => None,
    }
}

/// Renders integers without a trailing `.0` so numeric IDs round-trip as
/// their natural text form.
fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.to_string()
    }
}

fn scalar_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Coerces scalar, comma-separated string, or array input into an ordered
/// string list. Array entries may themselves be objects carrying a name-like
/// or id-like key (resource objects in some schemas).
fn to_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(list_entry_name).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Null => Vec::new(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}

fn list_entry_name(value: &Value) -> Option<String> {
    if let Some(s) = scalar_to_string(value) {
        return Some(s);
    }
    let obj = value.as_object()?;
    first_match(obj, NAME_KEYS)
        .or_else(|| first_match(obj, ID_KEYS))
        .and_then(scalar_to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_non_object_input() {
        assert!(matches!(
            normalize(&json!([1, 2, 3])),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            normalize(&json!({})),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_discovers_well_known_root_keys() {
        let doc = json!({ "taches": [{"id": 1, "duree": 3}] });
        let project = normalize(&doc).unwrap();
        assert_eq!(project.tasks.len(), 1);
        assert_eq!(project.tasks[0].id, "1");
        assert_eq!(project.tasks[0].duration, 3.0);
    }

    #[test]
    fn test_discovery_scan_takes_first_task_like_array() {
        let doc = json!({
            "notes": ["just", "strings"],
            "work_items": [{"identifiant": "a", "duree_estimee": 2}],
            "items": [{"id": "z", "duration": 9}]
        });
        let project = normalize(&doc).unwrap();
        assert_eq!(project.tasks.len(), 1);
        assert_eq!(project.tasks[0].id, "a");
    }

    #[test]
    fn test_no_task_list_yields_empty_not_error() {
        let doc = json!({ "nom": "Projet vide" });
        let project = normalize(&doc).unwrap();
        assert!(project.tasks.is_empty());
        assert_eq!(project.metadata.name.as_deref(), Some("Projet vide"));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let doc = json!({ "tasks": [{"id": "x", "name": "X"}] });
        let task = &normalize(&doc).unwrap().tasks[0];
        assert_eq!(task.duration, 1.0);
        assert_eq!(task.duration_unit, "days");
        assert_eq!(task.description, "");
        assert!(task.dependencies.is_empty());
        assert!(task.resources.is_empty());
        assert_eq!(task.status, TaskStatus::NotStarted);
    }

    #[test]
    fn test_synthesized_and_deduplicated_ids() {
        let doc = json!({ "tasks": [
            {"name": "no id"},
            {"id": "a"},
            {"id": "a"},
            {"id": "task_1"}
        ]});
        let ids: Vec<String> = normalize(&doc).unwrap().tasks.into_iter().map(|t| t.id).collect();
        assert_eq!(ids[0], "task_1");
        assert_eq!(ids[1], "a");
        assert_eq!(ids[2], "task_3");
        // the literal "task_1" collides with the synthesized first entry,
        // so this one falls back to its own ingestion-order ID
        assert_eq!(ids[3], "task_4");
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_invalid_durations_default_to_one() {
        let doc = json!({ "tasks": [
            {"id": 1, "duration": -5},
            {"id": 2, "duration": "abc"},
            {"id": 3, "duration": "2.5"},
            {"id": 4, "duration": 0}
        ]});
        let tasks = normalize(&doc).unwrap().tasks;
        assert_eq!(tasks[0].duration, 1.0);
        assert_eq!(tasks[1].duration, 1.0);
        assert_eq!(tasks[2].duration, 2.5);
        assert_eq!(tasks[3].duration, 0.0);
    }

    #[test]
    fn test_dependency_and_resource_coercions() {
        let doc = json!({ "tasks": [
            {"id": 1, "dependencies": "a, b , ,c", "resources": "Alice"},
            {"id": 2, "predecesseurs": [1, "x"], "ressources": [{"nom": "Bob"}, "Carol"]},
            {"id": 3, "dependencies": 7}
        ]});
        let tasks = normalize(&doc).unwrap().tasks;
        assert_eq!(tasks[0].dependencies, vec!["a", "b", "c"]);
        assert_eq!(tasks[0].resources, vec!["Alice"]);
        assert_eq!(tasks[1].dependencies, vec!["1", "x"]);
        assert_eq!(tasks[1].resources, vec!["Bob", "Carol"]);
        assert_eq!(tasks[2].dependencies, vec!["7"]);
    }

    #[test]
    fn test_status_synonyms_bilingual() {
        for (raw, expected) in [
            ("Terminé", TaskStatus::Completed),
            ("DONE", TaskStatus::Completed),
            ("en cours", TaskStatus::InProgress),
            ("In Progress", TaskStatus::InProgress),
            ("en retard", TaskStatus::Delayed),
            ("overdue", TaskStatus::Delayed),
            ("annulee", TaskStatus::Cancelled),
            ("canceled", TaskStatus::Cancelled),
            ("todo", TaskStatus::NotStarted),
            ("quelque chose d'autre", TaskStatus::NotStarted),
        ] {
            assert_eq!(parse_status(raw), expected, "status {raw:?}");
        }
    }

    #[test]
    fn test_dominant_duration_unit_backfill() {
        let doc = json!({ "tasks": [
            {"id": 1, "unite_duree": "weeks"},
            {"id": 2, "duration_unit": "weeks"},
            {"id": 3, "duration_unit": "hours"},
            {"id": 4}
        ]});
        let tasks = normalize(&doc).unwrap().tasks;
        assert_eq!(tasks[3].duration_unit, "weeks");
        assert_eq!(tasks[2].duration_unit, "hours");
    }

    #[test]
    fn test_metadata_extraction_and_dates() {
        let doc = json!({
            "nom_projet": "Refonte",
            "responsable": "Claire",
            "date_debut": "2024-03-01",
            "date_fin": "someday",
            "tasks": []
        });
        let meta = normalize(&doc).unwrap().metadata;
        assert_eq!(meta.name.as_deref(), Some("Refonte"));
        assert_eq!(meta.manager.as_deref(), Some("Claire"));
        assert_eq!(
            meta.start_date,
            Some(DateValue::Parsed(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        );
        assert_eq!(meta.end_date, Some(DateValue::Raw("someday".to_string())));
        assert!(meta.description.is_none());
    }

    #[test]
    fn test_french_date_format() {
        assert_eq!(
            parse_date("15/04/2024".to_string()),
            DateValue::Parsed(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap())
        );
    }

    #[test]
    fn test_fingerprint_stable() {
        let doc = json!({ "tasks": [{"id": 1}] });
        assert_eq!(fingerprint(&doc), fingerprint(&doc.clone()));
        assert_ne!(fingerprint(&doc), fingerprint(&json!({ "tasks": [{"id": 2}] })));
    }

    #[test]
    fn test_normalization_idempotent() {
        let doc = json!({ "tasks": [
            {"identifiant": 1, "nom": "Cadrage", "duree": 2, "statut": "terminee",
             "predecesseurs": [], "ressources_requises": "Alice"},
            {"id": 2, "duration": 5, "dependencies": [1], "status": "in progress"}
        ]});
        let first = normalize(&doc).unwrap();
        let canonical = json!({ "tasks": serde_json::to_value(&first.tasks).unwrap() });
        let second = normalize(&canonical).unwrap();
        assert_eq!(first.tasks, second.tasks);
    }
}
