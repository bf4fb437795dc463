//! CLI route execution against on-disk documents.

use super::test_utils::{lesson_with, material_with_topics};
use lessonflow::cli::{Commands, RunContext};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_json(dir: &Path, name: &str, value: &impl serde::Serialize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn context_with_defaults(dir: &Path) -> RunContext {
    // An empty explicit config file keeps loading hermetic: no global or
    // workspace lookup, defaults for everything.
    let config_file = dir.join("engine.toml");
    std::fs::write(&config_file, "").unwrap();
    RunContext::new(dir, Some(&config_file)).unwrap()
}

#[test]
fn test_plan_command_renders_unit_table() {
    let temp = TempDir::new().unwrap();
    let material = write_json(
        temp.path(),
        "material.json",
        &material_with_topics(&["Cells", "Organelles"]),
    );
    let lesson = write_json(
        temp.path(),
        "lesson.json",
        &lesson_with(&[("Organelles", "multiple choice")]),
    );
    let context = context_with_defaults(temp.path());

    let output = context
        .execute(&Commands::Plan {
            material,
            lesson,
            format: "text".to_string(),
        })
        .unwrap();

    assert!(output.contains("1 readings, 1 exercises"));
    assert!(output.contains("Cells, Organelles"));
    assert!(output.contains("multiple choice"));
}

#[test]
fn test_plan_command_warns_on_unknown_topic() {
    let temp = TempDir::new().unwrap();
    let material = write_json(
        temp.path(),
        "material.json",
        &material_with_topics(&["Cells"]),
    );
    let lesson = write_json(
        temp.path(),
        "lesson.json",
        &lesson_with(&[("Glycolysis", "open question")]),
    );
    let context = context_with_defaults(temp.path());

    let output = context
        .execute(&Commands::Plan {
            material,
            lesson,
            format: "json".to_string(),
        })
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["units"].as_array().unwrap().len(), 1);
    assert_eq!(value["units"][0]["unit"], "exercise");
    assert_eq!(value["warnings"].as_array().unwrap().len(), 1);
}

#[test]
fn test_validate_command_rejects_dangling_edge() {
    let temp = TempDir::new().unwrap();
    let flow_path = temp.path().join("flow.json");
    // A flow whose single edge points at a node that does not exist.
    std::fs::write(
        &flow_path,
        r#"{
  "id": "f1",
  "title": "Broken",
  "description": "",
  "tags": [],
  "topics": [],
  "nodes": [
    {
      "id": "n1",
      "kind": "terminal",
      "title": "Lesson complete",
      "description": "",
      "payload": {"type": "reading", "title": "Done", "macroSubject": "", "material": ""},
      "position": {"x": 0.0, "y": 0.0}
    }
  ],
  "edges": [
    {
      "id": "e1",
      "kind": "unconditional",
      "sourceNodeId": "n1",
      "targetNodeId": "missing"
    }
  ],
  "metadata": {
    "macroSubject": "",
    "educationLevel": "",
    "language": "",
    "estimatedDuration": 0,
    "createdAt": "2026-01-05T10:00:00Z"
  }
}"#,
    )
    .unwrap();
    let context = context_with_defaults(temp.path());

    let error = context
        .execute(&Commands::Validate { flow: flow_path })
        .unwrap_err();

    assert!(error.to_string().contains("missing"));
}

#[test]
fn test_validate_command_reports_document_path_on_parse_failure() {
    let temp = TempDir::new().unwrap();
    let flow_path = temp.path().join("mangled.json");
    std::fs::write(&flow_path, "[1, 2").unwrap();
    let context = context_with_defaults(temp.path());

    let error = context
        .execute(&Commands::Validate { flow: flow_path })
        .unwrap_err();

    assert!(error.to_string().contains("mangled.json"));
}
