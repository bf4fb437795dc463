//! End-to-end synthesis: plan, generate, assemble, persist.

use super::test_utils::{
    lesson_with, material_with_topics, CannedGenerationService, MemoryFlowStore, RecordingSink,
};
use lessonflow::error::ServiceError;
use lessonflow::graph::{EdgeKind, NodeKind};
use lessonflow::synthesis::{SynthesisEngine, SynthesisOptions};
use std::sync::Arc;
use std::time::Duration;

fn zero_delay_options() -> SynthesisOptions {
    SynthesisOptions {
        retry_delay: Duration::ZERO,
        ..Default::default()
    }
}

/// A lesson with one assessment produces the full branched shape: reading,
/// assessment, recovery, terminal.
#[tokio::test]
async fn test_single_assessment_produces_branched_flow() {
    let service = Arc::new(CannedGenerationService::default());
    let store = Arc::new(MemoryFlowStore::default());
    let engine = SynthesisEngine::new(
        service,
        store.clone(),
        Arc::new(RecordingSink::default()),
        zero_delay_options(),
    );

    let material = material_with_topics(&["Membranes"]);
    let lesson = lesson_with(&[("Membranes", "multiple choice")]);

    let report = engine.synthesize(&material, &lesson).await.unwrap();

    assert_eq!(report.units_total, 2, "one reading batch plus one exercise");
    assert_eq!(report.units_completed, 2);
    assert_eq!(report.units_skipped, 0);

    let flows = store.flows.lock();
    assert_eq!(flows.len(), 1);
    let flow = &flows[0];
    flow.validate().expect("persisted flow must be structurally valid");

    let kinds: Vec<NodeKind> = flow.nodes.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Reading,
            NodeKind::Assessment,
            NodeKind::Recovery,
            NodeKind::Terminal
        ]
    );

    let assessment = &flow.nodes[1];
    let recovery = &flow.nodes[2];
    let terminal = &flow.nodes[3];

    let pass = flow
        .edges
        .iter()
        .find(|e| e.source_node_id == assessment.id && e.kind == EdgeKind::Pass)
        .expect("assessment needs a pass edge");
    assert_eq!(pass.target_node_id, terminal.id);
    assert!(pass.condition_script.is_some(), "pass edges carry a script");

    let fail = flow
        .edges
        .iter()
        .find(|e| e.source_node_id == assessment.id && e.kind == EdgeKind::Fail)
        .expect("assessment needs a fail edge");
    assert_eq!(fail.target_node_id, recovery.id);

    let retry = flow
        .edges
        .iter()
        .find(|e| e.source_node_id == recovery.id)
        .expect("recovery needs a way back");
    assert_eq!(retry.kind, EdgeKind::Pass);
    assert_eq!(retry.target_node_id, terminal.id);

    // Recovery sits directly below its assessment on the grid.
    assert_eq!(recovery.position.x, assessment.position.x);
    assert!(recovery.position.y > assessment.position.y);
}

/// A batched reading feeds its text into every following exercise request.
#[tokio::test]
async fn test_reading_material_threads_into_exercises() {
    let service = Arc::new(CannedGenerationService::default());
    let store = Arc::new(MemoryFlowStore::default());
    let engine = SynthesisEngine::new(
        service.clone(),
        store,
        Arc::new(RecordingSink::default()),
        zero_delay_options(),
    );

    let material = material_with_topics(&["Organelles", "Mitochondria"]);
    let lesson = lesson_with(&[("Mitochondria", "short answer")]);

    engine.synthesize(&material, &lesson).await.unwrap();

    let readings = service.reading_calls.lock();
    assert_eq!(readings.len(), 1, "both topics bundle into one batch");
    let batched: Vec<&str> = readings[0]
        .topics
        .iter()
        .flat_map(|b| b.topics.iter().map(|t| t.name.as_str()))
        .collect();
    assert_eq!(batched, vec!["Organelles", "Mitochondria"]);

    let exercises = service.exercise_calls.lock();
    assert_eq!(exercises.len(), 1);
    assert_eq!(
        exercises[0].material,
        "Reading covering Organelles, Mitochondria."
    );
    assert_eq!(exercises[0].topic_explanation, "Mitochondria explained.");
}

/// A unit failing twice is skipped; the rest of the lesson still persists.
#[tokio::test]
async fn test_failed_unit_is_skipped_and_flow_persists() {
    let service = Arc::new(CannedGenerationService::default());
    service.fail_next_exercise(ServiceError::RequestFailed("busy".to_string()));
    service.fail_next_exercise(ServiceError::RequestFailed("still busy".to_string()));
    let store = Arc::new(MemoryFlowStore::default());
    let engine = SynthesisEngine::new(
        service.clone(),
        store.clone(),
        Arc::new(RecordingSink::default()),
        zero_delay_options(),
    );

    let material = material_with_topics(&["Osmosis", "Diffusion"]);
    let lesson = lesson_with(&[("Osmosis", "open question"), ("Diffusion", "true or false")]);

    let report = engine.synthesize(&material, &lesson).await.unwrap();

    // Units: reading [Osmosis], exercise Osmosis (skipped), reading
    // [Diffusion], exercise Diffusion.
    assert_eq!(report.units_total, 4);
    assert_eq!(report.units_completed, 3);
    assert_eq!(report.units_skipped, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("Osmosis"));

    // The failed call was retried once before skipping.
    assert_eq!(service.exercise_calls.lock().len(), 3);

    let flows = store.flows.lock();
    let flow = &flows[0];
    flow.validate().unwrap();
    let kinds: Vec<NodeKind> = flow.nodes.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Reading,
            NodeKind::Reading,
            NodeKind::Assessment,
            NodeKind::Recovery,
            NodeKind::Terminal
        ]
    );
}

/// Flow document fields derive from the analyzed material and the plan.
#[tokio::test]
async fn test_flow_document_carries_material_metadata() {
    let service = Arc::new(CannedGenerationService::default());
    let store = Arc::new(MemoryFlowStore::default());
    let engine = SynthesisEngine::new(
        service,
        store.clone(),
        Arc::new(RecordingSink::default()),
        zero_delay_options(),
    );

    let material = material_with_topics(&["Enzymes"]);
    let lesson = lesson_with(&[("Enzymes", "multiple choice")]);

    engine.synthesize(&material, &lesson).await.unwrap();

    let flows = store.flows.lock();
    let flow = &flows[0];
    assert_eq!(flow.title, "Cells and energy");
    assert_eq!(flow.description, "Describe cell structure and energy flow");
    assert_eq!(flow.tags, vec!["cells", "energy"]);
    assert_eq!(flow.topics, vec!["Enzymes"]);
    assert_eq!(flow.metadata.macro_subject, "Biology");
    assert_eq!(flow.metadata.language, "English");
    // Material estimate plus the lesson's activity minutes.
    assert_eq!(flow.metadata.estimated_duration, 30);
}
