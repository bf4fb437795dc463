//! Progress emission: per-unit events and the terminal flow outcome.

use super::test_utils::{
    lesson_with, material_with_topics, CannedGenerationService, MemoryFlowStore,
    RecordingSink, RejectingFlowStore,
};
use lessonflow::progress::{FlowOutcome, ProgressEvent};
use lessonflow::synthesis::{SynthesisEngine, SynthesisOptions};
use std::sync::Arc;
use std::time::Duration;

fn zero_delay_options() -> SynthesisOptions {
    SynthesisOptions {
        retry_delay: Duration::ZERO,
        ..Default::default()
    }
}

/// One event per completed unit, in order, then a persisted outcome.
#[tokio::test]
async fn test_events_fire_per_completed_unit() {
    let service = Arc::new(CannedGenerationService::default());
    let store = Arc::new(MemoryFlowStore::default());
    let sink = Arc::new(RecordingSink::default());
    let engine = SynthesisEngine::new(service, store, sink.clone(), zero_delay_options());

    let material = material_with_topics(&["Replication"]);
    let lesson = lesson_with(&[("Replication", "short answer")]);

    let report = engine.synthesize(&material, &lesson).await.unwrap();

    let events = sink.events.lock();
    assert_eq!(
        *events,
        vec![
            ProgressEvent {
                units_completed: 1,
                units_total: 2
            },
            ProgressEvent {
                units_completed: 2,
                units_total: 2
            },
        ]
    );

    let outcomes = sink.outcomes.lock();
    assert_eq!(
        *outcomes,
        vec![FlowOutcome::Persisted {
            flow_id: report.flow_id.clone()
        }]
    );
}

/// A rejected persistence surfaces as a failed outcome, exactly once.
#[tokio::test]
async fn test_rejected_persistence_reports_failed_outcome() {
    let service = Arc::new(CannedGenerationService::default());
    let store = Arc::new(RejectingFlowStore { status: 502 });
    let sink = Arc::new(RecordingSink::default());
    let engine = SynthesisEngine::new(service, store, sink.clone(), zero_delay_options());

    let material = material_with_topics(&["Transcription"]);
    let lesson = lesson_with(&[("Transcription", "open question")]);

    let error = engine.synthesize(&material, &lesson).await.unwrap_err();
    assert!(error.to_string().contains("502"));

    let outcomes = sink.outcomes.lock();
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], FlowOutcome::Failed { .. }));

    // Units completed before the rejection still emitted events.
    assert_eq!(sink.events.lock().len(), 2);
}
