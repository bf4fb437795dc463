//! Shared test utilities for integration tests
//!
//! Provides collaborator doubles, document builders, and environment
//! isolation helpers to avoid duplication and keep tests hermetic.

use async_trait::async_trait;
use lessonflow::error::{ServiceError, SynthesisError};
use lessonflow::graph::LearningFlow;
use lessonflow::material::{
    AnalyzedMaterial, GeneratedActivity, LessonActivity, LessonPlan, ReadingMaterial, Topic,
};
use lessonflow::persist::FlowStore;
use lessonflow::progress::{FlowOutcome, ProgressEvent, ProgressSink};
use lessonflow::provider::{ExerciseRequest, GenerationService, ReadingRequest};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::path::Path;

/// Global mutex to serialize environment variable access across tests.
/// Prevents races when tests run in parallel.
static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run a test with HOME pointed at a fresh temp directory and
/// LESSONFLOW_ENV unset, restoring the original environment afterwards.
pub fn with_isolated_env<T>(test: impl FnOnce(&Path) -> T) -> T {
    let _guard = ENV_MUTEX
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let temp = tempfile::tempdir().unwrap();
    let saved_home = std::env::var("HOME").ok();
    let saved_env = std::env::var("LESSONFLOW_ENV").ok();
    std::env::set_var("HOME", temp.path());
    std::env::remove_var("LESSONFLOW_ENV");

    let result = test(temp.path());

    match saved_home {
        Some(value) => std::env::set_var("HOME", value),
        None => std::env::remove_var("HOME"),
    }
    match saved_env {
        Some(value) => std::env::set_var("LESSONFLOW_ENV", value),
        None => std::env::remove_var("LESSONFLOW_ENV"),
    }
    result
}

/// Generation double deriving deterministic content from each request.
/// Records every call; queued failures are consumed before canned responses.
#[derive(Default)]
pub struct CannedGenerationService {
    pub reading_calls: Mutex<Vec<ReadingRequest>>,
    pub exercise_calls: Mutex<Vec<ExerciseRequest>>,
    pub exercise_failures: Mutex<VecDeque<ServiceError>>,
}

impl CannedGenerationService {
    /// Queue a failure for the next exercise call. Queue two to defeat the
    /// engine's single retry and skip the unit.
    pub fn fail_next_exercise(&self, error: ServiceError) {
        self.exercise_failures.lock().push_back(error);
    }
}

#[async_trait]
impl GenerationService for CannedGenerationService {
    async fn analyze_material(&self, text: &str) -> Result<AnalyzedMaterial, ServiceError> {
        let mut material = material_with_topics(&["Overview"]);
        material.title = text.chars().take(24).collect();
        Ok(material)
    }

    async fn generate_reading(
        &self,
        request: &ReadingRequest,
    ) -> Result<ReadingMaterial, ServiceError> {
        self.reading_calls.lock().push(request.clone());
        let names: Vec<String> = request
            .topics
            .iter()
            .flat_map(|batch| batch.topics.iter().map(|t| t.name.clone()))
            .collect();
        Ok(ReadingMaterial {
            title: request.title.clone(),
            macro_subject: request.macro_subject.clone(),
            material: format!("Reading covering {}.", names.join(", ")),
        })
    }

    async fn generate_exercise(
        &self,
        request: &ExerciseRequest,
    ) -> Result<GeneratedActivity, ServiceError> {
        self.exercise_calls.lock().push(request.clone());
        if let Some(error) = self.exercise_failures.lock().pop_front() {
            return Err(error);
        }
        Ok(GeneratedActivity {
            assignment: format!("Question on {}", request.topic),
            plus: format!("Extra notes on {}", request.topic),
            solutions: vec![format!("{} is correct", request.topic)],
            distractors: vec!["Wrong one".to_string(), "Wrong two".to_string()],
            easily_discardable_distractors: vec!["Obviously wrong".to_string()],
            activity_kind: request.activity_kind.clone(),
            topic: request.topic.clone(),
        })
    }
}

/// Store double keeping persisted flows in memory.
#[derive(Default)]
pub struct MemoryFlowStore {
    pub flows: Mutex<Vec<LearningFlow>>,
}

#[async_trait]
impl FlowStore for MemoryFlowStore {
    async fn persist(&self, flow: &LearningFlow) -> Result<String, SynthesisError> {
        self.flows.lock().push(flow.clone());
        Ok(flow.id.clone())
    }
}

/// Store double rejecting every flow with the given status.
pub struct RejectingFlowStore {
    pub status: u16,
}

#[async_trait]
impl FlowStore for RejectingFlowStore {
    async fn persist(&self, _flow: &LearningFlow) -> Result<String, SynthesisError> {
        Err(SynthesisError::Persistence {
            status: self.status,
            message: "rejected by test store".to_string(),
        })
    }
}

/// Progress double recording every emission.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<ProgressEvent>>,
    pub outcomes: Mutex<Vec<FlowOutcome>>,
}

impl ProgressSink for RecordingSink {
    fn unit_completed(&self, event: ProgressEvent) {
        self.events.lock().push(event);
    }

    fn flow_finished(&self, outcome: &FlowOutcome) {
        self.outcomes.lock().push(outcome.clone());
    }
}

/// Analyzed material with the given topic names, one explanation each.
pub fn material_with_topics(names: &[&str]) -> AnalyzedMaterial {
    AnalyzedMaterial {
        title: "Cell Biology".to_string(),
        macro_subject: "Biology".to_string(),
        education_level: "undergraduate".to_string(),
        learning_outcome: "Describe cell structure and energy flow".to_string(),
        language: "English".to_string(),
        topics: names
            .iter()
            .map(|name| Topic {
                name: name.to_string(),
                explanation: format!("{} explained.", name),
            })
            .collect(),
        keywords: vec!["cells".to_string(), "energy".to_string()],
        estimated_duration: 25,
    }
}

/// Lesson plan from (topic, activity kind) pairs.
pub fn lesson_with(activities: &[(&str, &str)]) -> LessonPlan {
    LessonPlan {
        title: "Cells and energy".to_string(),
        activities: activities
            .iter()
            .map(|(topic, kind)| LessonActivity {
                topic: topic.to_string(),
                activity_kind: kind.to_string(),
                learning_outcome: format!("Master {}", topic),
                duration_minutes: 5,
                generation_params: Default::default(),
            })
            .collect(),
    }
}
