//! Per-unit generation with a single-retry policy.
//!
//! One external call per planned unit, retried identically once on any
//! failure. A unit that fails twice is reported as a generation failure; the
//! caller skips it and moves on.

use crate::activity::{self, ActivityPayload};
use crate::error::{ServiceError, SynthesisError};
use crate::graph::GeneratedUnit;
use crate::material::{AnalyzedMaterial, LessonActivity};
use crate::planner::{PlannedUnit, ReadingBatch};
use crate::provider::{ExerciseRequest, GenerationService, ReadingBatchRequest, ReadingRequest};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// One generated unit plus any quality warning raised while shaping it.
#[derive(Debug, Clone)]
pub struct GeneratedOutcome {
    pub unit: GeneratedUnit,
    pub warning: Option<String>,
}

/// Issues generation calls for planned units.
pub struct UnitGenerator {
    service: Arc<dyn GenerationService>,
    retry_delay: Duration,
}

impl UnitGenerator {
    pub fn new(service: Arc<dyn GenerationService>, retry_delay: Duration) -> Self {
        Self {
            service,
            retry_delay,
        }
    }

    /// Generate one planned unit, retrying the identical call once.
    pub async fn generate_unit(
        &self,
        material: &AnalyzedMaterial,
        unit: &PlannedUnit,
        prior_reading: &str,
    ) -> Result<GeneratedOutcome, SynthesisError> {
        let label = unit.describe();
        match unit {
            PlannedUnit::Reading(batch) => {
                let request = reading_request(material, batch);
                let reading = self
                    .retry_once(&label, || self.service.generate_reading(&request))
                    .await?;
                let covered: Vec<&str> = batch.topics.iter().map(|t| t.name.as_str()).collect();
                Ok(GeneratedOutcome {
                    unit: GeneratedUnit::Reading {
                        title: reading.title.clone(),
                        description: format!("Covers: {}", covered.join(", ")),
                        payload: ActivityPayload::from_reading(&reading),
                    },
                    warning: None,
                })
            }
            PlannedUnit::Exercise(planned) => {
                let request = exercise_request(material, planned, prior_reading);
                let raw = self
                    .retry_once(&label, || self.service.generate_exercise(&request))
                    .await?;
                let warning = activity::quality_warning(&raw);
                let mut rng = rand::thread_rng();
                let payload = activity::adapt(&mut rng, &raw)?;
                Ok(GeneratedOutcome {
                    unit: GeneratedUnit::Exercise {
                        title: planned.topic.clone(),
                        description: raw.plus.clone(),
                        payload,
                    },
                    warning,
                })
            }
        }
    }

    async fn retry_once<T, F, Fut>(&self, label: &str, mut call: F) -> Result<T, SynthesisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        match call().await {
            Ok(value) => Ok(value),
            Err(first) => {
                tracing::warn!(unit = label, error = %first, "generation call failed, retrying once");
                tokio::time::sleep(self.retry_delay).await;
                call().await.map_err(|second| {
                    SynthesisError::GenerationFailed(format!(
                        "{label}: first attempt: {first}; retry: {second}"
                    ))
                })
            }
        }
    }
}

pub fn reading_request(material: &AnalyzedMaterial, batch: &ReadingBatch) -> ReadingRequest {
    ReadingRequest {
        title: batch.title.clone(),
        macro_subject: material.macro_subject.clone(),
        topics: vec![ReadingBatchRequest {
            topics: batch.topics.clone(),
            title: batch.title.clone(),
            learning_outcome: batch.learning_outcome.clone(),
        }],
        education_level: material.education_level.clone(),
        learning_outcome: material.learning_outcome.clone(),
        duration: material.estimated_duration,
        language: material.language.clone(),
    }
}

pub fn exercise_request(
    material: &AnalyzedMaterial,
    planned: &LessonActivity,
    prior_reading: &str,
) -> ExerciseRequest {
    ExerciseRequest {
        macro_subject: material.macro_subject.clone(),
        topic: planned.topic.clone(),
        topic_explanation: material
            .explanation_for(&planned.topic)
            .unwrap_or_default()
            .to_string(),
        education_level: material.education_level.clone(),
        learning_outcome: planned.learning_outcome.clone(),
        material: prior_reading.to_string(),
        solutions_count: planned.generation_params.solutions_count,
        distractors_count: planned.generation_params.distractors_count,
        easy_distractors_count: planned.generation_params.easy_distractors_count,
        activity_kind: planned.activity_kind.clone(),
        language: material.language.clone(),
    }
}
