//! Learning Path Synthesis
//!
//! Drives the whole pipeline: plan topic batches, generate units in strict
//! sequence, assemble the flow graph, and persist it. One engine invocation
//! owns all intermediate state; nothing is shared across runs.

use crate::error::SynthesisError;
use crate::generator::UnitGenerator;
use crate::graph::{
    FlowAssembler, FlowMetadata, GeneratedUnit, LayoutConfig, LearningFlow,
};
use crate::material::{AnalyzedMaterial, LessonPlan};
use crate::persist::FlowStore;
use crate::planner;
use crate::progress::{FlowOutcome, ProgressEvent, ProgressSink};
use crate::provider::GenerationService;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Tunables for one engine instance.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisOptions {
    pub layout: LayoutConfig,
    /// Pause between the first failed attempt and its retry.
    pub retry_delay: Duration,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Summary of one completed synthesis run.
#[derive(Debug, Clone)]
pub struct SynthesisReport {
    pub flow_id: String,
    pub units_total: usize,
    pub units_completed: usize,
    pub units_skipped: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub warnings: Vec<String>,
    pub elapsed: Duration,
}

/// The synthesis engine. Construct once, invoke per lesson.
pub struct SynthesisEngine {
    service: Arc<dyn GenerationService>,
    store: Arc<dyn FlowStore>,
    progress: Arc<dyn ProgressSink>,
    options: SynthesisOptions,
}

impl SynthesisEngine {
    pub fn new(
        service: Arc<dyn GenerationService>,
        store: Arc<dyn FlowStore>,
        progress: Arc<dyn ProgressSink>,
        options: SynthesisOptions,
    ) -> Self {
        Self {
            service,
            store,
            progress,
            options,
        }
    }

    /// Turn an analyzed document and an approved lesson into a persisted flow.
    ///
    /// Per-unit generation failures are absorbed: the unit is skipped and the
    /// run continues. Structural and persistence failures abort the run and
    /// nothing is persisted.
    pub async fn synthesize(
        &self,
        material: &AnalyzedMaterial,
        lesson: &LessonPlan,
    ) -> Result<SynthesisReport, SynthesisError> {
        let result = self.run(material, lesson).await;
        match &result {
            Ok(report) => self.progress.flow_finished(&FlowOutcome::Persisted {
                flow_id: report.flow_id.clone(),
            }),
            Err(error) => self.progress.flow_finished(&FlowOutcome::Failed {
                message: error.to_string(),
            }),
        }
        result
    }

    async fn run(
        &self,
        material: &AnalyzedMaterial,
        lesson: &LessonPlan,
    ) -> Result<SynthesisReport, SynthesisError> {
        let started = Instant::now();
        let plan = planner::plan(&material.topics, &lesson.activities);
        let mut warnings = plan.warnings.clone();

        tracing::info!(
            lesson = %lesson.title,
            units = plan.unit_count(),
            readings = plan.reading_unit_count(),
            exercises = plan.exercise_unit_count(),
            "synthesis started"
        );

        let generator = UnitGenerator::new(self.service.clone(), self.options.retry_delay);
        let mut assembler = FlowAssembler::new(self.options.layout, &material.macro_subject);

        let total = plan.unit_count();
        let mut completed = 0usize;
        let mut skipped = 0usize;
        let mut last_reading = String::new();

        for unit in &plan.units {
            match generator.generate_unit(material, unit, &last_reading).await {
                Ok(outcome) => {
                    if let GeneratedUnit::Reading { payload, .. } = &outcome.unit {
                        if let crate::activity::ActivityPayload::Reading { material: text, .. } =
                            payload
                        {
                            last_reading = text.clone();
                        }
                    }
                    if let Some(warning) = outcome.warning {
                        warnings.push(warning);
                    }
                    assembler.push_unit(outcome.unit);
                    completed += 1;
                    self.progress.unit_completed(ProgressEvent {
                        units_completed: completed,
                        units_total: total,
                    });
                }
                Err(error) if !error.is_fatal() => {
                    tracing::warn!(unit = %unit.describe(), error = %error, "unit skipped");
                    warnings.push(format!("skipped {}: {}", unit.describe(), error));
                    skipped += 1;
                }
                Err(error) => return Err(error),
            }
        }

        let (nodes, edges) = assembler.finish(&lesson.title)?;
        let flow = LearningFlow {
            id: Uuid::new_v4().to_string(),
            title: lesson.title.clone(),
            description: material.learning_outcome.clone(),
            tags: material.keywords.clone(),
            topics: plan.covered_topics.clone(),
            nodes,
            edges,
            metadata: FlowMetadata {
                macro_subject: material.macro_subject.clone(),
                education_level: material.education_level.clone(),
                language: material.language.clone(),
                estimated_duration: estimated_duration(material, lesson),
                created_at: Utc::now(),
            },
        };
        flow.validate()?;

        let node_count = flow.node_count();
        let edge_count = flow.edge_count();
        let flow_id = self.store.persist(&flow).await?;
        tracing::info!(
            flow_id = %flow_id,
            nodes = node_count,
            edges = edge_count,
            skipped,
            "flow persisted"
        );

        Ok(SynthesisReport {
            flow_id,
            units_total: total,
            units_completed: completed,
            units_skipped: skipped,
            node_count,
            edge_count,
            warnings,
            elapsed: started.elapsed(),
        })
    }
}

/// Reading time from the analysis plus the planned exercise time.
fn estimated_duration(material: &AnalyzedMaterial, lesson: &LessonPlan) -> u32 {
    material.estimated_duration
        + lesson
            .activities
            .iter()
            .map(|a| a.duration_minutes)
            .sum::<u32>()
}
