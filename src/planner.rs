//! Topic batch planning.
//!
//! Walks the approved lesson's activities in order and decides, per activity,
//! whether a reading batch must be generated first. Topics are covered at
//! most once per run: the first activity needing an uncovered topic pulls in
//! every not-yet-covered topic from the master list up to and including its
//! own, bundled as a single reading request.

use crate::material::{LessonActivity, Topic};
use std::collections::HashSet;

/// One reading-generation request covering a contiguous run of topics.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingBatch {
    /// Name of the topic that triggered the batch. Used as the request title.
    pub title: String,
    pub learning_outcome: String,
    pub topics: Vec<Topic>,
}

/// A unit of work for the generator, in execution order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedUnit {
    Reading(ReadingBatch),
    Exercise(LessonActivity),
}

impl PlannedUnit {
    pub fn describe(&self) -> String {
        match self {
            PlannedUnit::Reading(batch) => {
                format!("reading batch '{}' ({} topics)", batch.title, batch.topics.len())
            }
            PlannedUnit::Exercise(activity) => {
                format!("{} exercise on '{}'", activity.activity_kind, activity.topic)
            }
        }
    }
}

/// The full unit sequence for one synthesis run.
#[derive(Debug, Clone, Default)]
pub struct SynthesisPlan {
    pub units: Vec<PlannedUnit>,
    /// Names of every topic bundled into a reading batch, in batching order.
    pub covered_topics: Vec<String>,
    pub warnings: Vec<String>,
}

impl SynthesisPlan {
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn reading_unit_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u, PlannedUnit::Reading(_)))
            .count()
    }

    pub fn exercise_unit_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u, PlannedUnit::Exercise(_)))
            .count()
    }
}

/// Interleave reading batches and exercises for the given lesson.
///
/// An activity whose topic is missing from the master list still produces an
/// exercise unit; it simply gets no reading support, and the gap is recorded
/// as a warning.
pub fn plan(topics: &[Topic], activities: &[LessonActivity]) -> SynthesisPlan {
    let mut covered: HashSet<String> = HashSet::new();
    let mut covered_topics = Vec::new();
    let mut units = Vec::new();
    let mut warnings = Vec::new();

    for activity in activities {
        match topics.iter().position(|t| t.name == activity.topic) {
            Some(position) => {
                if !covered.contains(&activity.topic) {
                    let batch: Vec<Topic> = topics[..=position]
                        .iter()
                        .filter(|t| !covered.contains(&t.name))
                        .cloned()
                        .collect();
                    for topic in &batch {
                        covered.insert(topic.name.clone());
                        covered_topics.push(topic.name.clone());
                    }
                    units.push(PlannedUnit::Reading(ReadingBatch {
                        title: activity.topic.clone(),
                        learning_outcome: activity.learning_outcome.clone(),
                        topics: batch,
                    }));
                }
            }
            None => {
                warnings.push(format!(
                    "topic '{}' is not part of the analyzed material; generating the exercise without reading support",
                    activity.topic
                ));
            }
        }
        units.push(PlannedUnit::Exercise(activity.clone()));
    }

    SynthesisPlan {
        units,
        covered_topics,
        warnings,
    }
}
