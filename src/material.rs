//! Source-side data model: analyzed material, lesson outlines, and raw
//! generation results.
//!
//! Everything here is input to the synthesis pipeline. Wire names are
//! camelCase because the collaborating services speak the analyzer's JSON
//! dialect.

use crate::error::SynthesisError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single topic extracted from the source document. Referenced by name as a
/// key everywhere else in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub explanation: String,
}

/// Output of the upstream material analysis step. Read-only input to the
/// engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedMaterial {
    pub title: String,
    pub macro_subject: String,
    pub education_level: String,
    pub learning_outcome: String,
    pub language: String,
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Estimated studying time in minutes.
    #[serde(default)]
    pub estimated_duration: u32,
}

impl AnalyzedMaterial {
    /// Look up a topic's explanation by name.
    pub fn explanation_for(&self, topic_name: &str) -> Option<&str> {
        self.topics
            .iter()
            .find(|t| t.name == topic_name)
            .map(|t| t.explanation.as_str())
    }
}

/// The approved lesson outline: an ordered list of planned activities. Order
/// determines graph layout order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
    pub title: String,
    pub activities: Vec<LessonActivity>,
}

/// One planned learning activity.
///
/// `activity_kind` stays a raw string here: lesson outlines arrive from the
/// editor collaborator, and an unrecognized kind must fail that single unit at
/// generation time rather than reject the whole plan at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonActivity {
    pub topic: String,
    pub activity_kind: String,
    pub learning_outcome: String,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub generation_params: GenerationParams,
}

/// Candidate-count knobs forwarded to the exercise generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub solutions_count: u32,
    pub distractors_count: u32,
    pub easy_distractors_count: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            solutions_count: 1,
            distractors_count: 3,
            easy_distractors_count: 1,
        }
    }
}

/// The closed set of activity kinds this engine can shape.
///
/// `FillTheBlanks` and `Matching` are recognized but deliberately rendered as
/// open questions; anything else fails `from_str` with
/// [`SynthesisError::UnsupportedActivityKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    #[serde(rename = "open question")]
    OpenQuestion,
    #[serde(rename = "short answer")]
    ShortAnswer,
    #[serde(rename = "true or false")]
    TrueFalse,
    #[serde(rename = "multiple choice")]
    MultipleChoice,
    #[serde(rename = "fill the blanks")]
    FillTheBlanks,
    #[serde(rename = "matching")]
    Matching,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::OpenQuestion => "open question",
            ActivityKind::ShortAnswer => "short answer",
            ActivityKind::TrueFalse => "true or false",
            ActivityKind::MultipleChoice => "multiple choice",
            ActivityKind::FillTheBlanks => "fill the blanks",
            ActivityKind::Matching => "matching",
        }
    }

    /// Kinds whose payload requires candidate shuffling.
    pub fn is_shuffled(self) -> bool {
        matches!(self, ActivityKind::TrueFalse | ActivityKind::MultipleChoice)
    }
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = SynthesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open question" | "open-question" => Ok(ActivityKind::OpenQuestion),
            "short answer" | "short-answer" => Ok(ActivityKind::ShortAnswer),
            "true or false" | "true/false" | "true-false" => Ok(ActivityKind::TrueFalse),
            "multiple choice" | "multiple-choice" => Ok(ActivityKind::MultipleChoice),
            "fill the blanks" | "fill-the-blanks" => Ok(ActivityKind::FillTheBlanks),
            "matching" => Ok(ActivityKind::Matching),
            other => Err(SynthesisError::UnsupportedActivityKind(other.to_string())),
        }
    }
}

/// Raw output of the external exercise-generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedActivity {
    /// The question or task text presented to the learner.
    pub assignment: String,
    /// Supplementary explanation returned alongside the assignment.
    #[serde(default)]
    pub plus: String,
    #[serde(default)]
    pub solutions: Vec<String>,
    #[serde(default)]
    pub distractors: Vec<String>,
    #[serde(default)]
    pub easily_discardable_distractors: Vec<String>,
    pub activity_kind: String,
    pub topic: String,
}

/// Response of the reading-material generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingMaterial {
    pub title: String,
    pub macro_subject: String,
    pub material: String,
}
