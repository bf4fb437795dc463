//! Activity response adaptation.
//!
//! Raw generation results arrive in one loose shape regardless of activity
//! kind. The adapter normalizes each result into the payload its node kind
//! expects, delegating candidate shuffling to [`crate::shuffle`] for
//! choice-based kinds.

use crate::error::SynthesisError;
use crate::material::{ActivityKind, GeneratedActivity, ReadingMaterial};
use crate::shuffle::shuffle_with_mask;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Node-ready activity content. One variant per renderable shape; richer
/// planned kinds collapse onto `OpenQuestion`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActivityPayload {
    #[serde(rename_all = "camelCase")]
    Reading {
        title: String,
        macro_subject: String,
        material: String,
    },
    #[serde(rename_all = "camelCase")]
    OpenQuestion {
        question: String,
        possible_answer: String,
    },
    #[serde(rename_all = "camelCase")]
    ShortAnswer {
        question: String,
        correct_answer: String,
    },
    #[serde(rename_all = "camelCase")]
    TrueFalse {
        instructions: String,
        statements: Vec<String>,
        correct_statement_mask: Vec<bool>,
    },
    #[serde(rename_all = "camelCase")]
    MultipleChoice {
        question: String,
        choices: Vec<String>,
        correct_choice_mask: Vec<bool>,
    },
}

impl ActivityPayload {
    pub fn from_reading(material: &ReadingMaterial) -> Self {
        ActivityPayload::Reading {
            title: material.title.clone(),
            macro_subject: material.macro_subject.clone(),
            material: material.material.clone(),
        }
    }
}

/// Normalize one raw generation result into its node payload.
///
/// The activity kind is parsed here so an unrecognized kind fails this unit
/// with [`SynthesisError::UnsupportedActivityKind`] and nothing else.
pub fn adapt<R: Rng + ?Sized>(
    rng: &mut R,
    raw: &GeneratedActivity,
) -> Result<ActivityPayload, SynthesisError> {
    let kind: ActivityKind = raw.activity_kind.parse()?;
    Ok(match kind {
        ActivityKind::OpenQuestion | ActivityKind::FillTheBlanks | ActivityKind::Matching => {
            as_open_question(raw)
        }
        ActivityKind::ShortAnswer => ActivityPayload::ShortAnswer {
            question: raw.assignment.clone(),
            correct_answer: raw.solutions.first().cloned().unwrap_or_default(),
        },
        ActivityKind::TrueFalse => {
            let statements: Vec<String> = raw
                .solutions
                .iter()
                .map(|s| strip_enumeration_prefix(s))
                .collect();
            let shuffled = shuffle_with_mask(
                rng,
                &statements,
                &raw.distractors,
                &raw.easily_discardable_distractors,
            );
            ActivityPayload::TrueFalse {
                instructions: raw.assignment.clone(),
                statements: shuffled.candidates,
                correct_statement_mask: shuffled.mask,
            }
        }
        ActivityKind::MultipleChoice => {
            let shuffled = shuffle_with_mask(
                rng,
                &raw.solutions,
                &raw.distractors,
                &raw.easily_discardable_distractors,
            );
            ActivityPayload::MultipleChoice {
                question: raw.assignment.clone(),
                choices: shuffled.candidates,
                correct_choice_mask: shuffled.mask,
            }
        }
    })
}

/// Flag shuffled activities that arrived with no distractors at all. The
/// activity is still produced; the warning surfaces in the synthesis report.
pub fn quality_warning(raw: &GeneratedActivity) -> Option<String> {
    let kind: ActivityKind = raw.activity_kind.parse().ok()?;
    if kind.is_shuffled()
        && raw.distractors.is_empty()
        && raw.easily_discardable_distractors.is_empty()
    {
        Some(format!(
            "activity on topic '{}' was generated without distractors",
            raw.topic
        ))
    } else {
        None
    }
}

fn as_open_question(raw: &GeneratedActivity) -> ActivityPayload {
    ActivityPayload::OpenQuestion {
        question: raw.assignment.clone(),
        possible_answer: raw.solutions.join("\n"),
    }
}

/// The generation service numbers its correct statements ("1. ..."); strip
/// that prefix so shuffled statements carry no ordering hint.
fn strip_enumeration_prefix(statement: &str) -> String {
    let trimmed = statement.trim_start();
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = trimmed[digits..].strip_prefix('.') {
            return rest.trim_start().to_string();
        }
    }
    statement.to_string()
}
