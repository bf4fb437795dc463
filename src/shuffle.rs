//! Candidate shuffling for assessment payloads.
//!
//! Choice-based activities present solutions and distractors in one flat list.
//! The shuffle keeps a parallel correctness mask so graders never depend on
//! candidate order.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Placeholder the generation service emits for unused candidate slots.
pub const EMPTY_SENTINEL: &str = "EMPTY";

/// A shuffled candidate list and its parallel correctness mask.
///
/// `mask[i]` is true iff `candidates[i]` appears in the original solution set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffledCandidates {
    pub candidates: Vec<String>,
    pub mask: Vec<bool>,
}

impl ShuffledCandidates {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn correct_count(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }
}

fn keep(entry: &str) -> bool {
    let trimmed = entry.trim();
    !trimmed.is_empty() && trimmed != EMPTY_SENTINEL
}

/// Combine correct answers with both distractor groups, drop blank and
/// sentinel entries, and shuffle the remainder with the supplied rng.
pub fn shuffle_with_mask<R: Rng + ?Sized>(
    rng: &mut R,
    correct: &[String],
    distractors: &[String],
    easy_distractors: &[String],
) -> ShuffledCandidates {
    let correct_set: HashSet<&str> = correct
        .iter()
        .map(|s| s.trim())
        .filter(|s| keep(s))
        .collect();

    let mut candidates: Vec<String> = correct
        .iter()
        .chain(distractors.iter())
        .chain(easy_distractors.iter())
        .filter(|entry| keep(entry))
        .map(|entry| entry.trim().to_string())
        .collect();

    candidates.shuffle(rng);

    let mask = candidates
        .iter()
        .map(|candidate| correct_set.contains(candidate.as_str()))
        .collect();

    ShuffledCandidates { candidates, mask }
}
