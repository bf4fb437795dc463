//! Lessonflow: Learning Path Synthesis Engine
//!
//! Turns analyzed source material and an approved lesson plan into a branched
//! activity flow: a directed graph of reading, assessment, and recovery nodes
//! wired with pass/fail edges and persisted through a storage collaborator.

pub mod activity;
pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod graph;
pub mod logging;
pub mod material;
pub mod persist;
pub mod planner;
pub mod progress;
pub mod provider;
pub mod shuffle;
pub mod synthesis;

pub use error::{ServiceError, SynthesisError};
pub use synthesis::{SynthesisEngine, SynthesisOptions, SynthesisReport};
