//! CLI domain: parse, route, output, and presentation only.
//! No synthesis orchestration; the route table dispatches to the engine.

use crate::config::EngineConfig;
use crate::error::SynthesisError;
use crate::graph::LearningFlow;
use crate::material::{AnalyzedMaterial, LessonPlan};
use crate::persist::{FileFlowStore, FlowStore, HttpFlowStore};
use crate::planner::{self, PlannedUnit, SynthesisPlan};
use crate::progress::TracingProgress;
use crate::provider::{GenerationService, HttpGenerationService};
use crate::synthesis::{SynthesisEngine, SynthesisReport};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lessonflow CLI - Learning path synthesis engine
#[derive(Parser)]
#[command(name = "lessonflow")]
#[command(about = "Synthesizes branched activity flows from analyzed material and lesson plans")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Silence all log output
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a learning flow and persist it
    Synthesize {
        /// Analyzed source material (JSON)
        #[arg(long)]
        material: PathBuf,

        /// Approved lesson plan (JSON)
        #[arg(long)]
        lesson: PathBuf,

        /// Write the finished flow to a local file instead of the
        /// configured store
        #[arg(long)]
        out: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Preview the unit sequence for a lesson without calling any service
    Plan {
        /// Analyzed source material (JSON)
        #[arg(long)]
        material: PathBuf,

        /// Approved lesson plan (JSON)
        #[arg(long)]
        lesson: PathBuf,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Analyze raw source text into structured material
    Analyze {
        /// Plain-text source document
        #[arg(long)]
        text: PathBuf,

        /// Write the analyzed material to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check the structural invariants of a stored flow document
    Validate {
        /// Flow document (JSON)
        flow: PathBuf,
    },
}

/// Map engine errors to a string for CLI output.
/// Keeps route handlers thin; extend with stable categories if needed.
pub fn map_error(e: &SynthesisError) -> String {
    e.to_string()
}

/// Runtime context for CLI execution: engine configuration resolved once.
pub struct RunContext {
    config: EngineConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: &Path, config_path: Option<&Path>) -> Result<Self, SynthesisError> {
        let config = match config_path {
            Some(path) => EngineConfig::load_from_file(path)?,
            None => EngineConfig::load(workspace_root)?,
        };
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Execute one parsed command and return its printable output.
    pub fn execute(&self, command: &Commands) -> Result<String, SynthesisError> {
        match command {
            Commands::Synthesize {
                material,
                lesson,
                out,
                format,
            } => {
                let material: AnalyzedMaterial = read_document(material)?;
                let lesson: LessonPlan = read_document(lesson)?;
                let report = self.run_synthesis(&material, &lesson, out.as_deref())?;
                if format == "json" {
                    format_report_json(&report)
                } else {
                    Ok(format_report_text(&report))
                }
            }
            Commands::Plan {
                material,
                lesson,
                format,
            } => {
                let material: AnalyzedMaterial = read_document(material)?;
                let lesson: LessonPlan = read_document(lesson)?;
                let plan = planner::plan(&material.topics, &lesson.activities);
                if format == "json" {
                    format_plan_json(&plan)
                } else {
                    Ok(format_plan_text(&lesson.title, &plan))
                }
            }
            Commands::Analyze { text, out } => {
                let source = std::fs::read_to_string(text)?;
                let material = self.run_analysis(&source)?;
                let rendered = serde_json::to_string_pretty(&material)
                    .map_err(|e| SynthesisError::InvalidDocument(e.to_string()))?;
                match out {
                    Some(path) => {
                        std::fs::write(path, &rendered)?;
                        Ok(format!("Analyzed material written to {}", path.display()))
                    }
                    None => Ok(rendered),
                }
            }
            Commands::Validate { flow } => {
                let flow: LearningFlow = read_document(flow)?;
                flow.validate()?;
                Ok(format_validated_flow(&flow))
            }
        }
    }

    fn run_synthesis(
        &self,
        material: &AnalyzedMaterial,
        lesson: &LessonPlan,
        out: Option<&Path>,
    ) -> Result<SynthesisReport, SynthesisError> {
        let services = &self.config.services;
        let service = Arc::new(HttpGenerationService::new(
            services.generation_url.clone(),
            services.api_key.clone(),
        )?);
        let store: Arc<dyn FlowStore> = match out {
            Some(path) => Arc::new(FileFlowStore::new(path)),
            None => Arc::new(HttpFlowStore::new(
                services.flow_store_url.clone(),
                services.api_key.clone(),
            )?),
        };
        let engine = SynthesisEngine::new(
            service,
            store,
            Arc::new(TracingProgress),
            self.config.synthesis_options(),
        );
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(engine.synthesize(material, lesson))
    }

    fn run_analysis(&self, text: &str) -> Result<AnalyzedMaterial, SynthesisError> {
        let services = &self.config.services;
        let service = HttpGenerationService::new(
            services.generation_url.clone(),
            services.api_key.clone(),
        )?;
        let rt = tokio::runtime::Runtime::new()?;
        Ok(rt.block_on(service.analyze_material(text))?)
    }
}

/// Parse a JSON document from disk.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, SynthesisError> {
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text)
        .map_err(|e| SynthesisError::InvalidDocument(format!("{}: {}", path.display(), e)))
}

/// Format a section heading with bold/underline. Respects NO_COLOR and TTY.
fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Format a synthesis report as human-readable text.
pub fn format_report_text(report: &SynthesisReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Synthesis Report")));
    out.push_str(&format!("  Flow id: {}\n", report.flow_id));
    out.push_str(&format!("  Elapsed: {}ms\n\n", report.elapsed.as_millis()));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Units", "Completed", "Skipped", "Nodes", "Edges"]);
    table.add_row(vec![
        report.units_total.to_string(),
        report.units_completed.to_string(),
        report.units_skipped.to_string(),
        report.node_count.to_string(),
        report.edge_count.to_string(),
    ]);
    out.push_str(&format!("{}\n", table));
    if !report.warnings.is_empty() {
        out.push_str(&format!(
            "\n{} ({}):\n",
            format_section_heading("Warnings"),
            report.warnings.len()
        ));
        for warning in &report.warnings {
            out.push_str(&format!("  - {}\n", warning));
        }
    }
    out
}

/// Format a synthesis report as JSON.
pub fn format_report_json(report: &SynthesisReport) -> Result<String, SynthesisError> {
    let out = serde_json::json!({
        "flowId": report.flow_id,
        "unitsTotal": report.units_total,
        "unitsCompleted": report.units_completed,
        "unitsSkipped": report.units_skipped,
        "nodeCount": report.node_count,
        "edgeCount": report.edge_count,
        "warnings": report.warnings,
        "elapsedMs": report.elapsed.as_millis() as u64,
    });
    serde_json::to_string_pretty(&out).map_err(|e| SynthesisError::InvalidDocument(e.to_string()))
}

/// Format a unit plan as human-readable text.
pub fn format_plan_text(lesson_title: &str, plan: &SynthesisPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Plan for '{}'", lesson_title))
    ));
    out.push_str(&format!(
        "  Units: {} ({} readings, {} exercises)\n\n",
        plan.unit_count(),
        plan.reading_unit_count(),
        plan.exercise_unit_count()
    ));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Unit", "Detail"]);
    for (index, unit) in plan.units.iter().enumerate() {
        let (kind, detail) = match unit {
            PlannedUnit::Reading(batch) => {
                let names: Vec<&str> = batch.topics.iter().map(|t| t.name.as_str()).collect();
                ("reading".to_string(), names.join(", "))
            }
            PlannedUnit::Exercise(activity) => {
                (activity.activity_kind.clone(), activity.topic.clone())
            }
        };
        table.add_row(vec![(index + 1).to_string(), kind, detail]);
    }
    out.push_str(&format!("{}\n", table));
    if !plan.warnings.is_empty() {
        out.push_str(&format!(
            "\n{} ({}):\n",
            format_section_heading("Warnings"),
            plan.warnings.len()
        ));
        for warning in &plan.warnings {
            out.push_str(&format!("  - {}\n", warning));
        }
    }
    out
}

/// Format a unit plan as JSON.
pub fn format_plan_json(plan: &SynthesisPlan) -> Result<String, SynthesisError> {
    let units: Vec<serde_json::Value> = plan
        .units
        .iter()
        .map(|unit| match unit {
            PlannedUnit::Reading(batch) => serde_json::json!({
                "unit": "reading",
                "title": batch.title,
                "topics": batch.topics.iter().map(|t| t.name.clone()).collect::<Vec<_>>(),
            }),
            PlannedUnit::Exercise(activity) => serde_json::json!({
                "unit": "exercise",
                "activityKind": activity.activity_kind,
                "topic": activity.topic,
            }),
        })
        .collect();
    let out = serde_json::json!({
        "units": units,
        "coveredTopics": plan.covered_topics,
        "warnings": plan.warnings,
    });
    serde_json::to_string_pretty(&out).map_err(|e| SynthesisError::InvalidDocument(e.to_string()))
}

/// Format the success line for a validated flow document.
pub fn format_validated_flow(flow: &LearningFlow) -> String {
    format!(
        "Validation passed:\n  Flow: {}\n  Nodes: {}\n  Edges: {}\n  All checks passed",
        flow.title,
        flow.node_count(),
        flow.edge_count()
    )
}
