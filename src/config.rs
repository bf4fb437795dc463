//! Configuration System
//!
//! Hierarchical configuration for the synthesis engine. Defaults are merged
//! with an optional global file (~/.config/lessonflow/config.toml), then the
//! workspace files (config/config.toml and config/{LESSONFLOW_ENV}.toml).

use crate::error::SynthesisError;
use crate::graph::LayoutConfig;
use crate::logging::LoggingConfig;
use crate::synthesis::SynthesisOptions;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// External collaborator endpoints
    #[serde(default)]
    pub services: ServicesConfig,

    /// Synthesis behavior knobs
    #[serde(default)]
    pub synthesis: SynthesisSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Endpoints of the generation and storage collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_generation_url")]
    pub generation_url: String,

    #[serde(default = "default_flow_store_url")]
    pub flow_store_url: String,

    /// Bearer token sent to both collaborators when set
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_generation_url() -> String {
    "http://localhost:8000/api/generation".to_string()
}

fn default_flow_store_url() -> String {
    "http://localhost:8000/api/learning".to_string()
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            generation_url: default_generation_url(),
            flow_store_url: default_flow_store_url(),
            api_key: None,
        }
    }
}

/// Synthesis behavior knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisSettings {
    /// Pause before retrying a failed generation call, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Node placement grid
    #[serde(default)]
    pub layout: LayoutConfig,
}

fn default_retry_delay_ms() -> u64 {
    500
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            layout: LayoutConfig::default(),
        }
    }
}

impl SynthesisSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl EngineConfig {
    /// Load configuration for the given workspace root.
    pub fn load(workspace_root: &Path) -> Result<Self, SynthesisError> {
        let mut builder = builder_with_defaults()?;
        builder = add_global_source(builder)?;
        builder = add_workspace_sources(builder, workspace_root)?;
        let merged = builder.build()?;
        let config: EngineConfig = merged.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file, skipping the global and
    /// workspace lookup entirely.
    pub fn load_from_file(path: &Path) -> Result<Self, SynthesisError> {
        let merged = builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?;
        let config: EngineConfig = merged.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SynthesisError> {
        if self.services.generation_url.trim().is_empty() {
            return Err(SynthesisError::Config(
                "services.generation_url must not be empty".to_string(),
            ));
        }
        if self.services.flow_store_url.trim().is_empty() {
            return Err(SynthesisError::Config(
                "services.flow_store_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            layout: self.synthesis.layout,
            retry_delay: self.synthesis.retry_delay(),
        }
    }
}

/// Create a Config builder with merge policy defaults applied.
fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    Config::builder()
        .set_default("services.generation_url", default_generation_url())?
        .set_default("services.flow_store_url", default_flow_store_url())?
        .set_default("synthesis.retry_delay_ms", 500i64)
}

/// Path to the global config file.
fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("lessonflow")
            .join("config.toml")
    })
}

/// Add the global config file source to the builder if it exists.
fn add_global_source(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let canonical = global_path
                .canonicalize()
                .unwrap_or_else(|_| global_path.clone());
            if let Some(path_str) = canonical.to_str() {
                builder = builder.add_source(File::with_name(path_str).required(false));
            }
        }
    }
    Ok(builder)
}

/// Add workspace config files to the builder.
/// Precedence: config/config.toml (base) then config/{LESSONFLOW_ENV}.toml.
fn add_workspace_sources(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    let config_dir = workspace_root.join("config");
    let env_name = std::env::var("LESSONFLOW_ENV").unwrap_or_else(|_| "development".to_string());

    let mut builder = builder;

    let base_config_path = config_dir.join("config.toml");
    if base_config_path.exists() {
        if let Some(path_str) = base_config_path.to_str() {
            builder = builder.add_source(File::with_name(path_str).required(false));
        }
    }

    let env_config_path = config_dir.join(format!("{}.toml", env_name));
    if env_config_path.exists() {
        if let Some(path_str) = env_config_path.to_str() {
            builder = builder.add_source(File::with_name(path_str).required(false));
        }
    }

    Ok(builder)
}
