//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Model gateway configuration.
///
/// The API key is loaded at runtime from the environment, not from the
/// TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GatewayConfig {
    /// Base URL of the `OpenAI`-compatible chat-completions API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier requested for every invocation.
    #[serde(default = "default_model")]
    pub model: String,
    /// Bearer token for the gateway (populated at runtime).
    #[serde(skip)]
    pub api_key: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: String::new(),
        }
    }
}

fn default_base_url() -> String {
    "https://ai-gateway.vercel.sh/v1".into()
}

fn default_model() -> String {
    "anthropic/claude-sonnet-4.5".into()
}

/// Agent loop configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    /// Hard ceiling on model turns per edit invocation.
    #[serde(default = "default_turn_ceiling")]
    pub turn_ceiling: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            turn_ceiling: default_turn_ceiling(),
        }
    }
}

fn default_turn_ceiling() -> u32 {
    15
}

/// Workflow engine configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowConfig {
    /// Time-to-live for progress records, in seconds.
    #[serde(default = "default_progress_ttl_seconds")]
    pub progress_ttl_seconds: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            progress_ttl_seconds: default_progress_ttl_seconds(),
        }
    }
}

fn default_progress_ttl_seconds() -> u64 {
    300
}

fn default_http_port() -> u16 {
    3000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/copydesk.db")
}

/// Top-level server configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// HTTP port the API listens on.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Path to the `SQLite` database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Model gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Agent loop settings.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Workflow engine settings.
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the gateway API key from the `GATEWAY_API_KEY` env var.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the variable is unset or empty.
    pub fn load_credentials(&mut self) -> Result<()> {
        let key = env::var("GATEWAY_API_KEY")
            .map_err(|_| AppError::Config("GATEWAY_API_KEY is not set".into()))?;
        if key.is_empty() {
            return Err(AppError::Config("GATEWAY_API_KEY is empty".into()));
        }
        self.gateway.api_key = key;
        Ok(())
    }

    /// Progress-record TTL as a [`Duration`].
    #[must_use]
    pub fn progress_ttl(&self) -> Duration {
        Duration::from_secs(self.workflow.progress_ttl_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.agent.turn_ceiling == 0 {
            return Err(AppError::Config(
                "agent.turn_ceiling must be greater than zero".into(),
            ));
        }
        if self.workflow.progress_ttl_seconds == 0 {
            return Err(AppError::Config(
                "workflow.progress_ttl_seconds must be greater than zero".into(),
            ));
        }
        if self.gateway.base_url.is_empty() {
            return Err(AppError::Config("gateway.base_url must not be empty".into()));
        }
        Ok(())
    }
}
