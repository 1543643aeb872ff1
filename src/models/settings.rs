//! Settings Models
//!
//! Application configuration and settings data structures.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use will_of_code_llm::{ProviderConfig, DEFAULT_MODEL};

/// Where suspended turns are kept between proposal and decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Generation collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// OpenAI-compatible chat completions URL; `None` uses the default endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            temperature: 0.2,
            max_tokens: 4096,
            timeout_secs: 60,
        }
    }
}

impl ProviderSettings {
    /// Build the provider configuration, reading the API key from the
    /// environment.
    pub fn to_provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty()),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Application configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderSettings,
    /// Bound on a single Tool Bridge call
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    /// Suspended turns older than this are evicted
    #[serde(default = "default_checkpoint_idle_secs")]
    pub checkpoint_idle_secs: u64,
    /// How often the background sweeper looks for idle checkpoints
    #[serde(default = "default_checkpoint_sweep_secs")]
    pub checkpoint_sweep_secs: u64,
    /// Below this confidence a request that needs clarification is answered
    /// with a question instead of a handler
    #[serde(default = "default_clarification_threshold")]
    pub clarification_threshold: f32,
    /// Blocked path substrings added to the built-in deny-list
    #[serde(default)]
    pub extra_blocked_paths: Vec<String>,
    /// Root for relative tool paths; `None` means the process working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,
    /// Interpreter used by `execute_code`
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default)]
    pub checkpoint_backend: CheckpointBackend,
    /// SQLite file for the `sqlite` backend; `None` uses ~/.will-of-code/checkpoints.db
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_db_path: Option<PathBuf>,
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_checkpoint_idle_secs() -> u64 {
    3600
}

fn default_checkpoint_sweep_secs() -> u64 {
    60
}

fn default_clarification_threshold() -> f32 {
    0.6
}

fn default_interpreter() -> String {
    "python3".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            tool_timeout_secs: default_tool_timeout_secs(),
            checkpoint_idle_secs: default_checkpoint_idle_secs(),
            checkpoint_sweep_secs: default_checkpoint_sweep_secs(),
            clarification_threshold: default_clarification_threshold(),
            extra_blocked_paths: Vec::new(),
            workspace_root: None,
            interpreter: default_interpreter(),
            checkpoint_backend: CheckpointBackend::Memory,
            checkpoint_db_path: None,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub tool_timeout_secs: Option<u64>,
    pub checkpoint_idle_secs: Option<u64>,
    pub clarification_threshold: Option<f32>,
    pub extra_blocked_paths: Option<Vec<String>>,
    pub workspace_root: Option<PathBuf>,
    pub interpreter: Option<String>,
    pub checkpoint_backend: Option<CheckpointBackend>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(model) = update.model {
            self.provider.model = model;
        }
        if let Some(base_url) = update.base_url {
            self.provider.base_url = Some(base_url);
        }
        if let Some(secs) = update.tool_timeout_secs {
            self.tool_timeout_secs = secs;
        }
        if let Some(secs) = update.checkpoint_idle_secs {
            self.checkpoint_idle_secs = secs;
        }
        if let Some(threshold) = update.clarification_threshold {
            self.clarification_threshold = threshold;
        }
        if let Some(paths) = update.extra_blocked_paths {
            self.extra_blocked_paths = paths;
        }
        if let Some(root) = update.workspace_root {
            self.workspace_root = Some(root);
        }
        if let Some(interpreter) = update.interpreter {
            self.interpreter = interpreter;
        }
        if let Some(backend) = update.checkpoint_backend {
            self.checkpoint_backend = backend;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.tool_timeout_secs == 0 || self.tool_timeout_secs > 600 {
            return Err(format!(
                "tool_timeout_secs must be between 1 and 600, got {}",
                self.tool_timeout_secs
            ));
        }

        if self.checkpoint_idle_secs < 1 {
            return Err("checkpoint_idle_secs must be at least 1 second".to_string());
        }

        if self.checkpoint_sweep_secs < 1 {
            return Err("checkpoint_sweep_secs must be at least 1 second".to_string());
        }

        if !(0.0..=1.0).contains(&self.clarification_threshold) {
            return Err(format!(
                "clarification_threshold must be within [0, 1], got {}",
                self.clarification_threshold
            ));
        }

        if self.interpreter.trim().is_empty() {
            return Err("interpreter must not be empty".to_string());
        }

        if self.extra_blocked_paths.iter().any(|p| p.trim().is_empty()) {
            return Err("extra_blocked_paths must not contain empty entries".to_string());
        }

        if self.provider.model.trim().is_empty() {
            return Err("provider.model must not be empty".to_string());
        }

        Ok(())
    }

    /// Workspace root, falling back to the process working directory.
    pub fn resolved_workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
