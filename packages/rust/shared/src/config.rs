//! Application configuration for bmad-convert.
//!
//! User config lives at `~/.bmadconv/bmadconv.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConverterError, Result};
use crate::types::Target;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "bmadconv.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".bmadconv";

// ---------------------------------------------------------------------------
// Config structs (matching bmadconv.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Claude flavor settings.
    #[serde(default)]
    pub claude: ClaudeConfig,

    /// OpenCode flavor settings.
    #[serde(default)]
    pub opencode: OpenCodeConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Output convention used when `--target` is not given.
    #[serde(default)]
    pub target: Target,

    /// Source `_bmad` directory used when `--source` is not given.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Output directory used when `--output` is not given.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            target: Target::default(),
            source_dir: default_source_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_source_dir() -> String {
    "_bmad".into()
}
fn default_output_dir() -> String {
    ".".into()
}

/// `[claude]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeConfig {
    /// Tools granted to every generated agent.
    #[serde(default = "default_claude_tools")]
    pub tools: Vec<String>,

    /// Model selector written to agent files.
    #[serde(default = "default_claude_model")]
    pub model: String,

    /// Permission mode written to agent files.
    #[serde(default = "default_permission_mode")]
    pub permission_mode: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            tools: default_claude_tools(),
            model: default_claude_model(),
            permission_mode: default_permission_mode(),
        }
    }
}

fn default_claude_tools() -> Vec<String> {
    ["Read", "Write", "Edit", "Bash", "Glob", "Grep"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_claude_model() -> String {
    "inherit".into()
}
fn default_permission_mode() -> String {
    "default".into()
}

/// `[opencode]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenCodeConfig {
    /// Agent mode: "subagent", "primary" or "all".
    #[serde(default = "default_agent_mode")]
    pub agent_mode: String,
}

impl Default for OpenCodeConfig {
    fn default() -> Self {
        Self {
            agent_mode: default_agent_mode(),
        }
    }
}

fn default_agent_mode() -> String {
    "subagent".into()
}

// ---------------------------------------------------------------------------
// Flavor options (runtime, threaded into the serializers)
// ---------------------------------------------------------------------------

/// Per-flavor constants for the serializers, resolved once by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlavorOptions {
    pub claude_tools: Vec<String>,
    pub claude_model: String,
    pub claude_permission_mode: String,
    pub opencode_agent_mode: String,
}

impl Default for FlavorOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FlavorOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            claude_tools: config.claude.tools.clone(),
            claude_model: config.claude.model.clone(),
            claude_permission_mode: config.claude.permission_mode.clone(),
            opencode_agent_mode: config.opencode.agent_mode.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.bmadconv/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ConverterError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.bmadconv/bmadconv.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ConverterError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ConverterError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ConverterError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ConverterError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ConverterError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
