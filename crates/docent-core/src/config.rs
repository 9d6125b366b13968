//! Persisted config (Ollama endpoint, models, retrieval knobs) in the app data directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app_data;
use crate::chunks::{ChunkOptions, DEFAULT_MIN_CHARS};
use crate::ollama::{DEFAULT_BASE_URL, DEFAULT_EMBED_MODEL, DEFAULT_GENERATE_MODEL};

const CONFIG_FILENAME: &str = "config.toml";

/// Number of chunks handed to the answer generator per question.
pub const DEFAULT_TOP_K: usize = 5;
/// Upper bound on generated tokens per answer.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Ollama server.
    pub ollama_url: String,
    pub embed_model: String,
    pub generate_model: String,
    /// Paragraphs whose trimmed length is at or below this are dropped.
    pub min_chunk_chars: usize,
    /// Paragraphs longer than this are split further. `None` keeps whole paragraphs.
    pub max_chunk_chars: Option<usize>,
    pub top_k: usize,
    pub max_output_tokens: u32,
    /// Deadline for a single generation call. `None` waits for the model.
    pub generation_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_BASE_URL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            generate_model: DEFAULT_GENERATE_MODEL.to_string(),
            min_chunk_chars: DEFAULT_MIN_CHARS,
            max_chunk_chars: None,
            top_k: DEFAULT_TOP_K,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            generation_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn chunk_options(&self) -> ChunkOptions {
        ChunkOptions {
            min_chars: self.min_chunk_chars,
            max_chars: self.max_chunk_chars,
        }
    }

    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_secs.map(Duration::from_secs)
    }
}

/// Path of the config file in the app data directory, if it can be determined.
pub fn config_path() -> Option<PathBuf> {
    app_data::app_data_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

/// Load config from the app data directory. Returns default config if missing or invalid.
pub fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }
    match load_config_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            Config::default()
        }
    }
}

/// Load config from an explicit path. Unlike [`load_config`], failures are reported.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    toml::from_str(&s).map_err(ConfigError::Parse)
}

/// Save config to the app data directory. Returns the path written.
pub fn save_config(config: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoDataDir)?;
    save_config_to(config, &path)?;
    Ok(path)
}

/// Save config to an explicit path.
pub fn save_config_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let s = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    std::fs::write(path, s).map_err(ConfigError::Write)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine app data directory")]
    NoDataDir,
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(std::io::Error),
}
