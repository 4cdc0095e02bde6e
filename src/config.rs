// SPDX-License-Identifier: MIT

//! Engine configuration for taxis
//!
//! Everything here has a built-in default; the config file at
//! `~/.taxis.json` only needs to exist when overriding the remote
//! endpoint or model names. The API key is never stored in the file and
//! comes from the `TAXIS_API_KEY` environment variable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Result, TaxisError};

/// Environment variable holding the bearer token for the model endpoint.
pub const API_KEY_ENV: &str = "TAXIS_API_KEY";

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Remote model engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Prompt templates for name suggestions
    #[serde(default)]
    pub prompts: PromptConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_text_model")]
    pub text: String,
    #[serde(default = "default_vision_model")]
    pub vision: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_image_prompt")]
    pub image: String,
    #[serde(default = "default_audio_prompt")]
    pub audio: String,
    #[serde(default = "default_text_prompt")]
    pub text: String,
}

// Default value functions
fn default_timeout() -> u64 {
    30
}
fn default_url() -> String {
    "https://ai.hackclub.com/proxy/v1/chat/completions".to_string()
}
fn default_text_model() -> String {
    "qwen/qwen3-32b".to_string()
}
fn default_vision_model() -> String {
    "qwen/qwen3-vl-235b-a22b-instruct".to_string()
}

fn default_image_prompt() -> String {
    "Analyze this image and suggest a SHORT descriptive filename \
     (2-4 words, no extension). Return ONLY the filename."
        .to_string()
}

fn default_audio_prompt() -> String {
    "You are a file naming assistant for audio files. \
     Analyze the filename and audio properties to suggest a SHORT descriptive \
     filename (2-4 words max, no extension). \
     Infer the type of content from patterns:\n\
     - Voice recordings/memos: usually mono, short duration, small size\n\
     - Music: usually stereo, higher bitrate, longer duration\n\
     - Podcasts: usually mono or stereo, medium duration\n\
     - Sound effects: usually very short\n\
     Look for keywords in the filename like 'record', 'voice', 'memo', \
     'music', 'song', etc.\n\
     Be creative but accurate. Return only the filename, nothing else."
        .to_string()
}

fn default_text_prompt() -> String {
    "You are a file naming assistant. \
     Based on the content below, suggest a SHORT descriptive filename \
     (2-4 words max, no extension). Return only the filename, nothing else."
        .to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            models: ModelConfig::default(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            text: default_text_model(),
            vision: default_vision_model(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            image: default_image_prompt(),
            audio: default_audio_prompt(),
            text: default_text_prompt(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| TaxisError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }
}

/// Default location of the engine config file (`~/.taxis.json`).
pub fn default_config_path() -> Result<PathBuf> {
    home_file(".taxis.json")
}

/// Resolve a file name inside the user's home directory.
pub(crate) fn home_file(name: &str) -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(name))
        .ok_or_else(|| TaxisError::Config("Cannot determine home directory".to_string()))
}
