// SPDX-License-Identifier: MIT

//! Remote model adapter: classification and rename suggestions
//!
//! One bounded HTTP call per attempt against an OpenAI-style
//! chat-completions endpoint. Every failure mode is folded into
//! [`ModelFailure`], a reason code the orchestrator logs and then treats
//! as "no result" — adapter trouble never aborts a sort run.

use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::classify::FileTask;
use crate::config::AppConfig;
use crate::media::{image_mime, AudioProps};
use crate::rules::RuleSet;

/// Bytes of image content attached to a vision request.
const IMAGE_PAYLOAD_LIMIT: usize = 500_000;
/// Bytes of text content read for a text-based suggestion.
const TEXT_PAYLOAD_LIMIT: usize = 2_000;
/// Characters of the text payload actually placed in the prompt.
const TEXT_PROMPT_CHARS: usize = 1_000;

/// Accepted length range for a suggested filename, in characters.
const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;

/// Why a model call produced no usable output.
#[derive(Debug, Error)]
pub enum ModelFailure {
    #[error("no API credentials configured ({env} unset)", env = crate::config::API_KEY_ENV)]
    MissingCredentials,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("endpoint returned status {0}")]
    Status(u16),

    #[error("empty reply")]
    EmptyReply,

    #[error("suggested name length {0} outside accepted range")]
    BadLength(usize),

    #[error("could not read payload: {0}")]
    Unreadable(String),
}

pub type ModelResult<T> = std::result::Result<T, ModelFailure>;

/// Client for the remote classification/vision endpoint.
pub struct ModelClient {
    http: Client,
    url: String,
    api_key: Option<String>,
    text_model: String,
    vision_model: String,
    image_prompt: String,
    audio_prompt: String,
    text_prompt: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: Content,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Content {
    Text(String),
    Parts(Vec<Part>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Part {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl ModelClient {
    /// Build a client from the engine config. `api_key` is `None` when no
    /// credentials are available, in which case every call short-circuits
    /// with [`ModelFailure::MissingCredentials`] before touching the
    /// network.
    pub fn new(config: &AppConfig, api_key: Option<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.engine.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            url: config.engine.url.clone(),
            api_key,
            text_model: config.engine.models.text.clone(),
            vision_model: config.engine.models.vision.clone(),
            image_prompt: config.prompts.image.clone(),
            audio_prompt: config.prompts.audio.clone(),
            text_prompt: config.prompts.text.clone(),
        }
    }

    /// Client from the environment: key from `TAXIS_API_KEY` if set.
    pub fn from_env(config: &AppConfig) -> Self {
        Self::new(config, std::env::var(crate::config::API_KEY_ENV).ok())
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    /// Single chat completion; the raw assistant text on success.
    async fn complete(&self, model: &str, messages: Vec<Message>) -> ModelResult<String> {
        let key = self.api_key.as_ref().ok_or(ModelFailure::MissingCredentials)?;

        let request = ChatRequest { model, messages };
        debug!("Model request: model={}", model);

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ModelFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ModelFailure::Status(status.as_u16()));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelFailure::Transport(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ModelFailure::EmptyReply)
    }

    /// Ask the text model for one category label from the rule-set
    /// vocabulary. The reply is normalized but *not* validated against
    /// the vocabulary here; the caller owns that membership check.
    pub async fn classify(
        &self,
        task: &FileTask,
        excerpt: Option<&str>,
        rules: &RuleSet,
    ) -> ModelResult<String> {
        let mut prompt = String::from(
            "You are a file classification assistant. \
             Given the filename and a short text excerpt, return ONE best \
             category from this list:\n",
        );
        for name in rules.names() {
            prompt.push_str("- ");
            prompt.push_str(name);
            prompt.push('\n');
        }
        prompt.push_str("Return only the single category name and nothing else.\n\n");
        prompt.push_str(&format!("Filename: {}\n", file_name(&task.path)));
        if let Some(text) = excerpt {
            prompt.push_str(&format!("Text excerpt:\n{}\n", text));
        }

        let reply = self
            .complete(&self.text_model, vec![text_message(prompt)])
            .await?;
        normalize_label(&reply)
    }

    /// Ask the vision model for a short filename describing an image. A
    /// bounded prefix of the file is attached as a data URL.
    pub async fn suggest_image_name(&self, task: &FileTask) -> ModelResult<String> {
        let bytes = read_prefix(&task.path, IMAGE_PAYLOAD_LIMIT)
            .map_err(|e| ModelFailure::Unreadable(e.to_string()))?;
        let encoded = general_purpose::STANDARD.encode(&bytes);
        let data_url = format!(
            "data:{};base64,{}",
            image_mime(&task.extension),
            encoded
        );

        let message = Message {
            role: "user",
            content: Content::Parts(vec![
                Part::Text {
                    text: self.image_prompt.clone(),
                },
                Part::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ]),
        };

        let reply = self.complete(&self.vision_model, vec![message]).await?;
        normalize_suggestion(&reply)
    }

    /// Ask the text model for a filename from acoustic properties plus
    /// the original name.
    pub async fn suggest_audio_name(
        &self,
        task: &FileTask,
        props: &AudioProps,
    ) -> ModelResult<String> {
        let size_mb = task.size as f64 / (1024.0 * 1024.0);
        let prompt = format!(
            "{}\n\nOriginal filename: {}\nDuration: {}\nSample rate: {}\nChannels: {}\nFile size: {:.1}MB\n",
            self.audio_prompt,
            file_name(&task.path),
            props.duration_display(),
            props
                .sample_rate
                .map(|r| format!("{}Hz", r))
                .unwrap_or_else(|| "unknown".to_string()),
            props.channels_display(),
            size_mb,
        );

        let reply = self
            .complete(&self.text_model, vec![text_message(prompt)])
            .await?;
        normalize_suggestion(&reply)
    }

    /// Ask the text model for a filename from a content preview, for
    /// text-bearing categories (Docs, Code).
    pub async fn suggest_text_name(&self, task: &FileTask) -> ModelResult<String> {
        let bytes = read_prefix(&task.path, TEXT_PAYLOAD_LIMIT)
            .map_err(|e| ModelFailure::Unreadable(e.to_string()))?;
        let content = String::from_utf8_lossy(&bytes);
        let preview: String = content.chars().take(TEXT_PROMPT_CHARS).collect();

        let prompt = format!("{}\n\nContent preview:\n{}\n", self.text_prompt, preview);

        let reply = self
            .complete(&self.text_model, vec![text_message(prompt)])
            .await?;
        normalize_suggestion(&reply)
    }
}

fn text_message(prompt: String) -> Message {
    Message {
        role: "user",
        content: Content::Text(prompt),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Read up to `limit` bytes from the start of a file.
fn read_prefix(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
    let file = std::fs::File::open(path)?;
    let mut buffer = Vec::with_capacity(limit.min(64 * 1024));
    file.take(limit as u64).read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Normalize a classification reply: first line, trimmed, with any
/// period-delimited suffix dropped.
fn normalize_label(reply: &str) -> ModelResult<String> {
    let line = reply.lines().next().unwrap_or_default().trim();
    let label = line.split('.').next().unwrap_or_default().trim();
    if label.is_empty() {
        return Err(ModelFailure::EmptyReply);
    }
    Ok(label.to_string())
}

/// Normalize a filename suggestion: first line, quotes stripped, a
/// leading `filename:` label removed, anything after a literal dot
/// dropped, and the length bounds enforced.
fn normalize_suggestion(reply: &str) -> ModelResult<String> {
    let mut name = reply
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
        .trim();

    if let Some(prefix) = name.get(..9) {
        if prefix.eq_ignore_ascii_case("filename:") {
            name = name[9..].trim();
        }
    }
    if let Some((before_dot, _)) = name.split_once('.') {
        name = before_dot.trim();
    }

    let length = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&length) {
        return Err(ModelFailure::BadLength(length));
    }
    Ok(name.to_string())
}
