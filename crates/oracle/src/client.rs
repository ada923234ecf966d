//! Text-generation backends.
//!
//! [`TextGenerator`] is the seam between the advisory flow and whichever
//! model serves it; [`GeminiClient`] is the production backend, speaking the
//! Gemini `generateContent` REST surface.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model returned an empty reply")]
    EmptyReply,
    #[error("oracle is not configured: {0}")]
    Config(String),
}

/// Abstract text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, OracleError>;
}

/// Backend configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl OracleConfig {
    pub const DEFAULT_MODEL: &'static str = "gemini-3-pro-preview";
    pub const DEFAULT_BASE_URL: &'static str =
        "https://generativelanguage.googleapis.com/v1beta";

    /// Reads `GEMINI_API_KEY` (required) and `MEDAUDIT_ORACLE_MODEL`
    /// (optional) from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Config`] when the API key is missing; the
    /// caller decides whether to run without an oracle.
    pub fn from_env() -> Result<Self, OracleError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| OracleError::Config("GEMINI_API_KEY is not set".into()))?;
        let model = std::env::var("MEDAUDIT_ORACLE_MODEL")
            .unwrap_or_else(|_| Self::DEFAULT_MODEL.to_owned());
        Ok(Self {
            api_key,
            model,
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
        })
    }
}

/// Gemini REST backend.
pub struct GeminiClient {
    http: reqwest::Client,
    config: OracleConfig,
}

impl GeminiClient {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[derive(Deserialize)]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, OracleError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        );
        let body = json!({
            "system_instruction": { "parts": [{ "text": system }] },
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "response_mime_type": "application/json" },
        });

        let reply: GenerateReply = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(OracleError::EmptyReply);
        }
        Ok(text)
    }
}
