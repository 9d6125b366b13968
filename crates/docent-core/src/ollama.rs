//! Ollama client for embeddings and completion. Wraps ollama-rs behind the
//! [`Embedder`] and [`Generator`] traits.

use async_trait::async_trait;
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use ollama_rs::models::ModelOptions;
use ollama_rs::Ollama;
use thiserror::Error;

use crate::config::Config;
use crate::provider::{Embedder, GenerationParams, Generator, ProviderError};

pub const DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_GENERATE_MODEL: &str = "gemma";
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Fixed seed so deterministic decoding is reproducible across calls.
const DETERMINISTIC_SEED: i32 = 42;

/// Thin wrapper around Ollama for embedding and completion.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    inner: Ollama,
    embed_model: String,
    generate_model: String,
}

impl OllamaClient {
    /// Create from URL string. Default: http://localhost:11434.
    pub fn from_url(url: &str) -> Result<Self, OllamaError> {
        let inner = Ollama::try_new(url).map_err(OllamaError::ParseUrl)?;
        Ok(Self {
            inner,
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            generate_model: DEFAULT_GENERATE_MODEL.to_string(),
        })
    }

    /// Create from the endpoint and model names in `config`.
    pub fn from_config(config: &Config) -> Result<Self, OllamaError> {
        Ok(Self::from_url(&config.ollama_url)?
            .with_embed_model(&config.embed_model)
            .with_generate_model(&config.generate_model))
    }

    /// Set the embedding model (e.g. `nomic-embed-text`, `all-minilm`).
    pub fn with_embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = model.into();
        self
    }

    /// Set the completion model (e.g. `gemma`, `llama3`).
    pub fn with_generate_model(mut self, model: impl Into<String>) -> Self {
        self.generate_model = model.into();
        self
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    pub fn generate_model(&self) -> &str {
        &self.generate_model
    }

    /// Embed multiple strings in one call. Returns one embedding per input.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, OllamaError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let req = GenerateEmbeddingsRequest::new(
            self.embed_model.clone(),
            EmbeddingsInput::Multiple(texts.to_vec()),
        );
        let res = self
            .inner
            .generate_embeddings(req)
            .await
            .map_err(OllamaError::Request)?;
        Ok(res.embeddings)
    }

    /// Run a single non-streaming completion.
    pub async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, OllamaError> {
        let req = GenerationRequest::new(self.generate_model.clone(), prompt.to_string())
            .options(model_options(params));
        let res = self.inner.generate(req).await.map_err(OllamaError::Request)?;
        Ok(res.response)
    }
}

fn model_options(params: &GenerationParams) -> ModelOptions {
    let options = ModelOptions::default().num_predict(num_predict(params.max_output_tokens));
    if params.deterministic {
        options.temperature(0.0).top_k(1).seed(DETERMINISTIC_SEED)
    } else {
        options
    }
}

/// Ollama takes a signed token limit; larger values saturate.
fn num_predict(max_output_tokens: u32) -> i32 {
    i32::try_from(max_output_tokens).unwrap_or(i32::MAX)
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(self.embed_batch(texts).await?)
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, ProviderError> {
        Ok(self.complete(prompt, params).await?)
    }
}

#[derive(Debug, Error)]
pub enum OllamaError {
    #[error("invalid Ollama URL: {0}")]
    ParseUrl(#[from] url::ParseError),
    #[error("Ollama request failed: {0}")]
    Request(#[from] ollama_rs::error::OllamaError),
}
