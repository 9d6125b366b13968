//! Model capabilities the pipeline depends on: embeddings and text generation.
//!
//! Both are constructed once at startup and injected into the [`Router`](crate::Router)
//! as trait objects, so tests can swap in doubles.

use async_trait::async_trait;

use crate::ollama::OllamaError;

/// Maps texts to fixed-dimension vectors.
///
/// Returns one vector per input, in input order. Every vector produced by one
/// configured model has the same dimension. Implementations must not mutate
/// shared state, so the same input yields the same output.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// Generation parameters passed with every prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    /// Upper bound on produced tokens.
    pub max_output_tokens: u32,
    /// Greedy decoding (no sampling).
    pub deterministic: bool,
}

/// Produces text from a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, ProviderError>;
}

/// Embeds `texts` and checks that exactly one vector came back per input.
pub async fn embed_checked(
    embedder: &dyn Embedder,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, ProviderError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let vectors = embedder.embed(texts).await?;
    if vectors.len() != texts.len() {
        return Err(ProviderError::CountMismatch {
            expected: texts.len(),
            got: vectors.len(),
        });
    }
    Ok(vectors)
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Ollama(#[from] OllamaError),
    #[error("expected {expected} embeddings, got {got}")]
    CountMismatch { expected: usize, got: usize },
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("model unavailable: {0}")]
    Unavailable(String),
}
