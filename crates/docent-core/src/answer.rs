//! Builds the retrieval prompt and asks the generation model for an answer.

use std::sync::Arc;
use std::time::Duration;

use crate::provider::{GenerationParams, Generator, ProviderError};

/// Returned to the user when an answer could not be generated.
pub const APOLOGY: &str = "Sorry, I couldn't generate an answer from the document right now.";

const CONTEXT_SEPARATOR: &str = "\n\n";

/// Wraps a [`Generator`] with the fixed prompt and decoding settings.
#[derive(Clone)]
pub struct AnswerGenerator {
    generator: Arc<dyn Generator>,
    params: GenerationParams,
    timeout: Option<Duration>,
}

impl AnswerGenerator {
    pub fn new(generator: Arc<dyn Generator>, max_output_tokens: u32) -> Self {
        Self {
            generator,
            params: GenerationParams {
                max_output_tokens,
                deterministic: true,
            },
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Answers `question` from `context`. The caller decides what to show on error.
    pub async fn generate(&self, question: &str, context: &[&str]) -> Result<String, GenerationError> {
        let prompt = build_prompt(question, context);
        let call = self.generator.generate(&prompt, &self.params);
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| GenerationError::Timeout(limit))??,
            None => call.await?,
        };
        let answer = output.trim();
        if answer.is_empty() {
            return Err(GenerationError::Provider(ProviderError::EmptyResponse));
        }
        Ok(answer.to_string())
    }
}

impl std::fmt::Debug for AnswerGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerGenerator")
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Instruction prompt with the retrieved chunks as context.
pub fn build_prompt(question: &str, context: &[&str]) -> String {
    let context = context.join(CONTEXT_SEPARATOR);
    format!(
        "Answer the question using only the context below. \
         If the context does not contain the answer, say that you don't know.\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n\
         Answer:"
    )
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}
