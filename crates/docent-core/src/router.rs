//! Request handling: decides where each answer comes from.
//!
//! A request carrying a document replaces the session's context. Questions are
//! then answered from the session's context when there is one, and from the
//! canned rules otherwise.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::answer::{AnswerGenerator, APOLOGY};
use crate::chunks::ChunkOptions;
use crate::config::{Config, DEFAULT_TOP_K};
use crate::index::{IndexError, SimilarityIndex};
use crate::ingest::{ingest_document, IngestError};
use crate::provider::{embed_checked, Embedder, Generator};
use crate::rules;
use crate::session::{SessionCache, SessionContext};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    /// Raw bytes of an uploaded document, if the request carries one.
    #[serde(default)]
    pub document: Option<Vec<u8>>,
    pub session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    /// Generated from retrieved document chunks.
    Document,
    /// No document context; canned reply.
    Rules,
    /// A model call failed after ingestion; apology.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub source: AnswerSource,
}

impl ChatResponse {
    fn new(answer: impl Into<String>, source: AnswerSource) -> Self {
        Self {
            answer: answer.into(),
            source,
        }
    }
}

/// Orchestrates ingestion, caching, retrieval and answering.
pub struct Router {
    embedder: Arc<dyn Embedder>,
    answerer: AnswerGenerator,
    cache: Arc<SessionCache>,
    chunking: ChunkOptions,
    top_k: usize,
}

impl Router {
    pub fn new(embedder: Arc<dyn Embedder>, answerer: AnswerGenerator) -> Self {
        Self {
            embedder,
            answerer,
            cache: Arc::new(SessionCache::new()),
            chunking: ChunkOptions::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Router with chunking, retrieval and generation settings from `config`.
    pub fn from_config(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let answerer = AnswerGenerator::new(generator, config.max_output_tokens)
            .with_timeout(config.generation_timeout());
        Self::new(embedder, answerer)
            .with_chunk_options(config.chunk_options())
            .with_top_k(config.top_k)
    }

    pub fn with_chunk_options(mut self, chunking: ChunkOptions) -> Self {
        self.chunking = chunking;
        self
    }

    /// Number of chunks retrieved per question; at least one.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Share a cache owned elsewhere (e.g. by a session store that expires entries).
    pub fn with_cache(mut self, cache: Arc<SessionCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// Handles one request. Only ingestion failures and internal invariant
    /// violations are returned as errors; model failures after ingestion
    /// become [`AnswerSource::Fallback`] replies.
    #[tracing::instrument(skip_all, fields(session = %request.session_id, upload = request.document.is_some()))]
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, RouterError> {
        let ChatRequest {
            question,
            document,
            session_id,
        } = request;
        let _guard = self.cache.lock(&session_id).await;

        let context = match document {
            Some(bytes) => {
                let context = ingest_document(&bytes, &self.chunking, self.embedder.as_ref()).await?;
                Some(self.cache.put(&session_id, context).await)
            }
            None => self.cache.get(&session_id).await,
        };

        match context.filter(|c| !c.is_empty()) {
            Some(context) => self.answer_from_document(&question, &context).await,
            None => {
                tracing::debug!("no document context, using rules");
                Ok(ChatResponse::new(rules::reply(&question), AnswerSource::Rules))
            }
        }
    }

    async fn answer_from_document(
        &self,
        question: &str,
        context: &SessionContext,
    ) -> Result<ChatResponse, RouterError> {
        let query = match embed_checked(self.embedder.as_ref(), &[question.to_string()]).await {
            Ok(mut vectors) => vectors.remove(0),
            Err(e) => {
                tracing::warn!(error = %e, "question embedding failed");
                return Ok(ChatResponse::new(APOLOGY, AnswerSource::Fallback));
            }
        };

        if context.embeddings.len() != context.chunks.len() {
            return Err(RouterError::ContextMismatch {
                chunks: context.chunks.len(),
                embeddings: context.embeddings.len(),
            });
        }
        let index = SimilarityIndex::build(&context.embeddings)?;
        let k = self.top_k.min(context.chunks.len());
        let hits = index.search_with_distances(&query, k)?;
        tracing::debug!(?hits, "retrieved chunks");

        let retrieved: Vec<&str> = hits
            .iter()
            .map(|&(i, _)| context.chunks[i].text.as_str())
            .collect();
        match self.answerer.generate(question, &retrieved).await {
            Ok(answer) => Ok(ChatResponse::new(answer, AnswerSource::Document)),
            Err(e) => {
                tracing::warn!(error = %e, "answer generation failed");
                Ok(ChatResponse::new(APOLOGY, AnswerSource::Fallback))
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("cached context is inconsistent: {0}")]
    Index(#[from] IndexError),
    #[error("cached context has {chunks} chunks but {embeddings} embeddings")]
    ContextMismatch { chunks: usize, embeddings: usize },
}

impl RouterError {
    /// True when the error is caused by the upload itself and should be shown to the user.
    pub fn is_user_error(&self) -> bool {
        matches!(self, RouterError::Ingest(IngestError::UnreadableDocument(_)))
    }
}
