//! Ingestion pipeline: extract → chunk → embed. Produces a [`SessionContext`].

use crate::chunks::{chunk_text, ChunkOptions};
use crate::extract::{extract_text, ExtractError};
use crate::index::{IndexError, SimilarityIndex};
use crate::provider::{embed_checked, Embedder, ProviderError};
use crate::session::SessionContext;

/// Runs the full pipeline over an uploaded document.
/// Returns the context to cache; its embeddings are validated to share one dimension.
pub async fn ingest_document(
    bytes: &[u8],
    options: &ChunkOptions,
    embedder: &dyn Embedder,
) -> Result<SessionContext, IngestError> {
    let text = extract_text(bytes)?;
    let chunks = chunk_text(&text, options);

    if chunks.is_empty() {
        tracing::info!(chars = text.len(), "document has no significant chunks");
        return Ok(SessionContext {
            text,
            ..SessionContext::default()
        });
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embed_checked(embedder, &texts)
        .await
        .map_err(IngestError::Embedding)?;
    let index = SimilarityIndex::build(&embeddings)?;

    tracing::info!(
        chars = text.len(),
        chunks = chunks.len(),
        dim = index.dim(),
        "ingested document"
    );
    Ok(SessionContext {
        text,
        chunks,
        embeddings,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("unreadable document: {0}")]
    UnreadableDocument(#[from] ExtractError),
    #[error("embedding error: {0}")]
    Embedding(ProviderError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pdf_with_pages, FakeEmbedder};

    const DOC: &[u8] = b"Short.\n\n\
        Apples grow on trees in orchards across the valley.\n\n\
        Bananas ripen quickly once they are picked from the plant.";

    #[tokio::test]
    async fn text_document_becomes_context() {
        let embedder = FakeEmbedder::new();
        let ctx = ingest_document(DOC, &ChunkOptions::default(), &embedder)
            .await
            .unwrap();
        assert_eq!(ctx.chunks.len(), 2);
        assert_eq!(ctx.embeddings.len(), 2);
        assert!(ctx.chunks[0].text.starts_with("Apples"));
        assert_eq!(embedder.calls(), 1);
        assert_eq!(embedder.texts_embedded(), 2);
    }

    #[tokio::test]
    async fn pdf_pages_are_chunked() {
        let bytes = pdf_with_pages(&[
            "Tiny page",
            "The second page carries a sentence long enough to keep.",
        ]);
        let embedder = FakeEmbedder::new();
        let ctx = ingest_document(&bytes, &ChunkOptions::default(), &embedder)
            .await
            .unwrap();
        assert_eq!(ctx.chunks.len(), 1);
        assert!(ctx.chunks[0].text.contains("second page"));
    }

    #[tokio::test]
    async fn no_chunks_skips_embedding() {
        let embedder = FakeEmbedder::new();
        let ctx = ingest_document(b"too short", &ChunkOptions::default(), &embedder)
            .await
            .unwrap();
        assert!(ctx.is_empty());
        assert_eq!(ctx.text, "too short");
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn garbage_is_unreadable() {
        let embedder = FakeEmbedder::new();
        let err = ingest_document(&[0xff, 0x00, 0xfe], &ChunkOptions::default(), &embedder)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::UnreadableDocument(_)));
    }

    #[tokio::test]
    async fn mixed_dimensions_are_rejected() {
        let embedder = FakeEmbedder::new().mixed_dimensions();
        let err = ingest_document(DOC, &ChunkOptions::default(), &embedder)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Index(IndexError::DimensionMismatch { expected: 5, found: 6 })
        ));
    }

    #[tokio::test]
    async fn embedding_failure_is_surfaced() {
        let embedder = FakeEmbedder::new().failing();
        let err = ingest_document(DOC, &ChunkOptions::default(), &embedder)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Embedding(ProviderError::Unavailable(_))));
    }
}
