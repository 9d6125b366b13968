//! All backend logic independent of how the app is run (CLI or a web front end).
//!
//! An uploaded document is extracted, chunked and embedded once, then cached per
//! session; each question retrieves the nearest chunks and asks a language model
//! to answer from them. Docent stores only its config in its own app data
//! directory (see [app_data]).

pub mod answer;
pub mod app_data;
pub mod chunks;
pub mod config;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod ollama;
pub mod provider;
pub mod router;
pub mod rules;
pub mod session;

#[cfg(test)]
mod testing;

pub use answer::{build_prompt, AnswerGenerator, GenerationError, APOLOGY};
pub use app_data::app_data_dir;
pub use chunks::{chunk_text, split_into_chunks, Chunk, ChunkOptions, DEFAULT_MIN_CHARS};
pub use config::{config_path, load_config, load_config_from, save_config, Config, ConfigError};
pub use extract::{extract_text, DocumentFormat, ExtractError};
pub use index::{IndexError, SimilarityIndex};
pub use ingest::{ingest_document, IngestError};
pub use ollama::{OllamaClient, OllamaError};
pub use provider::{Embedder, GenerationParams, Generator, ProviderError};
pub use router::{AnswerSource, ChatRequest, ChatResponse, Router, RouterError};
pub use session::{SessionCache, SessionContext};

/// Returns a short status string. Used to verify the backend is wired up.
pub fn status() -> &'static str {
    "docent-core ready"
}
