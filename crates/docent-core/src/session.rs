//! Per-session document cache. Holds the latest ingested document so follow-up
//! questions skip extraction and embedding.
//!
//! Each session has a single slot: a new upload replaces the previous context.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::chunks::Chunk;

/// Text, chunks and chunk embeddings of one ingested document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    pub text: String,
    pub chunks: Vec<Chunk>,
    /// One vector per chunk, same order as `chunks`.
    pub embeddings: Vec<Vec<f32>>,
}

impl SessionContext {
    /// True when the document produced no retrievable chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Session id → cached context. Cheap to share behind an `Arc`.
#[derive(Debug, Default)]
pub struct SessionCache {
    slots: RwLock<HashMap<String, Arc<SessionContext>>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `context` for `session_id`, replacing whatever was there.
    pub async fn put(&self, session_id: &str, context: SessionContext) -> Arc<SessionContext> {
        let context = Arc::new(context);
        self.slots
            .write()
            .await
            .insert(session_id.to_string(), Arc::clone(&context));
        context
    }

    /// The cached context for `session_id`, or `None` if nothing was uploaded.
    pub async fn get(&self, session_id: &str) -> Option<Arc<SessionContext>> {
        self.slots.read().await.get(session_id).cloned()
    }

    /// Drop a session's context, e.g. when the session expires.
    /// The session's lock is left in place; an in-flight request keeps it.
    pub async fn remove(&self, session_id: &str) -> Option<Arc<SessionContext>> {
        self.slots.write().await.remove(session_id)
    }

    /// Number of sessions with a cached document.
    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    /// Serializes requests of one session. Hold the guard for the whole request;
    /// other sessions are unaffected.
    pub async fn lock(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Only the map holds an idle lock; holders and waiters own a clone.
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(locks.entry(session_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of per-session locks currently tracked.
    pub(crate) async fn lock_count(&self) -> usize {
        self.locks.lock().await.len()
    }
}
