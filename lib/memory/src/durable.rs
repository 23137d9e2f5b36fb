//! The durable memory backend.
//!
//! Storage itself lives behind the [`MemoryPersistence`] trait, implemented
//! by out-of-scope code (a database layer in production, an in-memory fake
//! in tests). The backend loads the existing messages for its scope when a
//! collection is opened and mirrors every append to the persistence layer,
//! trimming the oldest rows whenever the window overflows.

use crate::error::MemoryError;
use crate::message::{MemoryMessage, MemoryRole};
use crate::scope::MemoryScope;
use crate::store::ConversationMemory;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Trait for durable message storage.
///
/// Implementations must return messages ordered by timestamp from
/// `load_messages` and delete the oldest rows first from `trim_oldest`.
#[async_trait]
pub trait MemoryPersistence: Send + Sync {
    /// Loads all messages for a scope, oldest first.
    async fn load_messages(&self, scope_key: &str) -> Result<Vec<MemoryMessage>, MemoryError>;

    /// Appends one message to a scope.
    async fn append_message(
        &self,
        scope_key: &str,
        message: &MemoryMessage,
    ) -> Result<(), MemoryError>;

    /// Removes the `count` oldest messages from a scope.
    async fn trim_oldest(&self, scope_key: &str, count: usize) -> Result<(), MemoryError>;

    /// Removes every message for a scope.
    async fn delete_all(&self, scope_key: &str) -> Result<(), MemoryError>;
}

/// Registry of per-scope locks over a shared persistence layer.
///
/// The bank guarantees that concurrent collections opened for the same scope
/// serialize their appends, so window eviction cannot interleave.
pub struct DurableMemoryBank {
    persistence: Arc<dyn MemoryPersistence>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl DurableMemoryBank {
    /// Creates a bank over the given persistence layer.
    #[must_use]
    pub fn new(persistence: Arc<dyn MemoryPersistence>) -> Self {
        Self {
            persistence,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Opens the collection for `scope`, loading its stored messages.
    ///
    /// # Errors
    ///
    /// Returns an error if `window_size` is zero or loading fails.
    pub async fn open(
        &self,
        scope: &MemoryScope,
        window_size: usize,
    ) -> Result<DurableMemory, MemoryError> {
        let key = scope.key();
        if window_size == 0 {
            return Err(MemoryError::InvalidWindowSize { scope_key: key });
        }

        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            Arc::clone(
                locks
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };

        let guard = lock.lock().await;
        let loaded = self.persistence.load_messages(&key).await?;
        debug!(scope = %key, count = loaded.len(), "loaded durable memory collection");
        drop(guard);

        Ok(DurableMemory {
            scope_key: key,
            window_size,
            persistence: Arc::clone(&self.persistence),
            lock,
            cached: Arc::new(tokio::sync::Mutex::new(loaded.into_iter().collect())),
        })
    }
}

impl std::fmt::Debug for DurableMemoryBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableMemoryBank").finish_non_exhaustive()
    }
}

/// A handle to one durable memory collection.
pub struct DurableMemory {
    scope_key: String,
    window_size: usize,
    persistence: Arc<dyn MemoryPersistence>,
    lock: Arc<tokio::sync::Mutex<()>>,
    cached: Arc<tokio::sync::Mutex<VecDeque<MemoryMessage>>>,
}

impl DurableMemory {
    /// Returns the scope key of this collection.
    #[must_use]
    pub fn scope_key(&self) -> &str {
        &self.scope_key
    }
}

#[async_trait]
impl ConversationMemory for DurableMemory {
    async fn append(&self, role: MemoryRole, content: &str) -> Result<(), MemoryError> {
        let _guard = self.lock.lock().await;
        let message = MemoryMessage::new(role, content);

        self.persistence
            .append_message(&self.scope_key, &message)
            .await?;

        let mut cached = self.cached.lock().await;
        cached.push_back(message);
        if cached.len() > self.window_size {
            let excess = cached.len() - self.window_size;
            for _ in 0..excess {
                cached.pop_front();
            }
            self.persistence
                .trim_oldest(&self.scope_key, excess)
                .await?;
        }
        Ok(())
    }

    async fn messages(&self) -> Result<Vec<MemoryMessage>, MemoryError> {
        let cached = self.cached.lock().await;
        Ok(cached.iter().cloned().collect())
    }

    async fn as_text(&self) -> Result<String, MemoryError> {
        let cached = self.cached.lock().await;
        Ok(cached
            .iter()
            .map(MemoryMessage::as_line)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        let _guard = self.lock.lock().await;
        self.persistence.delete_all(&self.scope_key).await?;
        let mut cached = self.cached.lock().await;
        cached.clear();
        Ok(())
    }

    fn window_size(&self) -> usize {
        self.window_size
    }
}

impl std::fmt::Debug for DurableMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableMemory")
            .field("scope_key", &self.scope_key)
            .field("window_size", &self.window_size)
            .finish_non_exhaustive()
    }
}
