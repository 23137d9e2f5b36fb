//! The memory contract and the transient (in-process) backend.
//!
//! The transient backend keeps collections for the lifetime of the process,
//! so conversation history survives across runs of the same workflow but is
//! lost on restart. Collections are created lazily on first use and are
//! never deleted by the engine itself.

use crate::error::MemoryError;
use crate::message::{MemoryMessage, MemoryRole};
use crate::scope::MemoryScope;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// The contract shared by all memory backends.
///
/// Concurrent access to one scope is serialized by the backend, so eviction
/// never interleaves between callers.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// Appends a message, evicting from the front if the window overflows.
    async fn append(&self, role: MemoryRole, content: &str) -> Result<(), MemoryError>;

    /// Returns all retained messages in append order.
    async fn messages(&self) -> Result<Vec<MemoryMessage>, MemoryError>;

    /// Renders the retained messages as `role: content` lines.
    async fn as_text(&self) -> Result<String, MemoryError>;

    /// Removes all messages from the collection.
    async fn clear(&self) -> Result<(), MemoryError>;

    /// Returns the maximum number of retained messages.
    fn window_size(&self) -> usize;
}

type SharedMessages = Arc<tokio::sync::Mutex<VecDeque<MemoryMessage>>>;

/// Process-lifetime registry of transient memory collections.
///
/// One bank is created by the caller and injected into the engine; the bank
/// is not a process-wide singleton. Collections are keyed by scope and
/// shared between handles, so every run of a workflow sees the same history.
#[derive(Debug, Default)]
pub struct TransientMemoryBank {
    collections: Mutex<HashMap<String, SharedMessages>>,
}

impl TransientMemoryBank {
    /// Creates an empty bank.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the collection for `scope`, creating it lazily.
    ///
    /// # Errors
    ///
    /// Returns an error if `window_size` is zero.
    pub fn collection(
        &self,
        scope: &MemoryScope,
        window_size: usize,
    ) -> Result<TransientMemory, MemoryError> {
        let key = scope.key();
        if window_size == 0 {
            return Err(MemoryError::InvalidWindowSize { scope_key: key });
        }

        let messages = {
            let mut collections = self
                .collections
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            Arc::clone(collections.entry(key.clone()).or_insert_with(|| {
                debug!(scope = %key, window_size, "creating transient memory collection");
                Arc::new(tokio::sync::Mutex::new(VecDeque::new()))
            }))
        };

        Ok(TransientMemory {
            scope_key: key,
            window_size,
            messages,
        })
    }

    /// Returns the number of collections currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Returns true if no collections have been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A handle to one transient memory collection.
#[derive(Debug, Clone)]
pub struct TransientMemory {
    scope_key: String,
    window_size: usize,
    messages: SharedMessages,
}

impl TransientMemory {
    /// Returns the scope key of this collection.
    #[must_use]
    pub fn scope_key(&self) -> &str {
        &self.scope_key
    }
}

#[async_trait]
impl ConversationMemory for TransientMemory {
    async fn append(&self, role: MemoryRole, content: &str) -> Result<(), MemoryError> {
        let mut messages = self.messages.lock().await;
        messages.push_back(MemoryMessage::new(role, content));
        while messages.len() > self.window_size {
            messages.pop_front();
        }
        Ok(())
    }

    async fn messages(&self) -> Result<Vec<MemoryMessage>, MemoryError> {
        let messages = self.messages.lock().await;
        Ok(messages.iter().cloned().collect())
    }

    async fn as_text(&self) -> Result<String, MemoryError> {
        let messages = self.messages.lock().await;
        Ok(messages
            .iter()
            .map(MemoryMessage::as_line)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        let mut messages = self.messages.lock().await;
        messages.clear();
        Ok(())
    }

    fn window_size(&self) -> usize {
        self.window_size
    }
}
