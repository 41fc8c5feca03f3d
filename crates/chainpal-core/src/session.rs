//! Ephemeral per-chat wallet sessions.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{domain::ChatId, Result};

/// A generated wallet. The private key is plain text and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct WalletRecord {
    pub address: String,
    pub private_key: String,
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Keyed store of wallet records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, chat_id: ChatId) -> Result<Option<WalletRecord>>;

    /// Insert or silently overwrite; returns the previous record.
    async fn put(&self, chat_id: ChatId, record: WalletRecord) -> Result<Option<WalletRecord>>;

    /// Returns the removed record, if any.
    async fn delete(&self, chat_id: ChatId) -> Result<Option<WalletRecord>>;
}

/// Process-memory store; everything is lost on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<ChatId, WalletRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, chat_id: ChatId) -> Result<Option<WalletRecord>> {
        Ok(self.inner.read().await.get(&chat_id).cloned())
    }

    async fn put(&self, chat_id: ChatId, record: WalletRecord) -> Result<Option<WalletRecord>> {
        Ok(self.inner.write().await.insert(chat_id, record))
    }

    async fn delete(&self, chat_id: ChatId) -> Result<Option<WalletRecord>> {
        Ok(self.inner.write().await.remove(&chat_id))
    }
}

/// Per-chat async mutexes serializing wallet mutations for one chat.
///
/// An entry lives only while some guard holds or waits on it.
#[derive(Default)]
pub struct ChatLocks {
    inner: StdMutex<HashMap<ChatId, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: ChatId) -> ChatGuard<'_> {
        let lock = self
            .map()
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        ChatGuard {
            locks: self,
            chat_id,
            guard: Some(guard),
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<ChatId, Arc<Mutex<()>>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held chat lock; dropping it releases the chat and forgets idle entries.
pub struct ChatGuard<'a> {
    locks: &'a ChatLocks,
    chat_id: ChatId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ChatGuard<'_> {
    fn drop(&mut self) {
        // Waiters clone the Arc under the map lock, so with it held a count of
        // one means nobody else wants this chat.
        let mut map = self.locks.map();
        drop(self.guard.take());
        if map
            .get(&self.chat_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            map.remove(&self.chat_id);
        }
    }
}
