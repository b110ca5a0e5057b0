use crate::models::{ClickEvent, ShortUrl};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Storage seam used by the handlers. A persistent backend can be dropped in
/// behind this trait without touching handler logic.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// `true` if the code was ever inserted, expired or not.
    async fn exists(&self, code: &str) -> bool;

    /// Store (or overwrite) a record and start it with an empty click list.
    async fn insert(&self, record: ShortUrl);

    async fn get(&self, code: &str) -> Option<ShortUrl>;

    /// Append a click to the code's history. Returns `false` if the code is unknown.
    async fn append_click(&self, code: &str, click: ClickEvent) -> bool;

    /// The record together with its clicks, read as one consistent view.
    async fn snapshot(&self, code: &str) -> Option<(ShortUrl, Vec<ClickEvent>)>;

    async fn count(&self) -> usize;
}

// ── In-memory store ────────────────────────────────────────────────────────

struct Entry {
    record: ShortUrl,
    clicks: Vec<ClickEvent>,
}

/// Process-lifetime store. A record and its click history live in the same
/// map entry behind a single reader/writer lock, so they are always created
/// and read together.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn exists(&self, code: &str) -> bool {
        self.entries.read().await.contains_key(code)
    }

    async fn insert(&self, record: ShortUrl) {
        let mut entries = self.entries.write().await;
        entries.insert(
            record.short_code.clone(),
            Entry {
                record,
                clicks: Vec::new(),
            },
        );
    }

    async fn get(&self, code: &str) -> Option<ShortUrl> {
        let entries = self.entries.read().await;
        entries.get(code).map(|entry| entry.record.clone())
    }

    async fn append_click(&self, code: &str, click: ClickEvent) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(code) {
            Some(entry) => {
                entry.clicks.push(click);
                true
            }
            None => false,
        }
    }

    async fn snapshot(&self, code: &str) -> Option<(ShortUrl, Vec<ClickEvent>)> {
        let entries = self.entries.read().await;
        entries
            .get(code)
            .map(|entry| (entry.record.clone(), entry.clicks.clone()))
    }

    async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}
