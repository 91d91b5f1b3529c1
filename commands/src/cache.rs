use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::RwLock;

use crate::completion::Suggestion;

/// Last-known suggestions for one command path
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub suggestions: Vec<Suggestion>,

    /// Number of writes this entry has seen, starting at 1
    pub generation: u64,

    /// Ticket of the fetch that produced the current value
    pub ticket: u64,

    pub updated_at: Instant,
}

/// Per-path suggestion cache shared between keystrokes and background fetches.
///
/// Entries live for the whole process and are only ever overwritten. Writes
/// are last-writer-wins by completion order; every fetch draws a ticket when
/// it starts so a write from an older fetch over a newer one can be spotted.
#[derive(Clone, Default)]
pub struct SuggestionCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    tickets: Arc<AtomicU64>,
}

impl SuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a ticket for a fetch that is about to start
    pub fn ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub async fn get(&self, path: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(path).cloned()
    }

    pub async fn suggestions(&self, path: &str) -> Option<Vec<Suggestion>> {
        self.entries.read().await.get(path).map(|e| e.suggestions.clone())
    }

    /// Write count of a path, 0 when nothing was stored yet
    pub async fn generation(&self, path: &str) -> u64 {
        self.entries.read().await.get(path).map_or(0, |e| e.generation)
    }

    /// Overwrite the entry for `path` and return its new generation
    pub async fn store(&self, path: &str, suggestions: Vec<Suggestion>, ticket: u64) -> u64 {
        let mut entries = self.entries.write().await;
        let previous = entries.get(path);

        if let Some(prev) = previous.filter(|prev| prev.ticket > ticket) {
            tracing::debug!(
                path,
                stale_ticket = ticket,
                newer_ticket = prev.ticket,
                newer_age = ?prev.updated_at.elapsed(),
                "older fetch overwrote a newer result"
            );
        }

        let generation = previous.map_or(0, |e| e.generation) + 1;
        entries.insert(
            path.to_string(),
            CacheEntry {
                suggestions,
                generation,
                ticket,
                updated_at: Instant::now(),
            },
        );
        generation
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
