//! Bounded recent-query list.
//!
//! State changes go through [`reduce`]; [`HistoryStore`] applies them and
//! writes the result through a [`KeyValueStore`]. Persistence is fail-soft:
//! errors are logged and the in-memory history stays authoritative.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::traits::KeyValueStore;

/// Storage key the history is persisted under.
pub const HISTORY_KEY: &str = "search_history";

/// Maximum number of remembered queries.
pub const MAX_HISTORY: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistory {
    /// Most recent first, no duplicates.
    pub queries: Vec<String>,
    /// Milliseconds since the Unix epoch of the last change.
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    Add(String),
    Clear,
    Load(Vec<String>),
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Applies `action` and stamps the result with `timestamp` (epoch millis).
pub fn reduce(state: SearchHistory, action: HistoryAction, timestamp: u64) -> SearchHistory {
    let queries = match action {
        HistoryAction::Add(query) => {
            let mut queries: Vec<String> = state.queries.into_iter().filter(|q| *q != query).collect();
            queries.insert(0, query);
            queries.truncate(MAX_HISTORY);
            queries
        }
        HistoryAction::Clear => Vec::new(),
        HistoryAction::Load(loaded) => {
            let mut queries: Vec<String> = Vec::with_capacity(loaded.len());
            for query in loaded {
                if !queries.contains(&query) {
                    queries.push(query);
                }
            }
            queries.truncate(MAX_HISTORY);
            queries
        }
    };
    SearchHistory { queries, timestamp }
}

pub struct HistoryStore<S> {
    store: S,
    state: SearchHistory,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Opens the history, loading whatever the store currently holds.
    pub fn open(store: S) -> Self {
        let mut history = Self { store, state: SearchHistory::default() };
        history.reload();
        history
    }

    /// Re-reads persisted history. Falls back to empty on any failure.
    pub fn reload(&mut self) -> &SearchHistory {
        let loaded = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(queries) => queries,
                Err(e) => {
                    tracing::warn!("Failed to parse search history: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to load search history: {}", e);
                Vec::new()
            }
        };
        self.state = reduce(std::mem::take(&mut self.state), HistoryAction::Load(loaded), now_millis());
        &self.state
    }

    pub fn get_history(&self) -> &[String] {
        &self.state.queries
    }

    pub fn history(&self) -> &SearchHistory {
        &self.state
    }

    pub fn add_to_history(&mut self, query: &str) {
        self.state = reduce(std::mem::take(&mut self.state), HistoryAction::Add(query.to_string()), now_millis());
        self.persist();
    }

    pub fn clear_history(&mut self) {
        self.state = reduce(std::mem::take(&mut self.state), HistoryAction::Clear, now_millis());
        if let Err(e) = self.store.remove(HISTORY_KEY) {
            tracing::warn!("Failed to clear search history: {}", e);
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&self) {
        let encoded = match serde_json::to_string(&self.state.queries) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!("Failed to encode search history: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(HISTORY_KEY, &encoded) {
            tracing::warn!("Failed to save search history: {}", e);
        }
    }
}
