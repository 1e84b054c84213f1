//! Paged, history-aware search on top of [`SearchEngine`].
//!
//! The session owns the query state a front end renders: current results,
//! paging, the last error and the recent-query list.

use serde::Serialize;

use docsearch_core::config::Settings;
use docsearch_core::error::{Error, Result};
use docsearch_core::history::HistoryStore;
use docsearch_core::traits::KeyValueStore;
use docsearch_core::types::{SearchIndex, SearchResult};

use crate::engine::SearchEngine;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub is_searching: bool,
    pub error: Option<String>,
    pub has_more: bool,
    pub page: usize,
    pub total_results: usize,
    pub history: Vec<String>,
}

impl SearchState {
    fn cleared(history: &[String]) -> Self {
        Self { history: history.to_vec(), ..Self::default() }
    }
}

pub struct SearchSession<S> {
    engine: Option<SearchEngine>,
    history: HistoryStore<S>,
    state: SearchState,
    page_size: usize,
    settings: Settings,
}

impl<S: KeyValueStore> SearchSession<S> {
    pub fn new(store: S, page_size: usize) -> Self {
        let mut settings = Settings::default();
        settings.search.default_limit = page_size.max(1);
        Self::with_settings(store, settings)
    }

    /// Page size, weights and excerpt length come from `settings`.
    pub fn with_settings(store: S, settings: Settings) -> Self {
        let history = HistoryStore::open(store);
        let state = SearchState::cleared(history.get_history());
        Self { engine: None, history, state, page_size: settings.search.default_limit.max(1), settings }
    }

    /// Installs the engine for `index`. Only the first call has an effect.
    pub fn attach_index(&mut self, index: SearchIndex) -> bool {
        let engine = SearchEngine::new(index)
            .with_weights(self.settings.weights)
            .with_excerpt_len(self.settings.search.excerpt_len);
        self.attach_engine(engine)
    }

    pub fn attach_engine(&mut self, engine: SearchEngine) -> bool {
        if self.engine.is_some() {
            tracing::debug!("search index already attached; ignoring");
            return false;
        }
        tracing::info!(articles = engine.index().article_count(), "search index attached");
        self.engine = Some(engine);
        true
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn history(&self) -> &[String] {
        self.history.get_history()
    }

    /// Runs `query` and shows page `page` (1-based).
    ///
    /// Page 1 replaces the results and records the query in history; later
    /// pages append. Failures are also recorded in `state().error`.
    pub fn perform_search(&mut self, query: &str, page: usize) -> Result<&SearchState> {
        let page = page.max(1);
        let Some(engine) = self.engine.as_ref() else {
            self.state.is_searching = false;
            self.state.error = Some(Error::IndexUnavailable.to_string());
            return Err(Error::IndexUnavailable);
        };

        let query = query.trim();
        if query.is_empty() {
            self.state = SearchState::cleared(self.history.get_history());
            return Ok(&self.state);
        }

        self.state.is_searching = true;
        self.state.error = None;
        self.state.query = query.to_string();

        let Some(end) = self.page_size.checked_mul(page) else {
            let e = Error::Search(format!("page {} is out of range", page));
            self.state.is_searching = false;
            self.state.error = Some(e.to_string());
            return Err(e);
        };
        let start = end - self.page_size;

        // one extra result tells us whether another page exists
        let outcome = engine.search(query, end.saturating_add(1));
        self.state.is_searching = false;

        let mut results = match outcome {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(query, "search failed: {}", e);
                self.state.error = Some(e.to_string());
                return Err(e);
            }
        };

        self.state.has_more = results.len() > end;
        results.truncate(end);
        self.state.total_results = results.len();
        let page_results = if start < results.len() { results.split_off(start) } else { Vec::new() };

        if page == 1 {
            self.state.results = page_results;
            self.history.add_to_history(query);
            self.state.history = self.history.get_history().to_vec();
        } else {
            self.state.results.extend(page_results);
        }
        self.state.page = page;
        Ok(&self.state)
    }

    /// Fetches the next page of the current query, if there is one.
    pub fn load_more(&mut self) -> Result<&SearchState> {
        if !self.state.has_more || self.state.is_searching {
            return Ok(&self.state);
        }
        let query = self.state.query.clone();
        let next = self.state.page.saturating_add(1);
        self.perform_search(&query, next)
    }

    pub fn clear_search(&mut self) {
        self.state = SearchState::cleared(self.history.get_history());
    }

    pub fn clear_history(&mut self) {
        self.history.clear_history();
        self.state.history.clear();
    }
}
