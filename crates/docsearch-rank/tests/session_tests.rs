use docsearch_core::config::Settings;
use docsearch_core::error::Error;
use docsearch_core::history::HISTORY_KEY;
use docsearch_core::store::MemoryStore;
use docsearch_core::traits::KeyValueStore;
use docsearch_core::types::SourceDocument;
use docsearch_rank::{IndexBuilder, SearchSession};

fn corpus(n: usize) -> Vec<SourceDocument> {
    let mut docs: Vec<SourceDocument> = (0..n)
        .map(|i| SourceDocument {
            id: format!("kernel/{:02}.md", i),
            path: format!("docs/kernel/{:02}.md", i),
            title: format!("Kernel note {}", i),
            content: "kernel ".repeat(i + 1),
            ..SourceDocument::default()
        })
        .collect();
    docs.push(SourceDocument {
        id: "misc.md".into(),
        path: "docs/misc.md".into(),
        title: "Miscellaneous".into(),
        content: "nothing relevant here".into(),
        ..SourceDocument::default()
    });
    docs
}

#[test]
fn search_before_index_reports_unavailable() {
    let mut session = SearchSession::new(MemoryStore::new(), 5);
    let err = session.perform_search("kernel", 1).unwrap_err();
    assert!(matches!(err, Error::IndexUnavailable));
    assert_eq!(session.state().error.as_deref(), Some("Search index not available"));
    assert!(!session.is_ready());
}

#[test]
fn index_is_attached_only_once() {
    let mut session = SearchSession::new(MemoryStore::new(), 5);
    assert!(session.attach_index(IndexBuilder::from_documents(&corpus(3))));
    assert!(!session.attach_index(IndexBuilder::from_documents(&corpus(1))));
    assert_eq!(session.perform_search("kernel", 1).unwrap().total_results, 3);
}

#[test]
fn pages_append_until_exhausted() {
    let mut session = SearchSession::new(MemoryStore::new(), 5);
    session.attach_index(IndexBuilder::from_documents(&corpus(12)));

    let first = session.perform_search("kernel", 1).unwrap();
    assert_eq!(first.results.len(), 5);
    assert!(first.has_more);
    assert_eq!(first.page, 1);

    let second = session.load_more().unwrap();
    assert_eq!(second.results.len(), 10);
    assert!(second.has_more);

    let third = session.load_more().unwrap();
    assert_eq!(third.results.len(), 12);
    assert_eq!(third.total_results, 12);
    assert!(!third.has_more);
    assert_eq!(third.page, 3);

    // nothing left to load
    assert_eq!(session.load_more().unwrap().results.len(), 12);

    let mut ids: Vec<&str> = session.state().results.iter().map(|r| r.id.as_str()).collect();
    ids.dedup();
    assert_eq!(ids.len(), 12);
}

#[test]
fn first_page_is_recorded_in_history() {
    let store = MemoryStore::new();
    let mut session = SearchSession::new(store, 5);
    session.attach_index(IndexBuilder::from_documents(&corpus(8)));

    session.perform_search("kernel", 1).unwrap();
    session.perform_search("note", 1).unwrap();
    session.load_more().unwrap();
    session.perform_search("kernel", 1).unwrap();
    assert_eq!(session.history(), ["kernel", "note"]);
    assert_eq!(session.state().history, vec!["kernel".to_string(), "note".to_string()]);

    session.clear_history();
    assert!(session.history().is_empty());
    assert!(session.state().history.is_empty());
}

#[test]
fn blank_query_clears_results() {
    let mut session = SearchSession::new(MemoryStore::new(), 5);
    session.attach_index(IndexBuilder::from_documents(&corpus(3)));
    session.perform_search("kernel", 1).unwrap();
    assert!(!session.state().results.is_empty());

    let state = session.perform_search("   ", 1).unwrap();
    assert!(state.results.is_empty());
    assert!(state.query.is_empty());
    assert_eq!(state.history, vec!["kernel".to_string()]);

    session.perform_search("kernel", 1).unwrap();
    session.clear_search();
    assert!(session.state().results.is_empty());
    assert!(!session.state().has_more);
}

#[test]
fn history_survives_a_new_session() {
    struct Shared(std::sync::Arc<MemoryStore>);
    impl KeyValueStore for Shared {
        fn get(&self, key: &str) -> docsearch_core::Result<Option<String>> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> docsearch_core::Result<()> {
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> docsearch_core::Result<()> {
            self.0.remove(key)
        }
    }

    let backing = std::sync::Arc::new(MemoryStore::new());
    {
        let mut session = SearchSession::new(Shared(backing.clone()), 5);
        session.attach_index(IndexBuilder::from_documents(&corpus(2)));
        session.perform_search("kernel", 1).unwrap();
    }
    assert_eq!(backing.get(HISTORY_KEY).unwrap().as_deref(), Some(r#"["kernel"]"#));

    let session = SearchSession::new(Shared(backing), 5);
    assert_eq!(session.state().history, vec!["kernel".to_string()]);
}

#[test]
fn surrounding_whitespace_does_not_split_history() {
    let mut session = SearchSession::new(MemoryStore::new(), 5);
    session.attach_index(IndexBuilder::from_documents(&corpus(2)));
    session.perform_search("kernel ", 1).unwrap();
    assert_eq!(session.state().query, "kernel");
    session.perform_search("  kernel", 1).unwrap();
    assert_eq!(session.history(), ["kernel"]);
}

#[test]
fn out_of_range_page_is_an_error_not_a_panic() {
    let mut session = SearchSession::new(MemoryStore::new(), 5);
    session.attach_index(IndexBuilder::from_documents(&corpus(3)));

    let err = session.perform_search("kernel", usize::MAX / 2).unwrap_err();
    assert!(matches!(err, Error::Search(_)));
    assert!(!session.state().is_searching);
    assert!(session.state().error.is_some());

    // a far but representable page is simply empty
    let state = session.perform_search("kernel", 1_000).unwrap();
    assert!(state.results.is_empty());
    assert!(!state.has_more);
    assert_eq!(state.total_results, 3);
}

#[test]
fn scoring_failure_lands_in_state_error() {
    let mut settings = Settings::default();
    settings.search.default_limit = 5;
    settings.weights.title = f64::MAX;
    let mut session = SearchSession::with_settings(MemoryStore::new(), settings);
    session.attach_index(IndexBuilder::from_documents(&corpus(1)));

    let err = session.perform_search("title:kernel", 1).unwrap_err();
    assert!(matches!(err, Error::Search(_)));
    assert_eq!(
        session.state().error.as_deref(),
        Some("Search failed: score for 'kernel/00.md' is not finite (inf)")
    );
    assert!(session.history().is_empty());
}
