use std::fs;
use std::io::Write;
use tempfile::TempDir;

use docsearch_core::corpus::CorpusLoader;
use docsearch_core::error::{Error, Result};
use docsearch_core::history::{HistoryStore, HISTORY_KEY, MAX_HISTORY};
use docsearch_core::store::{JsonFileStore, MemoryStore};
use docsearch_core::traits::KeyValueStore;
use docsearch_core::types::SearchIndex;

#[test]
fn load_dir_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.md");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "# Short\n\nShort text").unwrap();

    let docs = CorpusLoader::new().load_dir(dir).expect("load");

    assert_eq!(docs.len(), 1, "one markdown file becomes one document");
    assert_eq!(docs[0].id, "a.md");
    assert_eq!(docs[0].title, "Short");
    assert_eq!(docs[0].content, "Short text");
}

#[test]
fn load_dir_limited_two_files_limit_one() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("net")).unwrap();
    fs::write(dir.join("net/a.md"), "# Alpha\nbravo").unwrap();
    fs::write(dir.join("b.md"), "# Charlie\ndelta").unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let all = CorpusLoader::new().load_dir(dir).expect("load");
    assert_eq!(all.len(), 2, "only markdown files are loaded");
    assert!(all.iter().any(|d| d.id == "net/a.md"));

    let limited = CorpusLoader::new().load_dir_limited(dir, 1).expect("load limited");
    assert_eq!(limited.len(), 1, "limited to one source document");
}

#[test]
fn history_keeps_ten_most_recent() {
    let mut history = HistoryStore::open(MemoryStore::new());
    for i in 0..15 {
        history.add_to_history(&format!("query {}", i));
    }
    let expected: Vec<String> = (5..15).rev().map(|i| format!("query {}", i)).collect();
    assert_eq!(history.get_history(), expected.as_slice());
    assert_eq!(history.get_history().len(), MAX_HISTORY);
}

#[test]
fn history_round_trips_through_file_store() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("state/history.json");
    {
        let mut history = HistoryStore::open(JsonFileStore::new(&path));
        history.add_to_history("kerberoast");
        history.add_to_history("asrep");
        history.add_to_history("kerberoast");
    }
    let reopened = HistoryStore::open(JsonFileStore::new(&path));
    assert_eq!(reopened.get_history(), ["kerberoast", "asrep"]);

    let mut reopened = reopened;
    reopened.clear_history();
    assert!(reopened.get_history().is_empty());
    assert_eq!(reopened.store().get(HISTORY_KEY).unwrap(), None);
}

struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::Storage("disk unplugged".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::Storage("disk unplugged".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(Error::Storage("disk unplugged".to_string()))
    }
}

#[test]
fn history_failures_are_swallowed_and_memory_still_updates() {
    let mut history = HistoryStore::open(BrokenStore);
    assert!(history.get_history().is_empty());

    history.add_to_history("pivoting");
    assert_eq!(history.get_history(), ["pivoting"]);

    history.clear_history();
    assert!(history.get_history().is_empty());
}

#[test]
fn corrupt_history_payload_loads_as_empty() {
    let store = MemoryStore::new();
    store.set(HISTORY_KEY, "{not json").unwrap();
    let history = HistoryStore::open(store);
    assert!(history.get_history().is_empty());
}

#[test]
fn index_save_and_load() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("out/index.json");
    let index = SearchIndex::default();
    index.save(&path).expect("save");
    assert_eq!(SearchIndex::load(&path).expect("load"), index);

    let missing = SearchIndex::load(&tmp.path().join("nope.json"));
    assert!(matches!(missing, Err(Error::NotFound(_))));
}
