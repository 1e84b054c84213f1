use crate::error::Result;
use crate::types::{SearchHit, SourceDocument};

/// Persistence collaborator for small string values, keyed by a fixed name.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Engines that build their own index from source documents.
pub trait DocumentIndexer: Send + Sync {
    /// Returns the number of documents added; zero when the engine was already indexed.
    fn index(&mut self, docs: &[SourceDocument]) -> anyhow::Result<usize>;
}

pub trait SearchBackend: Send + Sync {
    fn query(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>>;
}
