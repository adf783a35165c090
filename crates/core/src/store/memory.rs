use crate::store::{StoreBackend, StoreError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// In-process store backend: a flat path → value map. Backs tests and runs
/// without a configured remote store; such runs still exercise the whole
/// resolution ladder, they just don't share results across clients.
#[derive(Clone, Default)]
pub struct MemoryStoreBackend {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStoreBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> T) -> T {
        let mut guard = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Seed an entry directly, bypassing the wire codec.
    pub fn insert(&self, path: &str, value: &str) {
        self.with_entries(|entries| {
            entries.insert(path.to_owned(), value.to_owned());
        });
    }

    pub fn value_at(&self, path: &str) -> Option<String> {
        self.with_entries(|entries| entries.get(path).cloned())
    }

    pub fn len(&self) -> usize {
        self.with_entries(|entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StoreBackend for MemoryStoreBackend {
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<String>, StoreError>> {
        let value = self.value_at(path);
        async move { Ok(value) }.boxed()
    }

    fn put<'a>(&'a self, path: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        self.insert(path, value);
        async move { Ok(()) }.boxed()
    }

    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        self.with_entries(|entries| {
            entries.remove(path);
        });
        async move { Ok(()) }.boxed()
    }

    fn list<'a>(
        &'a self,
        path: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<BTreeMap<String, String>, StoreError>> {
        let prefix = format!("{path}/");
        let page = self.with_entries(|entries| {
            entries
                .iter()
                .filter_map(|(key, value)| {
                    let child = key.strip_prefix(&prefix)?;
                    if child.contains('/') {
                        return None;
                    }
                    Some((child.to_owned(), value.clone()))
                })
                .take(limit)
                .collect()
        });
        async move { Ok(page) }.boxed()
    }
}
