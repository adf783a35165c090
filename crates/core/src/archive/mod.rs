//! Process-local cache of resolved translations, mirrored to a persisted
//! snapshot blob so translations survive restarts.

use crate::translation::{LanguagePair, Translation, TranslationInput};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

const LOG_TARGET: &str = "archive";

#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error("no archived translations found, archive may be empty")]
    Empty,
    #[error("failed to encode or decode the archive snapshot: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("failed to read or write the archive snapshot: {0}")]
    Io(#[from] io::Error),
}

/// Persistence seam for the archive snapshot: one opaque blob, loaded at
/// startup and saved on demand.
pub trait ArchiveBlobStore: Send + Sync {
    fn load(&self) -> BoxFuture<'_, Result<Option<String>, ArchiveError>>;
    fn save(&self, blob: String) -> BoxFuture<'_, Result<(), ArchiveError>>;
}

/// Snapshot blob stored as a single JSON file on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ArchiveBlobStore for JsonFileStore {
    fn load(&self) -> BoxFuture<'_, Result<Option<String>, ArchiveError>> {
        async move {
            match tokio::fs::read_to_string(&self.path).await {
                Ok(blob) => Ok(Some(blob)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(ArchiveError::Io(e)),
            }
        }
        .boxed()
    }

    fn save(&self, blob: String) -> BoxFuture<'_, Result<(), ArchiveError>> {
        async move {
            if let Some(parent) = self.path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&self.path, blob).await?;
            Ok(())
        }
        .boxed()
    }
}

/// In-memory blob store for tests and runs without a persisted archive.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blob: Arc<std::sync::Mutex<Option<String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArchiveBlobStore for MemoryBlobStore {
    fn load(&self) -> BoxFuture<'_, Result<Option<String>, ArchiveError>> {
        let blob = self.blob.lock().map(|b| b.clone()).unwrap_or_default();
        async move { Ok(blob) }.boxed()
    }

    fn save(&self, blob: String) -> BoxFuture<'_, Result<(), ArchiveError>> {
        if let Ok(mut slot) = self.blob.lock() {
            *slot = Some(blob);
        }
        async move { Ok(()) }.boxed()
    }
}

struct ArchiverInner {
    entries: Mutex<Vec<Translation>>,
    store: Box<dyn ArchiveBlobStore>,
}

/// Cheaply-cloneable handle to the process-wide translation cache.
/// Constructed once and passed by reference to the orchestrator; appends and
/// reads are serialized through one lock.
#[derive(Clone)]
pub struct TranslationArchiver {
    inner: Arc<ArchiverInner>,
}

impl TranslationArchiver {
    pub fn new(store: Box<dyn ArchiveBlobStore>) -> Self {
        Self {
            inner: Arc::new(ArchiverInner {
                entries: Mutex::new(Vec::new()),
                store,
            }),
        }
    }

    /// Append unconditionally. Entries are never deduplicated; lookup returns
    /// the first match, so stale duplicates are simply shadowed.
    pub async fn add(&self, translation: Translation) {
        self.inner.entries.lock().await.push(translation);
    }

    /// First archived entry whose target language and effective source value
    /// match the probe. Absence is not an error.
    pub async fn get(
        &self,
        input: &TranslationInput,
        pair: &LanguagePair,
    ) -> Option<Translation> {
        let entries = self.inner.entries.lock().await;
        entries
            .iter()
            .find(|t| t.language_pair.to == pair.to && t.input.value() == input.value())
            .cloned()
    }

    /// Replace the in-memory sequence with the persisted snapshot. A missing
    /// blob is reported as a soft [`ArchiveError::Empty`], not a fault.
    pub async fn load(&self) -> Result<usize, ArchiveError> {
        let Some(blob) = self.inner.store.load().await? else {
            tracing::debug!(target: LOG_TARGET, "no archive snapshot found, starting empty");
            return Err(ArchiveError::Empty);
        };
        let loaded: Vec<Translation> = serde_json::from_str(&blob)?;
        let count = loaded.len();
        *self.inner.entries.lock().await = loaded;
        tracing::debug!(target: LOG_TARGET, count, "archive snapshot loaded");
        Ok(count)
    }

    /// Persist the current in-memory sequence as one snapshot blob.
    pub async fn save(&self) -> Result<(), ArchiveError> {
        let blob = {
            let entries = self.inner.entries.lock().await;
            serde_json::to_string(&*entries)?
        };
        self.inner.store.save(blob).await
    }

    /// Reset the in-memory sequence. The persisted snapshot is left alone;
    /// clearing it is the caller's call.
    pub async fn clear(&self) {
        self.inner.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(source: &str, output: &str, to: &str) -> Translation {
        Translation::new(
            TranslationInput::new(source),
            output.to_owned(),
            LanguagePair::new("en", to),
        )
    }

    fn archiver() -> TranslationArchiver {
        TranslationArchiver::new(Box::new(MemoryBlobStore::new()))
    }

    #[tokio::test]
    async fn lookup_matches_target_language_and_value() {
        let archive = archiver();
        archive.add(entry("Hello!", "Hola!", "es")).await;
        archive.add(entry("Hello!", "Ol\u{e1}!", "pt")).await;

        let hit = archive
            .get(&TranslationInput::new("Hello!"), &LanguagePair::new("en", "pt"))
            .await
            .expect("archived");
        assert_eq!(hit.output, "Ol\u{e1}!");

        let miss = archive
            .get(&TranslationInput::new("Goodbye"), &LanguagePair::new("en", "es"))
            .await;
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn lookup_matches_on_effective_value() {
        let archive = archiver();
        archive.add(entry("Hello!", "Hola!", "es")).await;

        let probe = TranslationInput::with_alternate("HELLO!!", "Hello!");
        let hit = archive
            .get(&probe, &LanguagePair::new("en", "es"))
            .await
            .expect("archived");
        assert_eq!(hit.output, "Hola!");
    }

    #[tokio::test]
    async fn duplicate_entries_resolve_to_first_match() {
        let archive = archiver();
        archive.add(entry("Hello!", "Hola!", "es")).await;
        archive.add(entry("Hello!", "Buenas!", "es")).await;

        let hit = archive
            .get(&TranslationInput::new("Hello!"), &LanguagePair::new("en", "es"))
            .await
            .expect("archived");
        assert_eq!(hit.output, "Hola!");
        assert_eq!(archive.len().await, 2);
    }

    #[tokio::test]
    async fn snapshot_round_trip() {
        let store = MemoryBlobStore::new();
        let archive = TranslationArchiver::new(Box::new(store.clone()));
        archive.add(entry("Hello!", "Hola!", "es")).await;
        archive.save().await.expect("saves");

        let restored = TranslationArchiver::new(Box::new(store));
        assert_eq!(restored.load().await.expect("loads"), 1);
        let hit = restored
            .get(&TranslationInput::new("Hello!"), &LanguagePair::new("en", "es"))
            .await
            .expect("archived");
        assert_eq!(hit.output, "Hola!");
    }

    #[tokio::test]
    async fn missing_snapshot_is_soft_empty() {
        let archive = archiver();
        let err = archive.load().await.expect_err("empty");
        assert!(matches!(err, ArchiveError::Empty));
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_codec_error() {
        let store = MemoryBlobStore::new();
        store
            .save("not json".to_owned())
            .await
            .expect("stores blob");
        let archive = TranslationArchiver::new(Box::new(store));
        let err = archive.load().await.expect_err("corrupt");
        assert!(matches!(err, ArchiveError::Codec(_)));
    }

    #[tokio::test]
    async fn clear_resets_memory_only() {
        let store = MemoryBlobStore::new();
        let archive = TranslationArchiver::new(Box::new(store.clone()));
        archive.add(entry("Hello!", "Hola!", "es")).await;
        archive.save().await.expect("saves");
        archive.clear().await;
        assert!(archive.is_empty().await);

        let restored = TranslationArchiver::new(Box::new(store));
        assert_eq!(restored.load().await.expect("loads"), 1);
    }
}
