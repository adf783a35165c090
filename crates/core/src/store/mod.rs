//! Client for the shared translation store: a hierarchical key-value tree
//! where any client can find a translation by hashing the source text,
//! independent of which provider produced it.
//!
//! Path scheme: `{environment}/translations/{from}-{to}/{sha256(value)}`.

mod memory;
mod rest;

pub use memory::MemoryStoreBackend;
pub use rest::RestStoreBackend;

use crate::archive::TranslationArchiver;
use crate::config::Environment;
use crate::translation::wire::{self, WireError};
use crate::translation::{LanguagePair, Translation, TranslationInput};
use futures::future::{join_all, BoxFuture};
use std::collections::BTreeMap;
use std::sync::Arc;

const LOG_TARGET: &str = "store";

/// Sentinel recorded in a batch-lookup result map for an input the store had
/// nothing for, so partial results stay distinguishable from an empty map.
pub const ERROR_SENTINEL: &str = "!";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store returned HTTP {0}: {1}")]
    HttpStatus(u16, String),
    #[error("invalid store url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("stored translation {key} is malformed: {source}")]
    Wire { key: String, source: WireError },
    #[error("could not save translation for {pair}: {source}")]
    Upload {
        pair: String,
        #[source]
        source: Box<StoreError>,
    },
    #[error("translations in one upload batch must share a language pair")]
    MixedLanguagePairs,
    #[error("no uploaded translations for {0}")]
    NoTranslations(LanguagePair),
    #[error("{}", compound_message(.0))]
    Compound(Vec<StoreError>),
}

fn compound_message(errors: &[StoreError]) -> String {
    let descriptors: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    format!(
        "{} store operations failed: {}",
        errors.len(),
        descriptors.join("; ")
    )
}

fn collect_errors(results: Vec<Result<(), StoreError>>) -> Result<(), StoreError> {
    let mut errors: Vec<StoreError> = results.into_iter().filter_map(Result::err).collect();
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(StoreError::Compound(errors)),
    }
}

/// Raw access to the hierarchical key-value tree. Absence is `Ok(None)`,
/// never an error.
pub trait StoreBackend: Send + Sync {
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<String>, StoreError>>;
    fn put<'a>(&'a self, path: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StoreError>>;
    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<(), StoreError>>;
    fn list<'a>(
        &'a self,
        path: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<BTreeMap<String, String>, StoreError>>;
}

/// Uploads, downloads and removes translations at deterministic store paths,
/// scoped by deployment environment and language pair.
#[derive(Clone)]
pub struct TranslationStore {
    backend: Arc<dyn StoreBackend>,
    environment: Environment,
    page_size: usize,
}

impl TranslationStore {
    pub fn new(backend: Arc<dyn StoreBackend>, environment: Environment, page_size: usize) -> Self {
        Self {
            backend,
            environment,
            page_size,
        }
    }

    fn table_path(&self, pair: &LanguagePair) -> String {
        format!(
            "{}/translations/{}",
            self.environment.as_str(),
            pair.as_string()
        )
    }

    fn entry_path(&self, pair: &LanguagePair, key: &str) -> String {
        format!("{}/{}", self.table_path(pair), key)
    }

    /// Write one translation at its hashed key.
    pub async fn upload(&self, translation: &Translation) -> Result<(), StoreError> {
        let (key, value) = wire::encode(translation);
        let path = self.entry_path(&translation.language_pair, &key);
        self.backend.put(&path, &value).await.map_err(|source| {
            tracing::warn!(
                target: LOG_TARGET,
                pair = %translation.language_pair,
                key = %key,
                error = %source,
                "translation upload failed"
            );
            StoreError::Upload {
                pair: translation.language_pair.as_string(),
                source: Box::new(source),
            }
        })
    }

    /// Upload a batch that may mix language pairs: entries are grouped per
    /// pair, every group is uploaded concurrently, and the whole call fails
    /// with every underlying descriptor if any group fails.
    pub async fn upload_all(&self, translations: &[Translation]) -> Result<(), StoreError> {
        if translations.is_empty() {
            return Ok(());
        }
        let mut by_pair: BTreeMap<String, Vec<&Translation>> = BTreeMap::new();
        for translation in translations {
            by_pair
                .entry(translation.language_pair.as_string())
                .or_default()
                .push(translation);
        }
        let uploads = by_pair.values().map(|group| self.upload_batch(group));
        collect_errors(join_all(uploads).await)
    }

    /// Upload one homogeneous group. The language-pair check is defensive;
    /// [`upload_all`](Self::upload_all) always hands over uniform groups.
    async fn upload_batch(&self, translations: &[&Translation]) -> Result<(), StoreError> {
        if let Some(first) = translations.first() {
            if translations
                .iter()
                .any(|t| t.language_pair != first.language_pair)
            {
                return Err(StoreError::MixedLanguagePairs);
            }
        }
        let uploads = translations.iter().map(|t| self.upload(t));
        collect_errors(join_all(uploads).await)
    }

    /// Bulk-fetch up to one page of a language pair's table and seed the
    /// local archive with every decoded entry. An empty table is reported as
    /// [`StoreError::NoTranslations`]; for an identity pair that outcome is
    /// expected and only logged at debug level.
    pub async fn download_table(
        &self,
        pair: &LanguagePair,
        archiver: &TranslationArchiver,
    ) -> Result<Vec<Translation>, StoreError> {
        let entries = self
            .backend
            .list(&self.table_path(pair), self.page_size)
            .await?;
        if entries.is_empty() {
            if pair.is_identity() {
                tracing::debug!(target: LOG_TARGET, pair = %pair, "no stored translations for identity pair");
            } else {
                tracing::error!(target: LOG_TARGET, pair = %pair, "no stored translations found");
            }
            return Err(StoreError::NoTranslations(pair.clone()));
        }
        let mut seeded = Vec::with_capacity(entries.len());
        for (key, raw) in entries {
            let translation = wire::decode(&raw, pair)
                .map_err(|source| StoreError::Wire { key, source })?;
            archiver.add(translation.clone()).await;
            seeded.push(translation);
        }
        tracing::debug!(target: LOG_TARGET, pair = %pair, count = seeded.len(), "seeded archive from store");
        Ok(seeded)
    }

    /// Look up one entry by the hash of the input's effective value.
    /// `Ok(None)` means no uploaded translation exists.
    pub async fn find(
        &self,
        input: &TranslationInput,
        pair: &LanguagePair,
    ) -> Result<Option<Translation>, StoreError> {
        self.find_by_reference(&wire::storage_key(input.value()), pair)
            .await
    }

    /// Look up by an already-known hash reference instead of recomputing it.
    pub async fn find_by_reference(
        &self,
        key: &str,
        pair: &LanguagePair,
    ) -> Result<Option<Translation>, StoreError> {
        match self.backend.get(&self.entry_path(pair, key)).await? {
            None => Ok(None),
            Some(raw) => wire::decode(&raw, pair)
                .map(Some)
                .map_err(|source| StoreError::Wire {
                    key: key.to_owned(),
                    source,
                }),
        }
    }

    /// Batch lookup with one concurrent probe per input. Inputs the store
    /// has nothing for are recorded under [`ERROR_SENTINEL`]; `Ok(None)`
    /// means not a single input had an uploaded translation.
    pub async fn find_all(
        &self,
        inputs: &[TranslationInput],
        pair: &LanguagePair,
    ) -> Result<Option<BTreeMap<String, String>>, StoreError> {
        let lookups = inputs.iter().map(|input| async move {
            (input.value().to_owned(), self.find(input, pair).await)
        });
        let results = join_all(lookups).await;

        let mut map = BTreeMap::new();
        let mut found = 0usize;
        for (value, outcome) in results {
            match outcome {
                Ok(Some(translation)) => {
                    found += 1;
                    map.insert(value, translation.output);
                }
                Ok(None) => {
                    map.insert(value, ERROR_SENTINEL.to_owned());
                }
                Err(e) => {
                    tracing::warn!(target: LOG_TARGET, pair = %pair, error = %e, "batch lookup entry failed");
                    map.insert(value, ERROR_SENTINEL.to_owned());
                }
            }
        }
        if found == 0 {
            return Ok(None);
        }
        Ok(Some(map))
    }

    /// Delete one translation's entry.
    pub async fn remove(&self, translation: &Translation) -> Result<(), StoreError> {
        let key = wire::storage_key(translation.input.value());
        self.backend
            .delete(&self.entry_path(&translation.language_pair, &key))
            .await
    }

    /// Delete a batch of entries concurrently, aggregating every failure.
    pub async fn remove_all(&self, translations: &[Translation]) -> Result<(), StoreError> {
        let removals = translations.iter().map(|t| self.remove(t));
        collect_errors(join_all(removals).await)
    }
}
