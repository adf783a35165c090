//! The resolution pipeline: for each input decide between returning it
//! unchanged, serving it from the local archive, fetching it from the shared
//! store, or invoking a provider, then write fresh results through to both
//! caches.

mod progress;

pub use progress::{NoopProgress, ProgressReporter};

use crate::archive::TranslationArchiver;
use crate::provider::{deepl_supports, Platform, ProviderError, ProviderRegistry};
use crate::service::progress::HudGuard;
use crate::store::TranslationStore;
use crate::translation::{match_capitalization, LanguagePair, Translation, TranslationInput};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

const LOG_TARGET: &str = "service";

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[derive(Clone, Debug, Default)]
pub struct TranslateOptions {
    /// Provider override for this call; the service default otherwise.
    pub platform: Option<Platform>,
    /// Show a progress indicator if resolution takes noticeably long.
    pub requires_hud: bool,
}

/// Outcome of a batch resolution. Both sides may be populated at once for a
/// partial success; a side with nothing to report is `None` rather than
/// empty. Error keys are the error descriptors, mapped to the offending
/// input.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub translations: Option<Vec<Translation>>,
    pub errors: Option<HashMap<String, TranslationInput>>,
}

pub struct TranslatorService {
    providers: ProviderRegistry,
    store: TranslationStore,
    archive: TranslationArchiver,
    progress: Arc<dyn ProgressReporter>,
    default_platform: Platform,
}

impl TranslatorService {
    pub fn new(
        providers: ProviderRegistry,
        store: TranslationStore,
        archive: TranslationArchiver,
    ) -> Self {
        Self {
            providers,
            store,
            archive,
            progress: Arc::new(NoopProgress),
            default_platform: Platform::Google,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_default_platform(mut self, platform: Platform) -> Self {
        self.default_platform = platform;
        self
    }

    pub fn archive(&self) -> &TranslationArchiver {
        &self.archive
    }

    pub fn store(&self) -> &TranslationStore {
        &self.store
    }

    /// DeepL only covers a fixed set of target languages; requests aimed
    /// outside it fall back to Google for this call only.
    fn effective_platform(&self, requested: Option<Platform>, pair: &LanguagePair) -> Platform {
        let platform = requested.unwrap_or(self.default_platform);
        match platform {
            Platform::DeepL | Platform::Random if !deepl_supports(&pair.to) => {
                tracing::debug!(
                    target: LOG_TARGET,
                    pair = %pair,
                    requested = %platform,
                    "target language outside deepl coverage, using google"
                );
                Platform::Google
            }
            other => other,
        }
    }

    /// Resolve one input. First satisfied stage wins: identity pair, blank
    /// input, local archive, shared store, provider. Only a provider failure
    /// surfaces to the caller; archive and store faults fall through to the
    /// next stage.
    pub async fn translate(
        &self,
        input: &TranslationInput,
        pair: &LanguagePair,
        options: &TranslateOptions,
    ) -> Result<Translation, ServiceError> {
        if pair.is_identity() {
            return Ok(Translation::new(
                input.clone(),
                input.value().to_owned(),
                pair.clone(),
            ));
        }

        let value = input.value();
        if value.trim().is_empty() {
            return Ok(Translation::new(input.clone(), String::new(), pair.clone()));
        }

        let platform = self.effective_platform(options.platform, pair);

        if let Some(hit) = self.archive.get(input, pair).await {
            tracing::debug!(target: LOG_TARGET, pair = %pair, "archive hit");
            return Ok(hit);
        }

        // Archive misses may go to the network from here on; the indicator
        // only appears if resolution drags past the arming delay.
        let _hud = options
            .requires_hud
            .then(|| HudGuard::arm(self.progress.clone()));

        match self.store.find(input, pair).await {
            Ok(Some(found)) => {
                let output = match_capitalization(&found.output, value);
                let translation = Translation::new(input.clone(), output, pair.clone());
                self.archive.add(translation.clone()).await;
                tracing::debug!(target: LOG_TARGET, pair = %pair, "served from shared store");
                return Ok(translation);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    pair = %pair,
                    error = %e,
                    "store lookup failed, falling through to provider"
                );
            }
        }

        let provider = self.providers.get(platform);
        let raw = provider.translate(value, pair).await?;
        let output = match_capitalization(&raw, value);
        let translation = Translation::new(input.clone(), output, pair.clone());

        if let Err(e) = self.store.upload(&translation).await {
            tracing::warn!(
                target: LOG_TARGET,
                pair = %pair,
                error = %e,
                "could not share translation with the store"
            );
        }
        self.archive.add(translation.clone()).await;
        Ok(translation)
    }

    /// Resolve a batch. Identity pairs never reach per-item dispatch; every
    /// other input is dispatched concurrently and the outcome is assembled
    /// only once all of them have reported.
    pub async fn translate_batch(
        &self,
        inputs: &[TranslationInput],
        pair: &LanguagePair,
        options: &TranslateOptions,
    ) -> BatchOutcome {
        if inputs.is_empty() {
            return BatchOutcome::default();
        }

        if pair.is_identity() {
            let translations = inputs
                .iter()
                .map(|input| {
                    Translation::new(input.clone(), input.value().to_owned(), pair.clone())
                })
                .collect();
            return BatchOutcome {
                translations: Some(translations),
                errors: None,
            };
        }

        let lookups = inputs.iter().map(|input| async move {
            (input, self.translate(input, pair, options).await)
        });
        let results = join_all(lookups).await;

        let mut translations = Vec::new();
        let mut errors: HashMap<String, TranslationInput> = HashMap::new();
        let mut failure_count = 0usize;
        for (input, result) in results {
            match result {
                Ok(translation) => translations.push(translation),
                Err(e) => {
                    failure_count += 1;
                    errors.insert(e.to_string(), input.clone());
                }
            }
        }

        // Every dispatched input must have reported exactly once; anything
        // else means a completion was lost or duplicated.
        if translations.len() + failure_count != inputs.len() {
            tracing::error!(
                target: LOG_TARGET,
                expected = inputs.len(),
                successes = translations.len(),
                failures = failure_count,
                "batch bookkeeping lost or duplicated a completion"
            );
            debug_assert_eq!(translations.len() + failure_count, inputs.len());
        }

        BatchOutcome {
            translations: (!translations.is_empty()).then_some(translations),
            errors: (!errors.is_empty()).then_some(errors),
        }
    }
}
