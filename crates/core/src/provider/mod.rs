//! Machine-translation backends. Two speak JSON REST APIs (Google, Azure),
//! two scrape the provider's public web translator (DeepL, Yandex). All of
//! them implement the same one-shot translate contract.

mod azure;
mod deepl;
mod google;
mod web;
mod yandex;

pub use azure::AzureTranslator;
pub use deepl::DeepLTranslator;
pub use google::GoogleTranslator;
pub use web::{FetchedPage, HttpPageFetcher, PageFetcher};
pub use yandex::YandexTranslator;

use crate::config::ApiKeys;
use crate::translation::LanguagePair;
use futures::future::BoxFuture;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const LOG_TARGET: &str = "provider";

/// Target languages the DeepL web translator accepts. Requests aimed outside
/// this table are downgraded to Google by the orchestrator.
const DEEPL_TARGET_LANGUAGES: &[&str] = &[
    "bg", "cs", "da", "de", "el", "en", "es", "et", "fi", "fr", "hu", "id", "it", "ja", "ko",
    "lt", "lv", "nb", "nl", "pl", "pt", "ro", "ru", "sk", "sl", "sv", "tr", "uk", "zh",
];

pub fn deepl_supports(lang: &str) -> bool {
    let primary = lang.split('-').next().unwrap_or(lang);
    DEEPL_TARGET_LANGUAGES
        .iter()
        .any(|l| l.eq_ignore_ascii_case(primary))
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Platform {
    Azure,
    DeepL,
    Google,
    Yandex,
    Random,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Azure => "azure",
            Platform::DeepL => "deepl",
            Platform::Google => "google",
            Platform::Yandex => "yandex",
            Platform::Random => "random",
        }
    }

    /// Collapse `Random` into a uniformly chosen concrete platform; concrete
    /// platforms pass through.
    pub fn resolve(self) -> Platform {
        match self {
            Platform::Random => {
                const CONCRETE: [Platform; 4] = [
                    Platform::Azure,
                    Platform::DeepL,
                    Platform::Google,
                    Platform::Yandex,
                ];
                CONCRETE[rand::rng().random_range(0..CONCRETE.len())]
            }
            other => other,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "azure" => Ok(Platform::Azure),
            "deepl" => Ok(Platform::DeepL),
            "google" => Ok(Platform::Google),
            "yandex" => Ok(Platform::Yandex),
            "random" => Ok(Platform::Random),
            _ => Err(ProviderError::UnknownPlatform(s.to_owned())),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("translation service returned HTTP {0}: {1}")]
    HttpStatus(u16, String),
    #[error("translation service returned an unexpected response: {0}")]
    InvalidResponse(String),
    #[error("no api key configured for {0}")]
    MissingCredentials(&'static str),
    #[error("translation page demanded a captcha")]
    Captcha,
    #[error("translated text did not render after {0} attempts")]
    ResultNotReady(u32),
    #[error("unknown translation platform: {0}")]
    UnknownPlatform(String),
}

pub trait Translator: Send + Sync {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        pair: &'a LanguagePair,
    ) -> BoxFuture<'a, Result<String, ProviderError>>;
}

/// One concrete provider instance per platform, selected by exhaustive
/// match. Providers keep no per-request state, so sharing an instance across
/// concurrent requests is safe.
#[derive(Clone)]
pub struct ProviderRegistry {
    azure: Arc<dyn Translator>,
    deepl: Arc<dyn Translator>,
    google: Arc<dyn Translator>,
    yandex: Arc<dyn Translator>,
}

impl ProviderRegistry {
    pub fn new(api_keys: &ApiKeys, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            azure: Arc::new(AzureTranslator::new(
                api_keys.azure.as_ref().map(|k| k.expose().to_owned()),
            )),
            deepl: Arc::new(DeepLTranslator::new(fetcher.clone())),
            google: Arc::new(GoogleTranslator::new(
                api_keys.google.as_ref().map(|k| k.expose().to_owned()),
            )),
            yandex: Arc::new(YandexTranslator::new(fetcher)),
        }
    }

    /// Swap one platform's provider, e.g. for a stub in tests.
    pub fn with_provider(mut self, platform: Platform, provider: Arc<dyn Translator>) -> Self {
        match platform {
            Platform::Azure => self.azure = provider,
            Platform::DeepL => self.deepl = provider,
            Platform::Google => self.google = provider,
            Platform::Yandex => self.yandex = provider,
            Platform::Random => {
                tracing::debug!(target: LOG_TARGET, "random is not a concrete provider slot");
            }
        }
        self
    }

    pub fn get(&self, platform: Platform) -> Arc<dyn Translator> {
        match platform.resolve() {
            Platform::Azure => self.azure.clone(),
            Platform::DeepL => self.deepl.clone(),
            Platform::Google => self.google.clone(),
            Platform::Yandex => self.yandex.clone(),
            // resolve() only yields concrete platforms
            Platform::Random => self.google.clone(),
        }
    }
}
