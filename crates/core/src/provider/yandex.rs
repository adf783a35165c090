use crate::provider::web::{scrape_translation, PageFetcher};
use crate::provider::{ProviderError, Translator};
use crate::translation::LanguagePair;
use crate::util::poll::PollConfig;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

const TRANSLATOR_URL: &str = "https://translate.yandex.com/";
const RESULT_SELECTOR: &str = "#translation";
// Yandex answers scrapers it dislikes with a redirect to its captcha wall.
const CAPTCHA_MARKER: &str = "showcaptcha";

/// Scrapes the public Yandex web translator. A captcha redirect is reported
/// immediately instead of burning the poll budget against the wall page.
#[derive(Clone)]
pub struct YandexTranslator {
    fetcher: Arc<dyn PageFetcher>,
    poll: PollConfig,
}

impl YandexTranslator {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            poll: PollConfig::scrape_default(),
        }
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    fn request_url(text: &str, pair: &LanguagePair) -> String {
        format!(
            "{TRANSLATOR_URL}?source_lang={}&target_lang={}&text={}",
            pair.from,
            pair.to,
            urlencoding::encode(text)
        )
    }
}

impl Translator for YandexTranslator {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        pair: &'a LanguagePair,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        async move {
            if text.trim().is_empty() {
                return Ok(String::new());
            }
            let url = Self::request_url(text, pair);
            scrape_translation(
                self.fetcher.as_ref(),
                &self.poll,
                &url,
                RESULT_SELECTOR,
                Some(CAPTCHA_MARKER),
            )
            .await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::web::test_support::{page, quick_poll, redirected_page, ScriptedFetcher};
    use std::sync::atomic::Ordering;

    fn pair() -> LanguagePair {
        LanguagePair::new("en", "ru")
    }

    #[test]
    fn request_url_carries_the_languages_and_text() {
        let url = YandexTranslator::request_url("Hello!", &pair());
        assert_eq!(
            url,
            "https://translate.yandex.com/?source_lang=en&target_lang=ru&text=Hello%21"
        );
    }

    #[tokio::test]
    async fn scrapes_the_translation_node() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![page(
            "<div id='translation'>\u{041f}\u{0440}\u{0438}\u{0432}\u{0435}\u{0442}!</div>",
        )]));
        let translator = YandexTranslator::new(fetcher).with_poll(quick_poll());

        let out = translator
            .translate("Hello!", &pair())
            .await
            .expect("renders");
        assert_eq!(out, "\u{041f}\u{0440}\u{0438}\u{0432}\u{0435}\u{0442}!");
    }

    #[tokio::test]
    async fn blank_input_never_touches_the_page() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let fetches = fetcher.fetch_count();
        let translator = YandexTranslator::new(fetcher).with_poll(quick_poll());

        let out = translator
            .translate(" \n ", &pair())
            .await
            .expect("short-circuits");
        assert_eq!(out, "");
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn captcha_redirect_fails_without_polling() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![redirected_page(
            "https://translate.yandex.com/showcaptcha?retpath=...",
            "<body>robot check</body>",
        )]));
        let fetches = fetcher.fetch_count();
        let translator = YandexTranslator::new(fetcher).with_poll(quick_poll());

        let err = translator
            .translate("Hello!", &pair())
            .await
            .expect_err("captcha wall");
        assert!(matches!(err, ProviderError::Captcha));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }
}
