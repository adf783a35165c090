use crate::provider::web::{scrape_translation, PageFetcher};
use crate::provider::{ProviderError, Translator};
use crate::translation::LanguagePair;
use crate::util::poll::PollConfig;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

const TRANSLATOR_URL: &str = "https://www.deepl.com/translator";
// Hidden div DeepL mirrors the translated text into once rendering settles.
const RESULT_SELECTOR: &str = "#target-dummydiv";

/// Scrapes the public DeepL web translator: the text rides in the URL
/// fragment, the translation is polled out of the rendered page.
#[derive(Clone)]
pub struct DeepLTranslator {
    fetcher: Arc<dyn PageFetcher>,
    poll: PollConfig,
}

impl DeepLTranslator {
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
            "{TRANSLATOR_URL}#{}/{}/{}",
            pair.from,
            pair.to,
            urlencoding::encode(text)
        )
    }
}

impl Translator for DeepLTranslator {
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
                None,
            )
            .await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::web::test_support::{page, quick_poll, ScriptedFetcher};
    use std::sync::atomic::Ordering;

    fn pair() -> LanguagePair {
        LanguagePair::new("en", "es")
    }

    #[test]
    fn request_url_embeds_the_pair_and_encoded_text() {
        let url = DeepLTranslator::request_url("Hello world!", &pair());
        assert_eq!(
            url,
            "https://www.deepl.com/translator#en/es/Hello%20world%21"
        );
    }

    #[tokio::test]
    async fn polls_the_result_div_until_it_renders() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            page("<div id='target-dummydiv'></div>"),
            page("<div id='target-dummydiv'>Hola mundo!\n</div>"),
        ]));
        let fetches = fetcher.fetch_count();
        let translator = DeepLTranslator::new(fetcher).with_poll(quick_poll());

        let out = translator
            .translate("Hello world!", &pair())
            .await
            .expect("renders");
        assert_eq!(out, "Hola mundo!");
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_the_attempt_budget() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![page("<body></body>")]));
        let translator = DeepLTranslator::new(fetcher).with_poll(quick_poll());

        let err = translator
            .translate("Hello", &pair())
            .await
            .expect_err("never renders");
        assert!(matches!(err, ProviderError::ResultNotReady(_)));
    }
}
