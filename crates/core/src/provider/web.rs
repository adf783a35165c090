//! Shared plumbing for the providers that scrape a public web translator
//! instead of calling an API: fetch the page the text was submitted to, then
//! keep re-probing the rendered result node until it shows something or the
//! attempt budget runs out.

use crate::provider::ProviderError;
use crate::util::poll::{poll_until, PollConfig};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) \
     Version/17.0 Safari/605.1.15";

/// A fetched page plus the URL the request actually landed on, so callers
/// can detect redirects (Yandex answers scrapers with a captcha redirect).
#[derive(Clone, Debug)]
pub struct FetchedPage {
    pub final_url: String,
    pub html: String,
}

/// Seam between the scraping providers and the network, so the poll loop is
/// testable against canned pages.
pub trait PageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedPage, ProviderError>>;
}

/// Production fetcher. The client keeps no cookie store, so every navigation
/// starts session-clean and unrelated translation requests cannot leak state
/// into each other.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedPage, ProviderError>> {
        async move {
            let response = self.client.get(url).send().await?;
            let final_url = response.url().to_string();
            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(ProviderError::HttpStatus(status.as_u16(), error_text));
            }
            let html = response.text().await?;
            Ok(FetchedPage { final_url, html })
        }
        .boxed()
    }
}

/// Rendered text of the first node matching `selector`, with trailing
/// newlines trimmed; `None` while the node is absent or still empty.
fn rendered_text(html: &str, selector: &Selector) -> Option<String> {
    let document = Html::parse_document(html);
    let text: String = document.select(selector).next()?.text().collect();
    let text = text.trim_end_matches(['\n', '\r']).to_owned();
    (!text.is_empty()).then_some(text)
}

/// Submit-and-poll loop shared by the scraping providers. A transport error
/// or a captcha redirect ends the wait immediately; an empty result node
/// keeps polling until the budget is spent. The poll loop is the single
/// completion path, so exactly one outcome is ever reported even when a
/// fetch failure and a satisfied probe race.
pub(crate) async fn scrape_translation(
    fetcher: &dyn PageFetcher,
    poll: &PollConfig,
    url: &str,
    selector_source: &str,
    captcha_marker: Option<&str>,
) -> Result<String, ProviderError> {
    // Selector sources are compile-time constants in the providers.
    let selector = Selector::parse(selector_source).expect("static CSS selector is valid");
    let selector = &selector;
    let outcome = poll_until(poll, move || async move {
        match fetcher.fetch(url).await {
            Err(e) => Some(Err(e)),
            Ok(page) => {
                if let Some(marker) = captcha_marker {
                    if page.final_url.contains(marker) {
                        return Some(Err(ProviderError::Captcha));
                    }
                }
                rendered_text(&page.html, selector).map(Ok)
            }
        }
    })
    .await;
    match outcome {
        Some(result) => result,
        None => Err(ProviderError::ResultNotReady(poll.max_attempts)),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{page, quick_poll, ScriptedFetcher};
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn rendered_text_trims_trailing_newlines() {
        let selector = Selector::parse("#result").expect("valid selector");
        let html = "<html><body><div id='result'>Hola!\n\n</div></body></html>";
        assert_eq!(rendered_text(html, &selector).as_deref(), Some("Hola!"));
    }

    #[test]
    fn rendered_text_empty_node_is_none() {
        let selector = Selector::parse("#result").expect("valid selector");
        let html = "<html><body><div id='result'></div></body></html>";
        assert!(rendered_text(html, &selector).is_none());
    }

    #[tokio::test]
    async fn polls_until_the_result_renders() {
        let fetcher = ScriptedFetcher::new(vec![
            page("<div id='result'></div>"),
            page("<div id='result'></div>"),
            page("<div id='result'>Hola!</div>"),
        ]);
        let fetches = fetcher.fetch_count();

        let out = scrape_translation(&fetcher, &quick_poll(), "u", "#result", None)
            .await
            .expect("renders");
        assert_eq!(out, "Hola!");
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_budget_is_result_not_ready() {
        let fetcher = ScriptedFetcher::new(vec![page("<div id='result'></div>")]);
        let err = scrape_translation(&fetcher, &quick_poll(), "u", "#result", None)
            .await
            .expect_err("never renders");
        assert!(matches!(err, ProviderError::ResultNotReady(5)));
    }

    #[tokio::test]
    async fn transport_error_ends_the_wait() {
        let fetcher = ScriptedFetcher::new(vec![Err(ProviderError::HttpStatus(
            502,
            "bad gateway".to_owned(),
        ))]);
        let fetches = fetcher.fetch_count();
        let err = scrape_translation(&fetcher, &quick_poll(), "u", "#result", None)
            .await
            .expect_err("fails");
        assert!(matches!(err, ProviderError::HttpStatus(502, _)));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }
}
