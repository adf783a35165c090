use crate::provider::{ProviderError, Translator};
use crate::translation::LanguagePair;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const API_URL: &str = "https://translation.googleapis.com/language/translate/v2";

#[derive(Clone)]
pub struct GoogleTranslator {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[derive(Serialize)]
struct GoogleRequest {
    q: String,
    source: String,
    target: String,
    format: String,
}

#[derive(Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Deserialize)]
struct GoogleTranslation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl Translator for GoogleTranslator {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        pair: &'a LanguagePair,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        let this = self.clone();
        async move {
            if text.trim().is_empty() {
                return Ok(String::new());
            }
            let Some(api_key) = this.api_key.as_deref() else {
                return Err(ProviderError::MissingCredentials("google"));
            };

            let request = GoogleRequest {
                q: text.to_owned(),
                source: pair.from.clone(),
                target: pair.to.clone(),
                format: "text".to_owned(),
            };

            let response = this
                .client
                .post(&this.base_url)
                .query(&[("key", api_key)])
                .json(&request)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(ProviderError::HttpStatus(status.as_u16(), error_text));
            }

            let body: GoogleResponse = response.json().await.map_err(|e| {
                ProviderError::InvalidResponse(format!("failed to parse JSON: {e}"))
            })?;

            body.data
                .translations
                .into_iter()
                .next()
                .map(|t| t.translated_text)
                .ok_or_else(|| {
                    ProviderError::InvalidResponse("no translations in response".to_string())
                })
        }
        .boxed()
    }
}
