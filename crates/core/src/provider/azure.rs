use crate::provider::{ProviderError, Translator};
use crate::translation::LanguagePair;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const API_URL: &str = "https://api.cognitive.microsofttranslator.com/translate";
const API_VERSION: &str = "3.0";

#[derive(Clone)]
pub struct AzureTranslator {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl AzureTranslator {
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
struct AzureSegment {
    #[serde(rename = "Text")]
    text: String,
}

#[derive(Deserialize)]
struct AzureResult {
    translations: Vec<AzureTranslation>,
}

#[derive(Deserialize)]
struct AzureTranslation {
    text: String,
}

impl Translator for AzureTranslator {
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
                return Err(ProviderError::MissingCredentials("azure"));
            };

            let body = vec![AzureSegment {
                text: text.to_owned(),
            }];

            let response = this
                .client
                .post(&this.base_url)
                .query(&[
                    ("api-version", API_VERSION),
                    ("from", pair.from.as_str()),
                    ("to", pair.to.as_str()),
                ])
                .header("Ocp-Apim-Subscription-Key", api_key)
                .json(&body)
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

            let results: Vec<AzureResult> = response.json().await.map_err(|e| {
                ProviderError::InvalidResponse(format!("failed to parse JSON: {e}"))
            })?;

            results
                .into_iter()
                .next()
                .and_then(|r| r.translations.into_iter().next())
                .map(|t| t.text)
                .ok_or_else(|| {
                    ProviderError::InvalidResponse("no translations in response".to_string())
                })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let translator = AzureTranslator::new(None);
        let err = translator
            .translate("Hello!", &LanguagePair::new("en", "es"))
            .await
            .expect_err("no credentials");
        assert!(matches!(err, ProviderError::MissingCredentials("azure")));
    }

    #[test]
    fn request_body_is_a_segment_array() {
        let body = vec![AzureSegment {
            text: "Hello!".to_owned(),
        }];
        let value = serde_json::to_value(&body).expect("serializes");
        assert_eq!(value, serde_json::json!([{"Text": "Hello!"}]));
    }

    #[test]
    fn response_extracts_nested_translation() {
        let raw = r#"[{"translations":[{"text":"hola!","to":"es"}]}]"#;
        let results: Vec<AzureResult> = serde_json::from_str(raw).expect("parses");
        assert_eq!(results[0].translations[0].text, "hola!");
    }
}
