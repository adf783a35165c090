use crate::store::{StoreBackend, StoreError};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Store backend speaking the REST dialect of a hierarchical JSON tree:
/// every node is addressable as `{base}/{path}.json`, scalar values are
/// JSON-encoded strings, absent nodes read as `null`, and a table node can
/// be paged with `orderBy`/`limitToFirst`.
#[derive(Clone)]
pub struct RestStoreBackend {
    client: Client,
    base_url: Url,
}

impl RestStoreBackend {
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_owned()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)?;
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, base_url })
    }

    fn node_url(&self, path: &str) -> Result<Url, StoreError> {
        Ok(self.base_url.join(&format!("{path}.json"))?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(StoreError::HttpStatus(status.as_u16(), error_text));
    }
    Ok(response)
}

impl StoreBackend for RestStoreBackend {
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Option<String>, StoreError>> {
        async move {
            let url = self.node_url(path)?;
            let response = check_status(self.client.get(url).send().await?).await?;
            let value: Option<String> = response.json().await?;
            Ok(value)
        }
        .boxed()
    }

    fn put<'a>(&'a self, path: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            let url = self.node_url(path)?;
            let response = self.client.put(url).json(&value).send().await?;
            check_status(response).await?;
            Ok(())
        }
        .boxed()
    }

    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            let url = self.node_url(path)?;
            let response = self.client.delete(url).send().await?;
            check_status(response).await?;
            Ok(())
        }
        .boxed()
    }

    fn list<'a>(
        &'a self,
        path: &'a str,
        limit: usize,
    ) -> BoxFuture<'a, Result<BTreeMap<String, String>, StoreError>> {
        async move {
            let url = self.node_url(path)?;
            let response = self
                .client
                .get(url)
                .query(&[
                    ("orderBy", "\"$key\"".to_owned()),
                    ("limitToFirst", limit.to_string()),
                ])
                .send()
                .await?;
            let response = check_status(response).await?;
            let entries: Option<BTreeMap<String, String>> = response.json().await?;
            Ok(entries.unwrap_or_default())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_url_appends_json_suffix() {
        let backend =
            RestStoreBackend::new("https://store.example.com/root").expect("valid base url");
        let url = backend
            .node_url("development/translations/en-es/abc")
            .expect("joins");
        assert_eq!(
            url.as_str(),
            "https://store.example.com/root/development/translations/en-es/abc.json"
        );
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let a = RestStoreBackend::new("https://store.example.com/root/").expect("valid");
        let b = RestStoreBackend::new("https://store.example.com/root").expect("valid");
        assert_eq!(
            a.node_url("x").expect("joins").as_str(),
            b.node_url("x").expect("joins").as_str()
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(RestStoreBackend::new("not a url").is_err());
    }
}
