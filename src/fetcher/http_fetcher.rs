use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use reqwest::Client;
use url::Url;

use crate::app::{FreshetError, Result};
use crate::config::FetcherConfig;
use crate::fetcher::{FetchStream, Fetcher};
use crate::normalizer::Normalizer;

pub struct HttpFetcher {
    client: Client,
    normalizer: Normalizer,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            normalizer: Normalizer::new(),
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchStream> {
        let parsed = Url::parse(url).map_err(|e| FreshetError::transient(url, e))?;
        tracing::debug!("GET {}", parsed);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FreshetError::transient(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FreshetError::transient(url, format!("HTTP status {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FreshetError::transient(url, e))?;

        let records = self.normalizer.normalize(url, &body)?;
        Ok(Box::pin(stream::iter(records.into_iter().map(Ok))))
    }
}
