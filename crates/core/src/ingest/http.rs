use crate::config::HttpTuning;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// JSON-over-HTTP plumbing shared by the catalog client and the page extractor.
#[derive(Debug, Clone)]
pub(crate) struct JsonHttp {
    name: &'static str,
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    retries: u32,
}

/// A failed attempt, and whether trying again could change the answer.
#[derive(Debug)]
struct AttemptError {
    retryable: bool,
    err: anyhow::Error,
}

impl AttemptError {
    fn transient(err: anyhow::Error) -> Self {
        Self {
            retryable: true,
            err,
        }
    }

    fn permanent(err: anyhow::Error) -> Self {
        Self {
            retryable: false,
            err,
        }
    }
}

/// Server-side failures and throttling may clear up; other statuses will not.
fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

impl JsonHttp {
    pub(crate) fn new(
        name: &'static str,
        base_url: &str,
        api_key: Option<String>,
        tuning: HttpTuning,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(tuning.timeout_secs))
            .build()
            .with_context(|| format!("failed to build {name} http client"))?;

        let base_url = Url::parse(base_url)
            .with_context(|| format!("{name} base url is not a valid URL: {base_url}"))?;

        Ok(Self {
            name,
            http,
            base_url,
            api_key,
            retries: tuning.retries.max(1),
        })
    }

    /// `base_url` with `segments` appended, each percent-encoded.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("{} base url cannot be a base: {}", self.name, self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, AttemptError> {
        let headers = self.headers().map_err(AttemptError::permanent)?;
        let res = self
            .http
            .get(url.clone())
            .headers(headers)
            .query(query)
            .send()
            .await
            .with_context(|| format!("{} request failed", self.name))
            .map_err(AttemptError::transient)?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read {} response", self.name))
            .map_err(AttemptError::transient)?;
        if !status.is_success() {
            let err = anyhow::anyhow!("{} HTTP {status}: {text}", self.name);
            return Err(if is_retryable_status(status) {
                AttemptError::transient(err)
            } else {
                AttemptError::permanent(err)
            });
        }

        let parsed = serde_json::from_str::<T>(&text)
            .with_context(|| format!("{} response has an unexpected shape: {text}", self.name))
            .map_err(AttemptError::permanent)?;
        Ok(Some(parsed))
    }

    /// GET with exponential backoff on transport errors, 5xx and 429. A 404 is an
    /// answer (`None`); other 4xx and unparseable bodies fail on the first attempt.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.get_once(&url, query).await {
                Ok(parsed) => return Ok(parsed),
                Err(AttemptError { retryable, err }) => {
                    if !retryable || attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1).min(5));
                    tracing::warn!(
                        collaborator = self.name,
                        attempt,
                        ?backoff,
                        error = %err,
                        "fetch failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
