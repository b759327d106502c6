use crate::config::Settings;
use crate::domain::contract::SourceListing;
use crate::error::{ArbitrageError, Result};
use crate::ingest::http::JsonHttp;
use reqwest::Url;

const COLLABORATOR: &str = "page_extractor";

/// Produces a best-effort [`SourceListing`] for a source product page.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    fn fetcher_name(&self) -> &'static str;

    async fn fetch_listing(&self, url: &str) -> Result<SourceListing>;
}

/// Only absolute http(s) URLs are worth sending anywhere.
pub fn parse_source_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ArbitrageError::invalid(format!("source url {raw:?} is not a URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ArbitrageError::invalid(format!(
            "source url must be http(s), got scheme {other:?}"
        ))),
    }
}

/// Delegates extraction to an external service:
/// `GET {PAGE_EXTRACTOR_BASE_URL}/v1/extract?url=...`.
#[derive(Debug, Clone)]
pub struct HttpPageExtractor {
    inner: JsonHttp,
}

impl HttpPageExtractor {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.require_page_extractor_base_url()?;
        let inner = JsonHttp::new(
            COLLABORATOR,
            base_url,
            settings.page_extractor_api_key.clone(),
            settings.page_extractor_http,
        )?;
        Ok(Self { inner })
    }

    async fn extract(&self, source_url: &Url) -> anyhow::Result<SourceListing> {
        let url = self.inner.url(&["v1", "extract"])?;
        self.inner
            .get_json::<SourceListing>(url, &[("url", source_url.as_str())])
            .await?
            .ok_or_else(|| anyhow::anyhow!("extractor has no listing for {source_url}"))
    }
}

/// A listing the extractor could not fill in properly is the extractor's failure, not the
/// caller's, so it is reported as `CollaboratorUnavailable`.
fn checked_listing(mut listing: SourceListing, source_url: &Url) -> Result<SourceListing> {
    if listing.source_url.trim().is_empty() {
        listing.source_url = source_url.to_string();
    }
    listing
        .validate()
        .map_err(|err| ArbitrageError::unavailable(COLLABORATOR, &anyhow::Error::new(err)))?;
    Ok(listing)
}

#[async_trait::async_trait]
impl PageFetcher for HttpPageExtractor {
    fn fetcher_name(&self) -> &'static str {
        "http_page_extractor"
    }

    async fn fetch_listing(&self, url: &str) -> Result<SourceListing> {
        let source_url = parse_source_url(url)?;
        let listing = self
            .extract(&source_url)
            .await
            .map_err(|err| ArbitrageError::unavailable(COLLABORATOR, &err))?;
        checked_listing(listing, &source_url)
    }
}

/// Returns the same sample listing for any URL. Stands in until a real extractor is
/// configured.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderPageFetcher;

pub const PLACEHOLDER_TITLE: &str = "Sample Product";
pub const PLACEHOLDER_SOURCE_PRICE: f64 = 19.99;

#[async_trait::async_trait]
impl PageFetcher for PlaceholderPageFetcher {
    fn fetcher_name(&self) -> &'static str {
        "placeholder"
    }

    async fn fetch_listing(&self, url: &str) -> Result<SourceListing> {
        let source_url = parse_source_url(url)?;
        Ok(SourceListing {
            title: PLACEHOLDER_TITLE.to_string(),
            source_price: PLACEHOLDER_SOURCE_PRICE,
            source_url: source_url.to_string(),
            marketplace_price: None,
            marketplace_url: None,
            weight: Some(1.0),
            dimensions: None,
        })
    }
}
