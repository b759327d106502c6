use crate::config::Settings;
use crate::domain::contract::CatalogRecord;
use crate::error::{ArbitrageError, Result};
use crate::ingest::http::JsonHttp;

const COLLABORATOR: &str = "catalog";

/// Looks up marketplace listings by catalog identifier.
///
/// `Ok(None)` means the catalog answered and has no such item. Transport failures and
/// malformed upstream records both come back as
/// [`ArbitrageError::CollaboratorUnavailable`]: the caller's input was fine, the catalog
/// could not produce a usable answer. `InvalidInput` is reserved for the caller's own
/// arguments.
#[async_trait::async_trait]
pub trait CatalogClient: Send + Sync {
    fn catalog_name(&self) -> &'static str;

    async fn fetch_product(&self, marketplace_id: &str) -> Result<Option<CatalogRecord>>;
}

/// Client for a JSON catalog gateway: `GET {CATALOG_BASE_URL}/v1/items/{id}`.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    inner: JsonHttp,
}

impl HttpCatalogClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.require_catalog_base_url()?;
        let inner = JsonHttp::new(
            COLLABORATOR,
            base_url,
            settings.catalog_api_key.clone(),
            settings.catalog_http,
        )?;
        Ok(Self { inner })
    }
}

/// Upstream record checks, reported against the catalog rather than the caller.
fn checked_record(record: CatalogRecord, requested_id: &str) -> Result<CatalogRecord> {
    let check = || -> anyhow::Result<()> {
        record.validate()?;
        anyhow::ensure!(
            record.marketplace_id == requested_id,
            "catalog id mismatch: expected {requested_id}, got {}",
            record.marketplace_id
        );
        Ok(())
    };
    check().map_err(|err| ArbitrageError::unavailable(COLLABORATOR, &err))?;
    Ok(record)
}

#[async_trait::async_trait]
impl CatalogClient for HttpCatalogClient {
    fn catalog_name(&self) -> &'static str {
        "http_json_catalog"
    }

    async fn fetch_product(&self, marketplace_id: &str) -> Result<Option<CatalogRecord>> {
        let marketplace_id = marketplace_id.trim();
        if marketplace_id.is_empty() {
            return Err(ArbitrageError::invalid("marketplace_id must be non-empty"));
        }

        let url = self
            .inner
            .url(&["v1", "items", marketplace_id])
            .map_err(|err| ArbitrageError::unavailable(COLLABORATOR, &err))?;
        let record = self
            .inner
            .get_json::<CatalogRecord>(url, &[])
            .await
            .map_err(|err| ArbitrageError::unavailable(COLLABORATOR, &err))?;

        record
            .map(|r| checked_record(r, marketplace_id))
            .transpose()
    }
}
