//! Glue between the collaborators and the pricing core.

use crate::config::Settings;
use crate::domain::contract::{MarketplaceQuote, SourceListing};
use crate::domain::product::{ProductCandidate, ProductReport};
use crate::error::{ArbitrageError, Result};
use crate::ingest::{
    CatalogClient, HttpCatalogClient, HttpPageExtractor, PageFetcher, PlaceholderPageFetcher,
};
use crate::pricing::{
    filter_profitable, Clock, FeeSchedule, FilterThresholds, ProfitabilityAnalyzer, SystemClock,
    WeightBasedFeeSchedule,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One source page to evaluate, plus how to find its marketplace price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
    #[serde(default)]
    pub marketplace_id: Option<String>,
    /// Skips the catalog lookup for the price when set.
    #[serde(default)]
    pub marketplace_price: Option<f64>,
}

impl AnalyzeRequest {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            marketplace_id: None,
            marketplace_price: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanFailure {
    /// Source URL, or the title of a manually entered candidate.
    pub source: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanOutcome {
    pub evaluated: usize,
    /// Reports that cleared the thresholds, in request order.
    pub profitable: Vec<ProductReport>,
    pub failures: Vec<ScanFailure>,
}

/// Fetches listings, resolves marketplace prices and runs the analyzer.
///
/// The page fetcher and the catalog client are independent handles; dropping the scanner
/// drops each of them on its own.
pub struct ArbitrageScanner<S = WeightBasedFeeSchedule, C = SystemClock> {
    pages: Arc<dyn PageFetcher>,
    catalog: Option<Arc<dyn CatalogClient>>,
    analyzer: ProfitabilityAnalyzer<S, C>,
}

impl ArbitrageScanner {
    /// Uses the HTTP collaborators that are configured and the placeholder fetcher
    /// otherwise. Without a catalog, `marketplace_id` lookups fail with `InvalidInput`.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let pages: Arc<dyn PageFetcher> = if settings.page_extractor_base_url.is_some() {
            Arc::new(HttpPageExtractor::from_settings(settings)?)
        } else {
            tracing::warn!("PAGE_EXTRACTOR_BASE_URL missing; using placeholder listings");
            Arc::new(PlaceholderPageFetcher)
        };

        let catalog: Option<Arc<dyn CatalogClient>> = if settings.catalog_base_url.is_some() {
            Some(Arc::new(HttpCatalogClient::from_settings(settings)?))
        } else {
            tracing::warn!("CATALOG_BASE_URL missing; marketplace_id lookups are disabled");
            None
        };

        let analyzer = ProfitabilityAnalyzer::new(WeightBasedFeeSchedule::from_settings(settings));
        Ok(Self::new(pages, catalog, analyzer))
    }
}

impl<S: FeeSchedule, C: Clock> ArbitrageScanner<S, C> {
    pub fn new(
        pages: Arc<dyn PageFetcher>,
        catalog: Option<Arc<dyn CatalogClient>>,
        analyzer: ProfitabilityAnalyzer<S, C>,
    ) -> Self {
        Self {
            pages,
            catalog,
            analyzer,
        }
    }

    pub fn page_fetcher_name(&self) -> &'static str {
        self.pages.fetcher_name()
    }

    pub fn catalog_name(&self) -> Option<&'static str> {
        self.catalog.as_ref().map(|c| c.catalog_name())
    }

    /// Analyzes a manually entered candidate.
    pub fn analyze_candidate(&self, candidate: ProductCandidate) -> Result<ProductReport> {
        let result = self.analyzer.analyze(&candidate)?;
        Ok(ProductReport::new(candidate, result))
    }

    pub async fn analyze_url(&self, req: &AnalyzeRequest) -> Result<ProductReport> {
        let listing = self.pages.fetch_listing(&req.url).await?;
        let quote = self.resolve_quote(&listing, req).await?;
        let candidate = listing.validate_and_into_candidate(quote)?;
        self.analyze_candidate(candidate)
    }

    /// Explicit price, then the catalog record, then the extractor's own match.
    async fn resolve_quote(
        &self,
        listing: &SourceListing,
        req: &AnalyzeRequest,
    ) -> Result<MarketplaceQuote> {
        if let Some(price) = req.marketplace_price {
            return Ok(MarketplaceQuote {
                price,
                url: listing.marketplace_url.clone().unwrap_or_default(),
                marketplace_id: req.marketplace_id.clone(),
            });
        }

        if let Some(id) = req.marketplace_id.as_deref() {
            let catalog = self.catalog.as_ref().ok_or_else(|| {
                ArbitrageError::invalid("marketplace_id given but no catalog client is configured")
            })?;
            let record = catalog
                .fetch_product(id)
                .await?
                .ok_or_else(|| ArbitrageError::NotFound(format!("catalog item {id}")))?;
            return Ok(record.into());
        }

        listing.own_quote().ok_or_else(|| {
            ArbitrageError::invalid(format!(
                "no marketplace price for {}: pass marketplace_id or marketplace_price",
                req.url
            ))
        })
    }

    /// Evaluates every request in order, skipping the ones that fail, then filters.
    pub async fn scan(
        &self,
        requests: &[AnalyzeRequest],
        thresholds: &FilterThresholds,
    ) -> ScanOutcome {
        let mut reports = Vec::with_capacity(requests.len());
        let mut failures = Vec::new();

        for req in requests {
            match self.analyze_url(req).await {
                Ok(report) => reports.push(report),
                Err(err) => {
                    tracing::warn!(url = %req.url, error = %err, "skipping product");
                    failures.push(ScanFailure {
                        source: req.url.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        finish(requests.len(), reports, failures, thresholds)
    }

    /// Same as [`Self::scan`] for candidates that need no fetching.
    pub fn scan_candidates(
        &self,
        candidates: Vec<ProductCandidate>,
        thresholds: &FilterThresholds,
    ) -> ScanOutcome {
        let requested = candidates.len();
        let mut reports = Vec::with_capacity(requested);
        let mut failures = Vec::new();

        for candidate in candidates {
            let title = candidate.title.clone();
            match self.analyze_candidate(candidate) {
                Ok(report) => reports.push(report),
                Err(err) => {
                    tracing::warn!(%title, error = %err, "skipping candidate");
                    failures.push(ScanFailure {
                        source: title,
                        error: err.to_string(),
                    });
                }
            }
        }

        finish(requested, reports, failures, thresholds)
    }
}

fn finish(
    requested: usize,
    reports: Vec<ProductReport>,
    failures: Vec<ScanFailure>,
    thresholds: &FilterThresholds,
) -> ScanOutcome {
    let evaluated = reports.len();
    let profitable = filter_profitable(reports, thresholds);
    tracing::info!(
        requested,
        evaluated,
        profitable = profitable.len(),
        failed = failures.len(),
        "scan finished"
    );

    ScanOutcome {
        evaluated,
        profitable,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::CatalogRecord;
    use crate::ingest::PlaceholderPageFetcher;
    use crate::pricing::FixedClock;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    struct FakeCatalog {
        items: HashMap<String, CatalogRecord>,
        down: bool,
    }

    impl FakeCatalog {
        fn with(items: &[(&str, f64)]) -> Self {
            let items = items
                .iter()
                .map(|(id, price)| {
                    (
                        id.to_string(),
                        CatalogRecord {
                            marketplace_id: id.to_string(),
                            title: format!("Item {id}"),
                            price: *price,
                            detail_page_url: format!("https://market.example/dp/{id}"),
                        },
                    )
                })
                .collect();
            Self { items, down: false }
        }
    }

    #[async_trait::async_trait]
    impl CatalogClient for FakeCatalog {
        fn catalog_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_product(&self, marketplace_id: &str) -> Result<Option<CatalogRecord>> {
            if self.down {
                return Err(ArbitrageError::CollaboratorUnavailable {
                    collaborator: "catalog",
                    detail: "503".to_string(),
                });
            }
            Ok(self.items.get(marketplace_id).cloned())
        }
    }

    /// Serves listings keyed by URL; unknown URLs fail like an unreachable extractor.
    struct FakePages(HashMap<String, SourceListing>);

    impl FakePages {
        fn with(listings: &[(&str, f64, Option<f64>)]) -> Self {
            let map = listings
                .iter()
                .map(|(url, source_price, marketplace_price)| {
                    (
                        url.to_string(),
                        SourceListing {
                            title: format!("Listing at {url}"),
                            source_price: *source_price,
                            source_url: url.to_string(),
                            marketplace_price: *marketplace_price,
                            marketplace_url: None,
                            weight: Some(2.0),
                            dimensions: None,
                        },
                    )
                })
                .collect();
            Self(map)
        }
    }

    #[async_trait::async_trait]
    impl PageFetcher for FakePages {
        fn fetcher_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_listing(&self, url: &str) -> Result<SourceListing> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| ArbitrageError::CollaboratorUnavailable {
                    collaborator: "page_extractor",
                    detail: format!("cannot reach {url}"),
                })
        }
    }

    fn scanner(
        pages: impl PageFetcher + 'static,
        catalog: Option<FakeCatalog>,
    ) -> ArbitrageScanner<WeightBasedFeeSchedule, FixedClock> {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap());
        ArbitrageScanner::new(
            Arc::new(pages),
            catalog.map(|c| Arc::new(c) as Arc<dyn CatalogClient>),
            ProfitabilityAnalyzer::with_clock(WeightBasedFeeSchedule::default(), clock),
        )
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn scanner_is_shareable_across_tasks() {
        assert_send_sync::<ArbitrageScanner>();
        assert_send_sync::<ArbitrageScanner<WeightBasedFeeSchedule, FixedClock>>();
    }

    #[tokio::test]
    async fn catalog_price_drives_the_analysis() {
        let s = scanner(
            FakePages::with(&[("https://shop.example/a", 10.0, None)]),
            Some(FakeCatalog::with(&[("B0001", 30.0)])),
        );
        let req = AnalyzeRequest {
            marketplace_id: Some("B0001".to_string()),
            ..AnalyzeRequest::for_url("https://shop.example/a")
        };

        let report = s.analyze_url(&req).await.unwrap();

        assert_eq!(report.marketplace_id.as_deref(), Some("B0001"));
        assert_eq!(report.marketplace_url, "https://market.example/dp/B0001");
        assert_eq!(report.profitability.marketplace_price(), 30.0);
        assert!((report.profitability.roi_percentage() - 127.1).abs() < 0.01);
    }

    #[tokio::test]
    async fn explicit_price_wins_over_catalog_and_listing() {
        let s = scanner(
            FakePages::with(&[("https://shop.example/a", 10.0, Some(50.0))]),
            Some(FakeCatalog::with(&[("B0001", 30.0)])),
        );
        let req = AnalyzeRequest {
            url: "https://shop.example/a".to_string(),
            marketplace_id: Some("B0001".to_string()),
            marketplace_price: Some(20.0),
        };

        let report = s.analyze_url(&req).await.unwrap();
        assert_eq!(report.profitability.marketplace_price(), 20.0);
    }

    #[tokio::test]
    async fn falls_back_to_the_listing_match() {
        let s = scanner(
            FakePages::with(&[("https://shop.example/a", 10.0, Some(50.0))]),
            None,
        );
        let report = s
            .analyze_url(&AnalyzeRequest::for_url("https://shop.example/a"))
            .await
            .unwrap();
        assert_eq!(report.profitability.marketplace_price(), 50.0);
    }

    #[tokio::test]
    async fn unknown_catalog_item_is_not_found() {
        let s = scanner(
            FakePages::with(&[("https://shop.example/a", 10.0, None)]),
            Some(FakeCatalog::with(&[])),
        );
        let req = AnalyzeRequest {
            marketplace_id: Some("B0404".to_string()),
            ..AnalyzeRequest::for_url("https://shop.example/a")
        };

        let err = s.analyze_url(&req).await.unwrap_err();
        assert!(matches!(err, ArbitrageError::NotFound(_)));
    }

    #[tokio::test]
    async fn catalog_outage_propagates() {
        let mut catalog = FakeCatalog::with(&[("B0001", 30.0)]);
        catalog.down = true;
        let s = scanner(
            FakePages::with(&[("https://shop.example/a", 10.0, None)]),
            Some(catalog),
        );
        let req = AnalyzeRequest {
            marketplace_id: Some("B0001".to_string()),
            ..AnalyzeRequest::for_url("https://shop.example/a")
        };

        let err = s.analyze_url(&req).await.unwrap_err();
        assert!(matches!(err, ArbitrageError::CollaboratorUnavailable { .. }));
    }

    #[tokio::test]
    async fn placeholder_without_any_price_is_rejected() {
        let s = scanner(PlaceholderPageFetcher, None);
        let err = s
            .analyze_url(&AnalyzeRequest::for_url("https://shop.example/a"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArbitrageError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn scan_skips_failures_and_keeps_order() {
        let s = scanner(
            FakePages::with(&[
                ("https://shop.example/a", 10.0, Some(30.0)),
                ("https://shop.example/b", 40.0, Some(45.0)),
                ("https://shop.example/c", 20.0, Some(60.0)),
                ("https://shop.example/d", 30.0, Some(180.0)),
            ]),
            None,
        );
        let requests: Vec<_> = [
            "https://shop.example/c",
            "https://shop.example/missing",
            "https://shop.example/b",
            "https://shop.example/a",
            "https://shop.example/d",
        ]
        .into_iter()
        .map(AnalyzeRequest::for_url)
        .collect();

        let out = s.scan(&requests, &FilterThresholds::default()).await;

        assert_eq!(out.evaluated, 4);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].source, "https://shop.example/missing");
        let urls: Vec<_> = out.profitable.iter().map(|r| r.source_url.as_str()).collect();
        assert_eq!(urls, vec!["https://shop.example/c", "https://shop.example/a"]);
    }

    #[test]
    fn candidate_scan_reports_zero_cost_items_as_failures() {
        let free = |_price: f64, _weight: f64, _d: &crate::domain::product::Dimensions| 0.0;
        let s = ArbitrageScanner::new(
            Arc::new(PlaceholderPageFetcher),
            None,
            ProfitabilityAnalyzer::with_clock(
                free,
                FixedClock(Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()),
            ),
        );
        let candidates = vec![
            ProductCandidate::new("Giveaway", 0.0, 10.0),
            ProductCandidate::new("Mug", 5.0, 9.0),
            ProductCandidate::new("Lamp", 50.0, 55.0),
        ];

        let out = s.scan_candidates(candidates, &FilterThresholds::default());

        assert_eq!(out.evaluated, 2);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].source, "Giveaway");
        assert!(out.failures[0].error.contains("undefined"));
        assert_eq!(out.profitable.len(), 1);
        assert_eq!(out.profitable[0].title, "Mug");
    }
}
