//! Records exchanged with the catalog and page-extraction collaborators, and their
//! validation into [`ProductCandidate`].

use crate::domain::product::{Dimensions, ProductCandidate, DEFAULT_WEIGHT_LBS};
use crate::error::{ArbitrageError, Result};
use serde::{Deserialize, Serialize};

/// One marketplace catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub marketplace_id: String,
    pub title: String,
    pub price: f64,
    pub detail_page_url: String,
}

/// Best-effort extraction of a source product page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceListing {
    pub title: String,
    pub source_price: f64,
    pub source_url: String,
    /// Set when the extractor already matched the listing to a marketplace offer.
    #[serde(default)]
    pub marketplace_price: Option<f64>,
    #[serde(default)]
    pub marketplace_url: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

/// The resale side of a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketplaceQuote {
    pub price: f64,
    pub url: String,
    pub marketplace_id: Option<String>,
}

impl From<CatalogRecord> for MarketplaceQuote {
    fn from(record: CatalogRecord) -> Self {
        Self {
            price: record.price,
            url: record.detail_page_url,
            marketplace_id: Some(record.marketplace_id),
        }
    }
}

impl CatalogRecord {
    pub fn validate(&self) -> Result<()> {
        ensure(
            !self.marketplace_id.trim().is_empty(),
            "catalog record marketplace_id must be non-empty",
        )?;
        ensure(
            !self.title.trim().is_empty(),
            "catalog record title must be non-empty",
        )?;
        ensure(
            self.price.is_finite() && self.price >= 0.0,
            format!("catalog record price must be >= 0 (got {})", self.price),
        )
    }
}

impl SourceListing {
    pub fn validate(&self) -> Result<()> {
        ensure(
            !self.title.trim().is_empty(),
            "listing title must be non-empty",
        )?;
        ensure(
            self.source_price.is_finite() && self.source_price >= 0.0,
            format!("listing source_price must be >= 0 (got {})", self.source_price),
        )?;
        if let Some(price) = self.marketplace_price {
            ensure(
                price.is_finite() && price >= 0.0,
                format!("listing marketplace_price must be >= 0 (got {price})"),
            )?;
        }
        if let Some(weight) = self.weight {
            ensure(
                weight.is_finite() && weight > 0.0,
                format!("listing weight must be > 0 (got {weight})"),
            )?;
        }
        Ok(())
    }

    /// The extractor's own marketplace match, if it found one.
    pub fn own_quote(&self) -> Option<MarketplaceQuote> {
        self.marketplace_price.map(|price| MarketplaceQuote {
            price,
            url: self.marketplace_url.clone().unwrap_or_default(),
            marketplace_id: None,
        })
    }

    pub fn validate_and_into_candidate(self, quote: MarketplaceQuote) -> Result<ProductCandidate> {
        self.validate()?;

        Ok(ProductCandidate {
            title: self.title.trim().to_string(),
            source_price: self.source_price,
            marketplace_price: quote.price,
            source_url: self.source_url,
            marketplace_url: quote.url,
            marketplace_id: quote.marketplace_id,
            weight: self.weight.unwrap_or(DEFAULT_WEIGHT_LBS),
            dimensions: self.dimensions,
        })
    }
}

fn ensure(cond: bool, detail: impl Into<String>) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(ArbitrageError::invalid(detail))
    }
}
