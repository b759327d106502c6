use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WEIGHT_LBS: f64 = 1.0;

/// Package size in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub const DEFAULT: Dimensions = Dimensions {
        length: 10.0,
        width: 10.0,
        height: 5.0,
    };
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A product under evaluation: where it can be bought, and where it would be resold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCandidate {
    pub title: String,
    pub source_price: f64,
    pub marketplace_price: f64,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub marketplace_url: String,
    #[serde(default)]
    pub marketplace_id: Option<String>,
    /// Shipping weight in pounds.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// `None` means "not known"; the analyzer substitutes [`Dimensions::DEFAULT`].
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT_LBS
}

impl ProductCandidate {
    pub fn new(title: impl Into<String>, source_price: f64, marketplace_price: f64) -> Self {
        Self {
            title: title.into(),
            source_price,
            marketplace_price,
            source_url: String::new(),
            marketplace_url: String::new(),
            marketplace_id: None,
            weight: DEFAULT_WEIGHT_LBS,
            dimensions: None,
        }
    }

    pub fn resolved_dimensions(&self) -> Dimensions {
        self.dimensions.unwrap_or_default()
    }
}

/// Fee-adjusted verdict for one evaluation of one candidate.
///
/// Only the analyzer builds these. The derived figures (`total_cost`, `profit`,
/// `roi_percentage`) are computed together from the same inputs and are read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitabilityResult {
    source_price: f64,
    marketplace_price: f64,
    fulfillment_fee: f64,
    total_cost: f64,
    profit: f64,
    roi_percentage: f64,
    created_at: DateTime<Utc>,
}

impl ProfitabilityResult {
    /// Returns `None` when `total_cost` is zero.
    pub(crate) fn compute(
        source_price: f64,
        marketplace_price: f64,
        fulfillment_fee: f64,
        created_at: DateTime<Utc>,
    ) -> Option<Self> {
        let total_cost = source_price + fulfillment_fee;
        if total_cost == 0.0 {
            return None;
        }
        let profit = marketplace_price - total_cost;
        let roi_percentage = profit / total_cost * 100.0;

        Some(Self {
            source_price,
            marketplace_price,
            fulfillment_fee,
            total_cost,
            profit,
            roi_percentage,
            created_at,
        })
    }

    pub fn source_price(&self) -> f64 {
        self.source_price
    }

    pub fn marketplace_price(&self) -> f64 {
        self.marketplace_price
    }

    pub fn fulfillment_fee(&self) -> f64 {
        self.fulfillment_fee
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn profit(&self) -> f64 {
        self.profit
    }

    pub fn roi_percentage(&self) -> f64 {
        self.roi_percentage
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl AsRef<ProfitabilityResult> for ProfitabilityResult {
    fn as_ref(&self) -> &ProfitabilityResult {
        self
    }
}

/// A candidate's descriptive fields next to its profitability, as served to API clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductReport {
    pub title: String,
    pub source_url: String,
    pub marketplace_url: String,
    pub marketplace_id: Option<String>,
    pub profitability: ProfitabilityResult,
}

impl ProductReport {
    pub fn new(candidate: ProductCandidate, profitability: ProfitabilityResult) -> Self {
        Self {
            title: candidate.title,
            source_url: candidate.source_url,
            marketplace_url: candidate.marketplace_url,
            marketplace_id: candidate.marketplace_id,
            profitability,
        }
    }
}

impl AsRef<ProfitabilityResult> for ProductReport {
    fn as_ref(&self) -> &ProfitabilityResult {
        &self.profitability
    }
}
