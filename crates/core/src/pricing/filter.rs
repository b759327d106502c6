use crate::config::Settings;
use crate::domain::product::ProfitabilityResult;
use crate::error::{ArbitrageError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_ROI: f64 = 30.0;
pub const DEFAULT_MAX_PRICE: f64 = 100.0;

/// Keep a result iff `roi_percentage >= min_roi` and `marketplace_price <= max_price`.
///
/// Degenerate values (negative `max_price`, `min_roi` below -100) are valid and simply
/// match nothing or everything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterThresholds {
    pub min_roi: f64,
    pub max_price: f64,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            min_roi: DEFAULT_MIN_ROI,
            max_price: DEFAULT_MAX_PRICE,
        }
    }
}

impl FilterThresholds {
    pub fn try_new(min_roi: f64, max_price: f64) -> Result<Self> {
        if min_roi.is_nan() || max_price.is_nan() {
            return Err(ArbitrageError::invalid(format!(
                "thresholds must be numbers (min_roi={min_roi}, max_price={max_price})"
            )));
        }
        Ok(Self { min_roi, max_price })
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            min_roi: settings.default_min_roi,
            max_price: settings.default_max_price,
        }
    }

    /// Fills whichever threshold the caller left out from `self`.
    pub fn with_overrides(&self, min_roi: Option<f64>, max_price: Option<f64>) -> Result<Self> {
        Self::try_new(
            min_roi.unwrap_or(self.min_roi),
            max_price.unwrap_or(self.max_price),
        )
    }

    pub fn matches(&self, result: &ProfitabilityResult) -> bool {
        result.roi_percentage() >= self.min_roi && result.marketplace_price() <= self.max_price
    }
}

/// Stable filter: kept items stay in input order, nothing is sorted or deduplicated.
pub fn filter_profitable<T, I>(items: I, thresholds: &FilterThresholds) -> Vec<T>
where
    T: AsRef<ProfitabilityResult>,
    I: IntoIterator<Item = T>,
{
    items
        .into_iter()
        .filter(|item| thresholds.matches(item.as_ref()))
        .collect()
}
