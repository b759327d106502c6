use crate::config::Settings;
use crate::domain::product::Dimensions;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_FULFILLMENT_FEE: f64 = 2.41;
pub const DEFAULT_PER_POUND_RATE: f64 = 0.40;

/// Estimates the fulfillment fee for one unit.
///
/// `price` and `dimensions` are part of the signature so category and size-tier
/// schedules can be plugged in without touching callers.
pub trait FeeSchedule: Send + Sync {
    fn estimate_fee(&self, price: f64, weight: f64, dimensions: &Dimensions) -> f64;
}

impl<F> FeeSchedule for F
where
    F: Fn(f64, f64, &Dimensions) -> f64 + Send + Sync,
{
    fn estimate_fee(&self, price: f64, weight: f64, dimensions: &Dimensions) -> f64 {
        self(price, weight, dimensions)
    }
}

/// Flat base fee plus a per-pound charge. Ignores price and dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBasedFeeSchedule {
    pub base_fulfillment_fee: f64,
    pub per_pound_rate: f64,
}

impl Default for WeightBasedFeeSchedule {
    fn default() -> Self {
        Self {
            base_fulfillment_fee: DEFAULT_BASE_FULFILLMENT_FEE,
            per_pound_rate: DEFAULT_PER_POUND_RATE,
        }
    }
}

impl WeightBasedFeeSchedule {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base_fulfillment_fee: settings.base_fulfillment_fee,
            per_pound_rate: settings.per_pound_rate,
        }
    }
}

impl FeeSchedule for WeightBasedFeeSchedule {
    fn estimate_fee(&self, _price: f64, weight: f64, _dimensions: &Dimensions) -> f64 {
        self.base_fulfillment_fee + weight * self.per_pound_rate
    }
}
