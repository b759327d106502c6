use crate::domain::product::{Dimensions, ProductCandidate, ProfitabilityResult};
use crate::error::{ArbitrageError, Result};
use crate::pricing::clock::{Clock, SystemClock};
use crate::pricing::fees::{FeeSchedule, WeightBasedFeeSchedule};

/// Turns a [`ProductCandidate`] into a [`ProfitabilityResult`].
///
/// Holds no mutable state, so one analyzer can be shared across tasks.
#[derive(Debug, Clone, Default)]
pub struct ProfitabilityAnalyzer<S = WeightBasedFeeSchedule, C = SystemClock> {
    schedule: S,
    clock: C,
}

impl<S: FeeSchedule> ProfitabilityAnalyzer<S, SystemClock> {
    pub fn new(schedule: S) -> Self {
        Self {
            schedule,
            clock: SystemClock,
        }
    }
}

impl<S: FeeSchedule, C: Clock> ProfitabilityAnalyzer<S, C> {
    pub fn with_clock(schedule: S, clock: C) -> Self {
        Self { schedule, clock }
    }

    pub fn analyze(&self, candidate: &ProductCandidate) -> Result<ProfitabilityResult> {
        validate_candidate(candidate)?;

        let dimensions = candidate.resolved_dimensions();
        let fee = self.schedule.estimate_fee(
            candidate.marketplace_price,
            candidate.weight,
            &dimensions,
        );
        if !fee.is_finite() || fee < 0.0 {
            return Err(ArbitrageError::invalid(format!(
                "fee schedule produced an invalid fee: {fee}"
            )));
        }

        let created_at = self.clock.now();
        ProfitabilityResult::compute(
            candidate.source_price,
            candidate.marketplace_price,
            fee,
            created_at,
        )
        .ok_or(ArbitrageError::DivisionUndefined)
    }
}

fn validate_candidate(c: &ProductCandidate) -> Result<()> {
    if c.title.trim().is_empty() {
        return Err(ArbitrageError::invalid("title must be non-empty"));
    }
    non_negative("source_price", c.source_price)?;
    non_negative("marketplace_price", c.marketplace_price)?;
    // Zero weight is allowed: the fee degrades to the base fee.
    non_negative("weight", c.weight)?;
    if let Some(Dimensions {
        length,
        width,
        height,
    }) = c.dimensions
    {
        non_negative("dimensions.length", length)?;
        non_negative("dimensions.width", width)?;
        non_negative("dimensions.height", height)?;
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ArbitrageError::invalid(format!(
            "{field} must be a finite number >= 0 (got {value})"
        )))
    }
}
