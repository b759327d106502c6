//! Fee estimation, profitability analysis and threshold filtering.
//!
//! Everything here is synchronous and free of I/O. The analyzer only reads its clock.

pub mod analyzer;
pub mod clock;
pub mod fees;
pub mod filter;

pub use analyzer::ProfitabilityAnalyzer;
pub use clock::{Clock, FixedClock, SystemClock};
pub use fees::{FeeSchedule, WeightBasedFeeSchedule};
pub use filter::{filter_profitable, FilterThresholds};
