//! Step depreciation of device value.
//!
//! Devices lose a fixed share of their initial value for every completed
//! six-month period since acquisition:
//!
//! | Completed periods | Months since acquisition | Value kept |
//! |-------------------|--------------------------|------------|
//! | 0                 | 0 - <6                   | 100%       |
//! | 1                 | 6 - <12                  | 90%        |
//! | ...               | ...                      | ...        |
//! | 9                 | 54 - <60                 | 10%        |
//! | 10+               | 60+                      | 0%         |
//!
//! Months are derived from elapsed days using an average month length of
//! 30.44 days, so period boundaries do not fall on calendar month edges.
//!
//! This is a preview of the value the backend computes and stores. The
//! backend's figure always wins.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use trace_core::calculations::{DepreciationInput, DepreciationSchedule};
//!
//! let input = DepreciationInput {
//!     initial_value: dec!(800000),
//!     acquisition_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//! };
//! let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
//!
//! let result = DepreciationSchedule::default().calculate(&input, today).unwrap();
//!
//! assert_eq!(result.periods, 1);
//! assert_eq!(result.value, dec!(720000));
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::{max, round_currency};

/// Average number of days in a month used to turn elapsed days into months.
pub const AVERAGE_DAYS_PER_MONTH: Decimal = Decimal::from_parts(3044, 0, 0, false, 2);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DepreciationError {
    #[error("initial value cannot be negative: {0}")]
    NegativeInitialValue(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationInput {
    pub initial_value: Decimal,
    pub acquisition_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationResult {
    /// Completed depreciation periods, clamped at zero for future dates.
    pub periods: u32,

    /// Share of the initial value already lost, 0 to 100.
    pub depreciation_percent: u32,

    /// Estimated current value in whole currency units.
    pub value: Decimal,

    pub fully_depreciated: bool,
}

/// Parameters of the step function. [`Default`] gives the production
/// schedule: 10% every 6 months, worthless after 10 periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepreciationSchedule {
    pub period_months: u32,
    pub percent_per_period: u32,
    pub periods_to_zero: u32,
}

impl Default for DepreciationSchedule {
    fn default() -> Self {
        Self {
            period_months: 6,
            percent_per_period: 10,
            periods_to_zero: 10,
        }
    }
}

impl DepreciationSchedule {
    /// # Errors
    ///
    /// Returns [`DepreciationError::NegativeInitialValue`] for a negative
    /// initial value.
    pub fn calculate(
        &self,
        input: &DepreciationInput,
        today: NaiveDate,
    ) -> Result<DepreciationResult, DepreciationError> {
        if input.initial_value < Decimal::ZERO {
            return Err(DepreciationError::NegativeInitialValue(input.initial_value));
        }

        let periods = self.completed_periods(input.acquisition_date, today);

        if periods >= self.periods_to_zero {
            return Ok(DepreciationResult {
                periods,
                depreciation_percent: 100,
                value: Decimal::ZERO,
                fully_depreciated: true,
            });
        }

        let depreciation_percent = (periods * self.percent_per_period).min(100);
        let value = self.value_after(input.initial_value, depreciation_percent);

        Ok(DepreciationResult {
            periods,
            depreciation_percent,
            value,
            fully_depreciated: value == Decimal::ZERO,
        })
    }

    /// Number of whole periods between acquisition and `today`.
    pub fn completed_periods(
        &self,
        acquisition_date: NaiveDate,
        today: NaiveDate,
    ) -> u32 {
        let elapsed_days = Decimal::from((today - acquisition_date).num_days());
        let elapsed_months = max(elapsed_days, Decimal::ZERO) / AVERAGE_DAYS_PER_MONTH;
        (elapsed_months / Decimal::from(self.period_months))
            .floor()
            .to_u32()
            .unwrap_or(u32::MAX)
    }

    fn value_after(
        &self,
        initial_value: Decimal,
        depreciation_percent: u32,
    ) -> Decimal {
        let kept = Decimal::ONE - Decimal::from(depreciation_percent) / Decimal::ONE_HUNDRED;
        round_currency(initial_value * kept)
    }
}

/// Current value under the default schedule. Negative initial values are
/// treated as zero.
pub fn depreciated_value(
    initial_value: Decimal,
    acquisition_date: NaiveDate,
    today: NaiveDate,
) -> Decimal {
    let input = DepreciationInput {
        initial_value: max(initial_value, Decimal::ZERO),
        acquisition_date,
    };
    DepreciationSchedule::default()
        .calculate(&input, today)
        .map(|result| result.value)
        .unwrap_or(Decimal::ZERO)
}
