//! Common utility functions for valuation calculations.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary value to whole currency units using half-up rounding.
///
/// Values at exactly 0.5 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use trace_core::calculations::common::round_currency;
///
/// assert_eq!(round_currency(dec!(719999.4)), dec!(719999));
/// assert_eq!(round_currency(dec!(719999.5)), dec!(720000));
/// assert_eq!(round_currency(dec!(-2.5)), dec!(-3)); // Away from zero
/// ```
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}
