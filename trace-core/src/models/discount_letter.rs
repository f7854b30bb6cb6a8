use chrono::{Month, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::round_currency;
use crate::calculations::depreciation::depreciated_value;

use super::Device;

pub const DEFAULT_INSTALLMENTS: u32 = 4;
pub const MAX_INSTALLMENTS: u32 = 24;

/// Legal entity that issues the payroll deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompanyKey {
    #[default]
    PompeyoCarrasco,
    PompeyoAutomoviles,
}

impl CompanyKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PompeyoCarrasco => "pompeyo_carrasco",
            Self::PompeyoAutomoviles => "pompeyo_automoviles",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pompeyo_carrasco" => Some(Self::PompeyoCarrasco),
            "pompeyo_automoviles" => Some(Self::PompeyoAutomoviles),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PompeyoCarrasco => "Pompeyo Carrasco SPA",
            Self::PompeyoAutomoviles => "Pompeyo Carrasco Automóviles SPA",
        }
    }

    pub fn rut(&self) -> &'static str {
        match self {
            Self::PompeyoCarrasco => "81.318.700-0",
            Self::PompeyoAutomoviles => "85.164.100-9",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscountLetterError {
    #[error("total amount must be greater than zero")]
    NonPositiveAmount,

    #[error("installments must be between 1 and {MAX_INSTALLMENTS}, got {0}")]
    InstallmentsOutOfRange(u32),

    #[error("first installment month is required")]
    MissingFirstMonth,

    #[error("unrecognised month '{0}'")]
    InvalidMonth(String),
}

/// Parameters of a loss/theft discount letter. Only constructible through
/// [`DiscountLetterParams::new`], so every instance is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountLetterParams {
    company: CompanyKey,
    total_amount: Decimal,
    installments: u32,
    first_installment_month: Month,
}

impl DiscountLetterParams {
    /// # Errors
    ///
    /// * [`DiscountLetterError::NonPositiveAmount`] when the rounded total is not above zero
    /// * [`DiscountLetterError::InstallmentsOutOfRange`] outside `1..=24`
    pub fn new(
        company: CompanyKey,
        total_amount: Decimal,
        installments: u32,
        first_installment_month: Month,
    ) -> Result<Self, DiscountLetterError> {
        let total_amount = round_currency(total_amount);
        if total_amount <= Decimal::ZERO {
            return Err(DiscountLetterError::NonPositiveAmount);
        }
        if !(1..=MAX_INSTALLMENTS).contains(&installments) {
            return Err(DiscountLetterError::InstallmentsOutOfRange(installments));
        }
        Ok(Self {
            company,
            total_amount,
            installments,
            first_installment_month,
        })
    }

    pub fn company(&self) -> CompanyKey {
        self.company
    }

    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    pub fn installments(&self) -> u32 {
        self.installments
    }

    pub fn first_installment_month(&self) -> Month {
        self.first_installment_month
    }

    /// Amount of each payroll deduction, rounded to whole units.
    pub fn installment_amount(&self) -> Decimal {
        round_currency(self.total_amount / Decimal::from(self.installments))
    }
}

/// Pre-filled total for a letter: the stored current value, then the
/// locally computed depreciation value, then zero.
pub fn suggested_total(
    device: &Device,
    today: NaiveDate,
) -> Decimal {
    if let Some(value) = device.current_value {
        return round_currency(value);
    }
    device
        .initial_value
        .filter(|_| device.kind.depreciates())
        .map(|initial| depreciated_value(initial, device.acquisition_date, today))
        .unwrap_or(Decimal::ZERO)
}

const SPANISH_MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Month name as the backend expects it.
pub fn spanish_month_name(month: Month) -> &'static str {
    SPANISH_MONTHS[month.number_from_month() as usize - 1]
}

/// Accepts a month number (`1`-`12`), a Spanish month name, or an English
/// month name, case-insensitively.
pub fn parse_month(input: &str) -> Result<Month, DiscountLetterError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DiscountLetterError::MissingFirstMonth);
    }
    if let Ok(n) = trimmed.parse::<u8>() {
        return Month::try_from(n).map_err(|_| DiscountLetterError::InvalidMonth(trimmed.to_string()));
    }
    if let Some(idx) = SPANISH_MONTHS
        .iter()
        .position(|name| name.eq_ignore_ascii_case(trimmed))
    {
        return Month::try_from(idx as u8 + 1)
            .map_err(|_| DiscountLetterError::InvalidMonth(trimmed.to_string()));
    }
    trimmed
        .parse::<Month>()
        .map_err(|_| DiscountLetterError::InvalidMonth(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::DeviceStatus;
    use crate::models::device::fixtures::laptop;

    #[test]
    fn installment_amount_rounds_to_whole_units() {
        let params =
            DiscountLetterParams::new(CompanyKey::default(), dec!(100000), 3, Month::March).unwrap();

        assert_eq!(params.installment_amount(), dec!(33333));
    }

    #[test]
    fn installment_amount_rounds_half_up() {
        let params =
            DiscountLetterParams::new(CompanyKey::default(), dec!(10), 4, Month::March).unwrap();

        assert_eq!(params.installment_amount(), dec!(3));
    }

    #[test]
    fn zero_total_is_rejected() {
        assert_eq!(
            DiscountLetterParams::new(CompanyKey::default(), dec!(0), 4, Month::May),
            Err(DiscountLetterError::NonPositiveAmount)
        );
    }

    #[test]
    fn total_below_half_unit_rounds_to_zero_and_is_rejected() {
        assert_eq!(
            DiscountLetterParams::new(CompanyKey::default(), dec!(0.4), 1, Month::May),
            Err(DiscountLetterError::NonPositiveAmount)
        );
    }

    #[test]
    fn installments_must_be_between_one_and_twenty_four() {
        for bad in [0, 25, 100] {
            assert_eq!(
                DiscountLetterParams::new(CompanyKey::default(), dec!(1000), bad, Month::May),
                Err(DiscountLetterError::InstallmentsOutOfRange(bad))
            );
        }
        assert!(DiscountLetterParams::new(CompanyKey::default(), dec!(1000), 1, Month::May).is_ok());
        assert!(DiscountLetterParams::new(CompanyKey::default(), dec!(1000), 24, Month::May).is_ok());
    }

    #[test]
    fn parse_month_accepts_numbers_and_names() {
        assert_eq!(parse_month("3"), Ok(Month::March));
        assert_eq!(parse_month("marzo"), Ok(Month::March));
        assert_eq!(parse_month("Septiembre"), Ok(Month::September));
        assert_eq!(parse_month("december"), Ok(Month::December));
    }

    #[test]
    fn parse_month_rejects_blank_and_garbage() {
        assert_eq!(parse_month("  "), Err(DiscountLetterError::MissingFirstMonth));
        assert_eq!(parse_month("13"), Err(DiscountLetterError::InvalidMonth("13".to_string())));
        assert!(matches!(parse_month("Brumaire"), Err(DiscountLetterError::InvalidMonth(_))));
    }

    #[test]
    fn spanish_month_names_follow_calendar_order() {
        assert_eq!(spanish_month_name(Month::January), "Enero");
        assert_eq!(spanish_month_name(Month::December), "Diciembre");
    }

    #[test]
    fn suggested_total_prefers_stored_value() {
        let mut device = laptop(DeviceStatus::Assigned);
        device.current_value = Some(dec!(450000));

        let today = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        assert_eq!(suggested_total(&device, today), dec!(450000));
    }

    #[test]
    fn suggested_total_falls_back_to_computed_depreciation() {
        let device = laptop(DeviceStatus::Assigned);
        // Acquired 2024-01-15; 2024-08-20 is 218 days later, one full period.
        let today = NaiveDate::from_ymd_opt(2024, 8, 20).unwrap();

        assert_eq!(suggested_total(&device, today), dec!(720000));
    }

    #[test]
    fn suggested_total_is_zero_without_any_value() {
        let mut device = laptop(DeviceStatus::Assigned);
        device.initial_value = None;

        let today = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        assert_eq!(suggested_total(&device, today), Decimal::ZERO);
    }
}
