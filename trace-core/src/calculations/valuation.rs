//! Editable valuation state for a device form.
//!
//! Holds the inputs of the depreciation preview together with the value the
//! user will submit. While the value is automatic it follows the computed
//! suggestion; once the user types a different figure it becomes manual and
//! stays manual until the user enters the suggested figure again or calls
//! [`ValuationForm::reset_to_automatic`]. Changing the acquisition date does
//! not clear the manual flag.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::depreciation::depreciated_value;
use crate::format::{parse_date, parse_money};
use crate::models::{Device, DeviceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuationForm {
    kind: DeviceKind,
    initial_value: Option<Decimal>,
    acquisition_date: Option<NaiveDate>,
    current_value: Option<Decimal>,
    is_manual_value: bool,
}

impl ValuationForm {
    /// Empty form for a new device of `kind`.
    pub fn new(kind: DeviceKind) -> Self {
        Self {
            kind,
            initial_value: None,
            acquisition_date: None,
            current_value: None,
            is_manual_value: false,
        }
    }

    /// Form pre-filled from a device as stored by the backend.
    pub fn from_device(device: &Device) -> Self {
        Self {
            kind: device.kind,
            initial_value: device.initial_value,
            acquisition_date: Some(device.acquisition_date),
            current_value: device.current_value,
            is_manual_value: device.is_manual_value,
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn initial_value(&self) -> Option<Decimal> {
        self.initial_value
    }

    pub fn acquisition_date(&self) -> Option<NaiveDate> {
        self.acquisition_date
    }

    pub fn current_value(&self) -> Option<Decimal> {
        self.current_value
    }

    pub fn is_manual_value(&self) -> bool {
        self.is_manual_value
    }

    /// Whether the valuation section applies at all.
    pub fn is_applicable(&self) -> bool {
        self.kind.depreciates()
    }

    /// Computed value for `today`, or `None` when the kind does not
    /// depreciate or an input is missing.
    pub fn suggestion(
        &self,
        today: NaiveDate,
    ) -> Option<Decimal> {
        if !self.is_applicable() {
            return None;
        }
        let initial = self.initial_value?;
        let acquired = self.acquisition_date?;
        Some(depreciated_value(initial, acquired, today))
    }

    pub fn set_initial_value(
        &mut self,
        value: Option<Decimal>,
        today: NaiveDate,
    ) {
        self.initial_value = value;
        self.recompute(today);
    }

    /// Raw text from an input box. Non-digits are ignored; text without any
    /// digit clears the value.
    pub fn set_initial_value_text(
        &mut self,
        text: &str,
        today: NaiveDate,
    ) {
        self.set_initial_value(parse_money(text), today);
    }

    pub fn set_acquisition_date(
        &mut self,
        date: Option<NaiveDate>,
        today: NaiveDate,
    ) {
        self.acquisition_date = date;
        self.recompute(today);
    }

    /// ISO date text. Malformed dates clear the date, which turns the
    /// suggestion off instead of failing.
    pub fn set_acquisition_date_text(
        &mut self,
        text: &str,
        today: NaiveDate,
    ) {
        self.set_acquisition_date(parse_date(text), today);
    }

    /// Records a value typed by the user.
    pub fn enter_current_value(
        &mut self,
        value: Option<Decimal>,
        today: NaiveDate,
    ) {
        let suggestion = self.suggestion(today);
        self.current_value = value;
        if value != suggestion {
            self.is_manual_value = true;
        } else if self.is_manual_value {
            debug!(?value, "entered value matches suggestion, back to automatic");
            self.is_manual_value = false;
        }
    }

    pub fn enter_current_value_text(
        &mut self,
        text: &str,
        today: NaiveDate,
    ) {
        self.enter_current_value(parse_money(text), today);
    }

    pub fn reset_to_automatic(
        &mut self,
        today: NaiveDate,
    ) {
        self.is_manual_value = false;
        self.recompute(today);
    }

    fn recompute(
        &mut self,
        today: NaiveDate,
    ) {
        if self.is_manual_value {
            return;
        }
        self.current_value = self.suggestion(today);
    }
}
