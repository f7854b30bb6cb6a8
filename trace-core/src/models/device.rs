use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{DeviceKind, DeviceStatus};

/// A device as last reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub kind: DeviceKind,
    pub brand: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub imei: Option<String>,
    pub phone_number: Option<String>,
    pub invoice_number: Option<String>,
    pub branch_id: i64,
    #[serde(default)]
    pub branch_name: Option<String>,
    pub status: DeviceStatus,

    /// True while an open assignment references this device.
    pub has_active_assignment: bool,

    // Valuation
    pub initial_value: Option<Decimal>,
    pub acquisition_date: NaiveDate,
    pub current_value: Option<Decimal>,
    pub is_manual_value: bool,
}

/// Ways a device record can contradict the lifecycle rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceInvariantError {
    #[error("device {id} is {status} but still has an active assignment")]
    AssignmentInWrongStatus { id: i64, status: DeviceStatus },

    #[error("device {id} is a {kind} and cannot carry a valuation")]
    ValuationOnNonDepreciatingKind { id: i64, kind: DeviceKind },
}

impl Device {
    /// Identifier shown to people: serial number, then IMEI, then the id.
    pub fn display_identifier(&self) -> String {
        self.serial_number
            .as_deref()
            .or(self.imei.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", self.id))
    }

    /// Branch name, or `ID: n` when the backend sent only the id.
    pub fn branch_label(&self) -> String {
        self.branch_name
            .clone()
            .unwrap_or_else(|| format!("ID: {}", self.branch_id))
    }

    pub fn check_invariants(&self) -> Result<(), DeviceInvariantError> {
        if self.has_active_assignment && !self.status.allows_active_assignment() {
            return Err(DeviceInvariantError::AssignmentInWrongStatus {
                id: self.id,
                status: self.status,
            });
        }
        if !self.kind.depreciates() && self.initial_value.is_some() {
            return Err(DeviceInvariantError::ValuationOnNonDepreciatingKind {
                id: self.id,
                kind: self.kind,
            });
        }
        Ok(())
    }

    /// Whole calendar months since acquisition, or `None` for categories
    /// without an age. Future acquisition dates count as zero.
    pub fn age_in_months(
        &self,
        today: NaiveDate,
    ) -> Option<u32> {
        if !self.kind.depreciates() {
            return None;
        }
        Some(whole_months_between(self.acquisition_date, today))
    }
}

fn whole_months_between(
    from: NaiveDate,
    to: NaiveDate,
) -> u32 {
    if to <= from {
        return 0;
    }
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if to.day() < from.day() {
        months -= 1;
    }
    months.max(0) as u32
}
