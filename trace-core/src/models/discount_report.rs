use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::DeviceKind;

/// One issued loss/theft discount, as listed by the backend's discount
/// report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRecord {
    pub assignment_id: i64,
    pub employee_name: Option<String>,
    pub employee_rut: Option<String>,
    pub branch: Option<String>,
    pub device_kind: Option<DeviceKind>,
    pub brand: Option<String>,
    pub model: Option<String>,
    /// Serial number or IMEI.
    pub device_identifier: Option<String>,
    pub reported_on: Option<NaiveDate>,
    pub total_amount: Option<Decimal>,
    pub installments: Option<u32>,
    /// Month name as stored on the letter.
    pub first_installment_month: Option<String>,
}
