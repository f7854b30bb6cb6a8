mod assignment;
mod device;
mod device_kind;
mod device_status;
mod discount_letter;
mod discount_report;

pub use assignment::{Assignment, AssignmentStatus, DeliveryKind, NewReturn, ReturnCondition};
pub use device::{Device, DeviceInvariantError};
pub use device_kind::DeviceKind;
pub use device_status::DeviceStatus;
pub use discount_letter::{
    CompanyKey, DEFAULT_INSTALLMENTS, DiscountLetterError, DiscountLetterParams, MAX_INSTALLMENTS,
    parse_month, spanish_month_name, suggested_total,
};
pub use discount_report::DiscountRecord;

#[cfg(test)]
pub(crate) use device::fixtures;
