use crate::models::{DeviceStatus, NewReturn, ReturnCondition};

/// Status the backend is expected to move a returned device to. Used for the
/// confirmation message only; the real status comes from refetching.
pub fn next_status_for(condition: ReturnCondition) -> DeviceStatus {
    match condition {
        ReturnCondition::Optimal => DeviceStatus::Available,
        ReturnCondition::Damaged | ReturnCondition::NonFunctional => DeviceStatus::Maintenance,
    }
}

/// Line shown before a return is submitted.
pub fn return_preview(new_return: &NewReturn) -> String {
    let next = next_status_for(new_return.condition);
    format!(
        "Device returned in {} condition will move to {}",
        new_return.condition.label().to_lowercase(),
        next.label()
    )
}
