//! Device status actions and the rules for offering them.
//!
//! | Current status | Active assignment | Offered actions                  |
//! |----------------|-------------------|----------------------------------|
//! | AVAILABLE      | any               | send-to-maintenance, retire      |
//! | ASSIGNED       | any               | send-to-maintenance, retire      |
//! | MAINTENANCE    | yes               | return-from-maintenance, retire  |
//! | MAINTENANCE    | no                | mark-available, retire           |
//! | RETIRED        | any               | none                             |
//! | STOLEN         | any               | none                             |
//!
//! The backend enforces the same table; what is computed here only decides
//! what to offer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DeviceStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceAction {
    SendToMaintenance,
    MarkAvailable,
    ReturnFromMaintenance,
    Retire,
}

const MAINTENANCE_OR_RETIRE: &[DeviceAction] =
    &[DeviceAction::SendToMaintenance, DeviceAction::Retire];
const RETURN_OR_RETIRE: &[DeviceAction] =
    &[DeviceAction::ReturnFromMaintenance, DeviceAction::Retire];
const AVAILABLE_OR_RETIRE: &[DeviceAction] = &[DeviceAction::MarkAvailable, DeviceAction::Retire];
const NONE: &[DeviceAction] = &[];

/// Actions to offer for a device, in menu order.
pub fn permitted_actions(
    status: DeviceStatus,
    has_active_assignment: bool,
) -> &'static [DeviceAction] {
    match status {
        DeviceStatus::Available | DeviceStatus::Assigned => MAINTENANCE_OR_RETIRE,
        DeviceStatus::Maintenance if has_active_assignment => RETURN_OR_RETIRE,
        DeviceStatus::Maintenance => AVAILABLE_OR_RETIRE,
        DeviceStatus::Retired | DeviceStatus::Stolen => NONE,
    }
}

pub fn is_permitted(
    action: DeviceAction,
    status: DeviceStatus,
    has_active_assignment: bool,
) -> bool {
    permitted_actions(status, has_active_assignment).contains(&action)
}

impl DeviceAction {
    pub const ALL: [DeviceAction; 4] = [
        Self::SendToMaintenance,
        Self::MarkAvailable,
        Self::ReturnFromMaintenance,
        Self::Retire,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SendToMaintenance => "send-to-maintenance",
            Self::MarkAvailable => "mark-available",
            Self::ReturnFromMaintenance => "return-from-maintenance",
            Self::Retire => "retire",
        }
    }

    pub fn requires_reason(&self) -> bool {
        matches!(self, Self::SendToMaintenance | Self::Retire)
    }

    /// No compensating transition exists once the backend accepts it.
    pub fn is_irreversible(&self) -> bool {
        matches!(self, Self::Retire)
    }

    /// Status the backend is expected to report afterwards. A preview only.
    pub fn expected_status(&self) -> DeviceStatus {
        match self {
            Self::SendToMaintenance => DeviceStatus::Maintenance,
            Self::MarkAvailable => DeviceStatus::Available,
            Self::ReturnFromMaintenance => DeviceStatus::Assigned,
            Self::Retire => DeviceStatus::Retired,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::SendToMaintenance => "Send to maintenance",
            Self::MarkAvailable => "Mark as available",
            Self::ReturnFromMaintenance => "Return from maintenance",
            Self::Retire => "Retire device",
        }
    }

    /// Confirmation text. Maintenance on an assigned device is urgent and
    /// keeps the assignment; on any other device it is preventive.
    pub fn description(
        &self,
        current: DeviceStatus,
    ) -> &'static str {
        match self {
            Self::SendToMaintenance if current == DeviceStatus::Assigned => {
                "The device will be sent to urgent maintenance. The assignment stays active during the repair."
            }
            Self::SendToMaintenance => {
                "The device will be sent to preventive maintenance. Please state the reason."
            }
            Self::MarkAvailable => {
                "The device will be marked as available and can be assigned again."
            }
            Self::ReturnFromMaintenance => {
                "The device will return to ASSIGNED. The assignment stays active and the employee gets the device back."
            }
            Self::Retire => {
                "The device will be retired permanently. Please state the reason for retirement."
            }
        }
    }

    pub fn confirm_label(&self) -> &'static str {
        match self {
            Self::SendToMaintenance => "Send to maintenance",
            Self::MarkAvailable => "Mark available",
            Self::ReturnFromMaintenance => "Return to employee",
            Self::Retire => "Retire",
        }
    }
}

impl std::fmt::Display for DeviceAction {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceAction {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ActionError::UnknownAction(s.to_string()))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("a reason is required to {0}")]
    ReasonRequired(DeviceAction),

    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

/// A validated action submission. Built only through [`ActionRequest::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    action: DeviceAction,
    reason: Option<String>,
    notes: Option<String>,
}

impl ActionRequest {
    /// Trims inputs and drops blank ones. A reason supplied to an action
    /// that does not take one is discarded.
    ///
    /// # Errors
    ///
    /// [`ActionError::ReasonRequired`] when the action needs a reason and
    /// none (or only whitespace) was given.
    pub fn new(
        action: DeviceAction,
        reason: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Self, ActionError> {
        let reason = non_blank(reason);
        if action.requires_reason() && reason.is_none() {
            return Err(ActionError::ReasonRequired(action));
        }
        Ok(Self {
            action,
            reason: reason.filter(|_| action.requires_reason()),
            notes: non_blank(notes),
        })
    }

    pub fn action(&self) -> DeviceAction {
        self.action
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
