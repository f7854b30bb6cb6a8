//! Submits lifecycle changes to the backend and reports the outcome the
//! backend settled on.
//!
//! The controller never edits a device locally. Every successful submission
//! is followed by a fresh read, and that read is what callers get back.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{
    BackendError, DeviceBackend, DeviceFilter, DiscountReportFilter, Page, Session,
};
use crate::lifecycle::{
    ActionRequest, Confirmation, DeviceAction, IrreversibleOperation, next_status_for,
    permitted_actions,
};
use crate::models::{
    Assignment, Device, DeviceStatus, DiscountLetterParams, DiscountRecord, NewReturn,
    suggested_total,
};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("another change for device {0} is still being processed")]
    Busy(i64),

    #[error("cannot {action} a device that is {status}")]
    NotPermitted {
        action: DeviceAction,
        status: DeviceStatus,
    },

    #[error("{0} requires explicit confirmation")]
    ConfirmationRequired(IrreversibleOperation),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// A freshly fetched device with the actions it currently offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceMenu {
    pub device: Device,
    pub actions: Vec<DeviceAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnOutcome {
    /// Status shown to the user before submitting.
    pub expected_status: DeviceStatus,
    /// Device as the backend reports it after the return.
    pub device: Device,
}

impl ReturnOutcome {
    pub fn matches_preview(&self) -> bool {
        self.device.status == self.expected_status
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountLetterOutcome {
    pub document: Vec<u8>,
    pub device: Device,
}

pub struct DeviceController {
    backend: Arc<dyn DeviceBackend>,
    session: Session,
    in_flight: Mutex<HashSet<i64>>,
}

/// Marks a device busy until dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<i64>>,
    device_id: i64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.device_id);
    }
}

impl DeviceController {
    pub fn new(
        backend: Arc<dyn DeviceBackend>,
        session: Session,
    ) -> Self {
        Self {
            backend,
            session,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetches a device. Records that break the lifecycle invariants are
    /// logged and returned as-is.
    pub async fn device(
        &self,
        device_id: i64,
    ) -> Result<Device, ControllerError> {
        let device = self.backend.get_device(&self.session, device_id).await?;
        if let Err(e) = device.check_invariants() {
            warn!(device_id, %e, "backend returned an inconsistent device");
        }
        Ok(device)
    }

    pub async fn assignment(
        &self,
        assignment_id: i64,
    ) -> Result<Assignment, ControllerError> {
        Ok(self
            .backend
            .get_assignment(&self.session, assignment_id)
            .await?)
    }

    pub async fn list_devices(
        &self,
        filter: &DeviceFilter,
    ) -> Result<Page<Device>, ControllerError> {
        Ok(self.backend.list_devices(&self.session, filter).await?)
    }

    pub async fn discount_reports(
        &self,
        filter: &DiscountReportFilter,
    ) -> Result<Vec<DiscountRecord>, ControllerError> {
        Ok(self.backend.discount_reports(&self.session, filter).await?)
    }

    /// Fetches the device and lists what can be done with it right now.
    pub async fn menu(
        &self,
        device_id: i64,
    ) -> Result<DeviceMenu, ControllerError> {
        let device = self.device(device_id).await?;
        let actions =
            permitted_actions(device.status, device.has_active_assignment).to_vec();
        Ok(DeviceMenu { device, actions })
    }

    /// Submits a status change and returns the device as refetched
    /// afterwards. When that read fails the device from the submit response
    /// is returned instead.
    ///
    /// # Errors
    /// * [`ControllerError::Busy`] while another change for the device runs.
    /// * [`ControllerError::NotPermitted`] when the device's current status
    ///   does not offer the action. Nothing is sent.
    /// * [`ControllerError::ConfirmationRequired`] for an irreversible action
    ///   without a matching confirmation. Nothing is sent.
    /// * [`ControllerError::Backend`] when the backend rejects or fails.
    pub async fn perform(
        &self,
        device_id: i64,
        request: ActionRequest,
        confirmation: Option<Confirmation>,
    ) -> Result<Device, ControllerError> {
        let _guard = self.begin(device_id)?;
        let action = request.action();

        let current = self.device(device_id).await?;
        if !permitted_actions(current.status, current.has_active_assignment).contains(&action) {
            return Err(ControllerError::NotPermitted {
                action,
                status: current.status,
            });
        }
        if let Some(operation) = IrreversibleOperation::for_action(action) {
            require_confirmation(operation, confirmation)?;
        }

        debug!(device_id, %action, "submitting status change");
        let submitted = self.submit(device_id, &request).await?;

        // Committed from here on.
        let device = match self.device(device_id).await {
            Ok(device) => device,
            Err(e) => {
                warn!(device_id, %action, %e, "refetch failed, using the submit response");
                submitted
            }
        };
        if device.status != action.expected_status() {
            warn!(
                device_id,
                %action,
                expected = %action.expected_status(),
                actual = %device.status,
                "backend settled on a different status"
            );
        }
        info!(device_id, %action, status = %device.status, "status change accepted");
        Ok(device)
    }

    /// Records a return and refetches the device it released.
    pub async fn record_return(
        &self,
        new_return: &NewReturn,
    ) -> Result<ReturnOutcome, ControllerError> {
        let assignment = self.assignment(new_return.assignment_id).await?;
        let _guard = self.begin(assignment.device_id)?;
        let expected_status = next_status_for(new_return.condition);

        self.backend
            .create_return(&self.session, new_return)
            .await?;

        let outcome = ReturnOutcome {
            expected_status,
            device: self.device(assignment.device_id).await?,
        };
        if !outcome.matches_preview() {
            warn!(
                device_id = assignment.device_id,
                expected = %expected_status,
                actual = %outcome.device.status,
                "return preview did not match backend status"
            );
        }
        info!(
            assignment_id = new_return.assignment_id,
            condition = new_return.condition.as_str(),
            "return recorded"
        );
        Ok(outcome)
    }

    /// Pre-filled total for a discount letter on `assignment_id`.
    pub async fn discount_suggestion(
        &self,
        assignment_id: i64,
        today: NaiveDate,
    ) -> Result<Decimal, ControllerError> {
        let assignment = self.assignment(assignment_id).await?;
        let device = self.device(assignment.device_id).await?;
        Ok(suggested_total(&device, today))
    }

    /// Generates the discount letter. The backend moves the device to
    /// STOLEN; the refetched device is returned with the document.
    pub async fn generate_discount_letter(
        &self,
        assignment_id: i64,
        params: &DiscountLetterParams,
        confirmation: Option<Confirmation>,
    ) -> Result<DiscountLetterOutcome, ControllerError> {
        require_confirmation(IrreversibleOperation::DiscountLetter, confirmation)?;
        let assignment = self.assignment(assignment_id).await?;
        let _guard = self.begin(assignment.device_id)?;

        let document = self
            .backend
            .generate_discount_letter(&self.session, assignment_id, params)
            .await?;
        let device = self.device(assignment.device_id).await?;

        info!(
            assignment_id,
            device_id = device.id,
            bytes = document.len(),
            status = %device.status,
            "discount letter generated"
        );
        Ok(DiscountLetterOutcome { document, device })
    }

    fn begin(
        &self,
        device_id: i64,
    ) -> Result<InFlight<'_>, ControllerError> {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !set.insert(device_id) {
            return Err(ControllerError::Busy(device_id));
        }
        Ok(InFlight {
            set: &self.in_flight,
            device_id,
        })
    }

    async fn submit(
        &self,
        device_id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError> {
        let session = &self.session;
        match request.action() {
            DeviceAction::SendToMaintenance => {
                self.backend
                    .send_to_maintenance(session, device_id, request)
                    .await
            }
            DeviceAction::MarkAvailable => {
                self.backend
                    .mark_available(session, device_id, request)
                    .await
            }
            DeviceAction::ReturnFromMaintenance => {
                self.backend
                    .return_from_maintenance(session, device_id, request)
                    .await
            }
            DeviceAction::Retire => self.backend.retire(session, device_id, request).await,
        }
    }
}

/// Consumes the token. A missing or mismatched one fails.
fn require_confirmation(
    operation: IrreversibleOperation,
    confirmation: Option<Confirmation>,
) -> Result<(), ControllerError> {
    match confirmation {
        Some(token) if token.covers(operation) => Ok(()),
        _ => Err(ControllerError::ConfirmationRequired(operation)),
    }
}
