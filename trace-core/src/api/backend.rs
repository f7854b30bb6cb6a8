use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Session;
use crate::lifecycle::ActionRequest;
use crate::models::{
    Assignment, Device, DeviceKind, DeviceStatus, DiscountLetterParams, DiscountRecord, NewReturn,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Record not found")]
    NotFound,

    /// The backend refused the submitted data. `fields` maps a field name to
    /// its messages when the backend reported them.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// The requested transition is not allowed from the device's current
    /// status on the backend.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BackendError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Whether the backend rejected a status change, as opposed to failing
    /// to process it.
    pub fn is_transition_rejected(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Validation { .. })
    }
}

/// Query for [`DeviceBackend::list_devices`]. Empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFilter {
    pub status: Option<DeviceStatus>,
    pub kind: Option<DeviceKind>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Query for [`DeviceBackend::discount_reports`]. Dates are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountReportFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<DeviceKind>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub has_next: bool,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn single(results: Vec<T>) -> Self {
        Self {
            count: results.len() as u64,
            has_next: false,
            results,
        }
    }
}

/// The authority over device state. Every status change is a request to the
/// backend; the caller refetches to learn the outcome.
#[async_trait]
pub trait DeviceBackend: Send + Sync {
    // Auth
    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, BackendError>;
    async fn logout(
        &self,
        session: &Session,
    ) -> Result<(), BackendError>;

    // Devices
    async fn get_device(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<Device, BackendError>;
    async fn list_devices(
        &self,
        session: &Session,
        filter: &DeviceFilter,
    ) -> Result<Page<Device>, BackendError>;

    // Transitions
    async fn send_to_maintenance(
        &self,
        session: &Session,
        id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError>;
    async fn mark_available(
        &self,
        session: &Session,
        id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError>;
    async fn return_from_maintenance(
        &self,
        session: &Session,
        id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError>;
    async fn retire(
        &self,
        session: &Session,
        id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError>;

    // Assignments
    async fn get_assignment(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<Assignment, BackendError>;
    async fn create_return(
        &self,
        session: &Session,
        new_return: &NewReturn,
    ) -> Result<(), BackendError>;

    /// Returns the rendered letter. The backend marks the device STOLEN as a
    /// side effect.
    async fn generate_discount_letter(
        &self,
        session: &Session,
        assignment_id: i64,
        params: &DiscountLetterParams,
    ) -> Result<Vec<u8>, BackendError>;

    // Reports
    async fn discount_reports(
        &self,
        session: &Session,
        filter: &DiscountReportFilter,
    ) -> Result<Vec<DiscountRecord>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_and_validation_are_transition_rejections() {
        assert!(BackendError::Conflict("already retired".to_string()).is_transition_rejected());
        assert!(BackendError::validation("reason is required").is_transition_rejected());
        assert!(!BackendError::Server("boom".to_string()).is_transition_rejected());
        assert!(!BackendError::Unauthorized.is_transition_rejected());
    }

    #[test]
    fn validation_message_is_displayed() {
        let err = BackendError::validation("motivo: required");
        assert_eq!(err.to_string(), "Validation error: motivo: required");
    }

    #[test]
    fn single_page_counts_its_results() {
        let page = Page::single(vec![1, 2, 3]);
        assert_eq!(page.count, 3);
        assert!(!page.has_next);
    }
}
