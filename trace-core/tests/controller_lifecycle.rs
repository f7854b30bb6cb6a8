//! Drives the controller against an in-memory backend that enforces the
//! same transition rules as the server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Month, NaiveDate};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tokio::sync::Notify;

use trace_core::api::{
    BackendError, DeviceBackend, DeviceFilter, DiscountReportFilter, Page, Session,
};
use trace_core::controller::{ControllerError, DeviceController};
use trace_core::lifecycle::{
    ActionRequest, Confirmation, DeviceAction, IrreversibleOperation, is_permitted,
};
use trace_core::models::{
    Assignment, AssignmentStatus, CompanyKey, DeliveryKind, Device, DeviceKind, DeviceStatus,
    DiscountLetterParams, DiscountRecord, NewReturn, ReturnCondition,
};

// ── fake backend ─────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeBackend {
    devices: Mutex<HashMap<i64, Device>>,
    assignments: Mutex<HashMap<i64, Assignment>>,
    discounts: Mutex<Vec<DiscountRecord>>,
    submissions: AtomicUsize,
    /// Forces the status the backend settles on after the next transition.
    settle_on: Mutex<Option<DeviceStatus>>,
    /// When set, transitions wait for a notification before applying.
    gate: Option<Arc<Notify>>,
    /// Device reads fail once any transition has been submitted.
    reads_fail_after_submit: bool,
}

impl FakeBackend {
    fn with_device(device: Device) -> Self {
        let backend = Self::default();
        backend.devices.lock().unwrap().insert(device.id, device);
        backend
    }

    fn add_assignment(
        &self,
        assignment: Assignment,
    ) {
        self.assignments
            .lock()
            .unwrap()
            .insert(assignment.id, assignment);
    }

    fn stored(
        &self,
        id: i64,
    ) -> Device {
        self.devices.lock().unwrap()[&id].clone()
    }

    fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    fn authorize(session: &Session) -> Result<(), BackendError> {
        if session.is_authenticated() {
            Ok(())
        } else {
            Err(BackendError::Unauthorized)
        }
    }

    async fn transition(
        &self,
        session: &Session,
        id: i64,
        action: DeviceAction,
        request: &ActionRequest,
    ) -> Result<Device, BackendError> {
        Self::authorize(session)?;
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if action.requires_reason() && request.reason().is_none() {
            return Err(BackendError::validation("motivo: This field is required."));
        }

        let mut devices = self.devices.lock().unwrap();
        let device = devices.get_mut(&id).ok_or(BackendError::NotFound)?;
        if !is_permitted(action, device.status, device.has_active_assignment) {
            return Err(BackendError::Conflict(format!(
                "cannot {action} from {}",
                device.status.as_str()
            )));
        }
        device.status = self
            .settle_on
            .lock()
            .unwrap()
            .take()
            .unwrap_or(action.expected_status());
        Ok(device.clone())
    }
}

#[async_trait]
impl DeviceBackend for FakeBackend {
    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        if password == "secret" {
            Ok(Session::login(username, "token-1"))
        } else {
            Err(BackendError::Unauthorized)
        }
    }

    async fn logout(
        &self,
        _session: &Session,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    async fn get_device(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<Device, BackendError> {
        Self::authorize(session)?;
        if self.reads_fail_after_submit && self.submissions() > 0 {
            return Err(BackendError::Transport("connection reset by peer".to_string()));
        }
        self.devices
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn list_devices(
        &self,
        session: &Session,
        filter: &DeviceFilter,
    ) -> Result<Page<Device>, BackendError> {
        Self::authorize(session)?;
        let devices = self.devices.lock().unwrap();
        let mut results: Vec<_> = devices
            .values()
            .filter(|d| filter.status.is_none_or(|s| d.status == s))
            .filter(|d| filter.kind.is_none_or(|k| d.kind == k))
            .cloned()
            .collect();
        results.sort_by_key(|d| d.id);

        let Some(size) = filter.page_size.map(|n| n as usize) else {
            return Ok(Page::single(results));
        };
        let start = (filter.page.unwrap_or(1) as usize - 1) * size;
        Ok(Page {
            count: results.len() as u64,
            has_next: start + size < results.len(),
            results: results.into_iter().skip(start).take(size).collect(),
        })
    }

    async fn send_to_maintenance(
        &self,
        session: &Session,
        id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError> {
        self.transition(session, id, DeviceAction::SendToMaintenance, request)
            .await
    }

    async fn mark_available(
        &self,
        session: &Session,
        id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError> {
        self.transition(session, id, DeviceAction::MarkAvailable, request)
            .await
    }

    async fn return_from_maintenance(
        &self,
        session: &Session,
        id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError> {
        self.transition(session, id, DeviceAction::ReturnFromMaintenance, request)
            .await
    }

    async fn retire(
        &self,
        session: &Session,
        id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError> {
        self.transition(session, id, DeviceAction::Retire, request)
            .await
    }

    async fn get_assignment(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<Assignment, BackendError> {
        Self::authorize(session)?;
        self.assignments
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn create_return(
        &self,
        session: &Session,
        new_return: &NewReturn,
    ) -> Result<(), BackendError> {
        Self::authorize(session)?;
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let mut assignments = self.assignments.lock().unwrap();
        let assignment = assignments
            .get_mut(&new_return.assignment_id)
            .ok_or(BackendError::NotFound)?;
        if !assignment.is_active() {
            return Err(BackendError::validation("assignment is already finalized"));
        }
        assignment.status = AssignmentStatus::Finalized;
        assignment.returned_on = Some(new_return.returned_on);

        let mut devices = self.devices.lock().unwrap();
        let device = devices
            .get_mut(&assignment.device_id)
            .ok_or(BackendError::NotFound)?;
        device.has_active_assignment = false;
        device.status = match new_return.condition {
            ReturnCondition::Optimal => DeviceStatus::Available,
            _ => DeviceStatus::Maintenance,
        };
        Ok(())
    }

    async fn generate_discount_letter(
        &self,
        session: &Session,
        assignment_id: i64,
        params: &DiscountLetterParams,
    ) -> Result<Vec<u8>, BackendError> {
        Self::authorize(session)?;
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let device_id = self
            .assignments
            .lock()
            .unwrap()
            .get(&assignment_id)
            .map(|a| a.device_id)
            .ok_or(BackendError::NotFound)?;

        let mut devices = self.devices.lock().unwrap();
        let device = devices.get_mut(&device_id).ok_or(BackendError::NotFound)?;
        device.status = DeviceStatus::Stolen;
        device.has_active_assignment = false;
        Ok(format!("%PDF-1.4 carta {}", params.total_amount()).into_bytes())
    }

    async fn discount_reports(
        &self,
        session: &Session,
        filter: &DiscountReportFilter,
    ) -> Result<Vec<DiscountRecord>, BackendError> {
        Self::authorize(session)?;
        Ok(self
            .discounts
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.kind.is_none() || r.device_kind == filter.kind)
            .filter(|r| match (filter.from, r.reported_on) {
                (Some(from), Some(on)) => on >= from,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .filter(|r| match (filter.to, r.reported_on) {
                (Some(to), Some(on)) => on <= to,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .cloned()
            .collect())
    }
}

// ── fixtures ─────────────────────────────────────────────────────────────

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn device(
    id: i64,
    status: DeviceStatus,
    has_active_assignment: bool,
) -> Device {
    Device {
        id,
        kind: DeviceKind::Laptop,
        brand: "Dell".to_string(),
        model: Some("Latitude 5440".to_string()),
        serial_number: Some(format!("SN-{id:04}")),
        imei: None,
        phone_number: None,
        invoice_number: None,
        branch_id: 2,
        branch_name: None,
        status,
        has_active_assignment,
        initial_value: Some(dec!(900000)),
        acquisition_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
        current_value: None,
        is_manual_value: false,
    }
}

fn assignment(
    id: i64,
    device_id: i64,
) -> Assignment {
    Assignment {
        id,
        employee_id: 40,
        device_id,
        delivery_kind: DeliveryKind::Permanent,
        delivered_on: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
        returned_on: None,
        status: AssignmentStatus::Active,
        notes: None,
    }
}

fn controller(backend: &Arc<FakeBackend>) -> DeviceController {
    DeviceController::new(backend.clone(), Session::login("jperez", "token-1"))
}

fn maintenance_request() -> ActionRequest {
    ActionRequest::new(DeviceAction::SendToMaintenance, Some("pantalla rota"), None).unwrap()
}

fn retire_request() -> ActionRequest {
    ActionRequest::new(DeviceAction::Retire, Some("obsoleto"), None).unwrap()
}

// =========================================================================
// menu
// =========================================================================

#[tokio::test]
async fn menu_reflects_fresh_backend_state() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Available, false)));
    let ctl = controller(&backend);

    let menu = ctl.menu(1).await.unwrap();
    assert_eq!(menu.actions, vec![DeviceAction::SendToMaintenance, DeviceAction::Retire]);

    backend.devices.lock().unwrap().get_mut(&1).unwrap().status = DeviceStatus::Retired;

    let menu = ctl.menu(1).await.unwrap();
    assert!(menu.actions.is_empty());
}

#[tokio::test]
async fn anonymous_session_is_unauthorized() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Available, false)));
    let ctl = DeviceController::new(backend, Session::anonymous());

    assert!(matches!(
        ctl.menu(1).await,
        Err(ControllerError::Backend(BackendError::Unauthorized))
    ));
}

// =========================================================================
// perform
// =========================================================================

#[tokio::test]
async fn assigned_device_goes_to_maintenance_and_keeps_assignment() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Assigned, true)));
    let ctl = controller(&backend);

    let updated = ctl.perform(1, maintenance_request(), None).await.unwrap();

    assert_eq!(updated.status, DeviceStatus::Maintenance);
    assert!(updated.has_active_assignment);

    let menu = ctl.menu(1).await.unwrap();
    assert_eq!(
        menu.actions,
        vec![DeviceAction::ReturnFromMaintenance, DeviceAction::Retire]
    );
}

#[tokio::test]
async fn maintenance_round_trip_returns_device_to_employee() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Maintenance, true)));
    let ctl = controller(&backend);
    let request = ActionRequest::new(DeviceAction::ReturnFromMaintenance, None, None).unwrap();

    let updated = ctl.perform(1, request, None).await.unwrap();

    assert_eq!(updated.status, DeviceStatus::Assigned);
}

#[tokio::test]
async fn mark_available_is_refused_while_assignment_is_open() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Maintenance, true)));
    let ctl = controller(&backend);
    let request = ActionRequest::new(DeviceAction::MarkAvailable, None, None).unwrap();

    let result = ctl.perform(1, request, None).await;

    assert!(matches!(
        result,
        Err(ControllerError::NotPermitted {
            action: DeviceAction::MarkAvailable,
            status: DeviceStatus::Maintenance,
        })
    ));
    assert_eq!(backend.submissions(), 0);
}

#[tokio::test]
async fn stale_view_is_caught_by_refetch() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Available, false)));
    let ctl = controller(&backend);

    // Someone else retired the device after our menu was drawn.
    let menu = ctl.menu(1).await.unwrap();
    assert!(menu.actions.contains(&DeviceAction::SendToMaintenance));
    backend.devices.lock().unwrap().get_mut(&1).unwrap().status = DeviceStatus::Retired;

    let result = ctl.perform(1, maintenance_request(), None).await;

    assert!(matches!(result, Err(ControllerError::NotPermitted { .. })));
    assert_eq!(backend.submissions(), 0);
}

#[tokio::test]
async fn retire_without_confirmation_sends_nothing() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Assigned, true)));
    let ctl = controller(&backend);

    let result = ctl.perform(1, retire_request(), None).await;

    assert!(matches!(
        result,
        Err(ControllerError::ConfirmationRequired(IrreversibleOperation::Retire))
    ));
    assert_eq!(backend.submissions(), 0);
    assert_eq!(backend.stored(1).status, DeviceStatus::Assigned);
}

#[tokio::test]
async fn confirmation_for_another_operation_is_not_accepted() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Available, false)));
    let ctl = controller(&backend);
    let wrong = Confirmation::acknowledge(IrreversibleOperation::DiscountLetter);

    let result = ctl.perform(1, retire_request(), Some(wrong)).await;

    assert!(matches!(result, Err(ControllerError::ConfirmationRequired(_))));
}

#[tokio::test]
async fn confirmed_retire_is_terminal() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Maintenance, false)));
    let ctl = controller(&backend);
    let confirmation = Confirmation::acknowledge(IrreversibleOperation::Retire);

    let retired = ctl
        .perform(1, retire_request(), Some(confirmation))
        .await
        .unwrap();

    assert_eq!(retired.status, DeviceStatus::Retired);
    assert!(ctl.menu(1).await.unwrap().actions.is_empty());

    let again = ctl
        .perform(
            1,
            retire_request(),
            Some(Confirmation::acknowledge(IrreversibleOperation::Retire)),
        )
        .await;
    assert!(matches!(again, Err(ControllerError::NotPermitted { .. })));
}

#[tokio::test]
async fn result_is_the_refetched_device_not_the_preview() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Available, false)));
    *backend.settle_on.lock().unwrap() = Some(DeviceStatus::Stolen);
    let ctl = controller(&backend);

    let updated = ctl.perform(1, maintenance_request(), None).await.unwrap();

    assert_eq!(updated.status, DeviceStatus::Stolen);
}

#[tokio::test]
async fn second_submission_while_in_flight_is_busy() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend {
        gate: Some(gate.clone()),
        ..FakeBackend::with_device(device(1, DeviceStatus::Available, false))
    });
    let ctl = controller(&backend);

    let (first, second, ()) = tokio::join!(
        ctl.perform(1, maintenance_request(), None),
        ctl.perform(1, maintenance_request(), None),
        async { gate.notify_one() },
    );

    assert_eq!(first.unwrap().status, DeviceStatus::Maintenance);
    assert!(matches!(second, Err(ControllerError::Busy(1))));
    assert_eq!(backend.submissions(), 1);
}

#[tokio::test]
async fn accepted_change_survives_a_failed_refetch() {
    let backend = Arc::new(FakeBackend {
        reads_fail_after_submit: true,
        ..FakeBackend::with_device(device(1, DeviceStatus::Available, false))
    });
    let ctl = controller(&backend);

    let retired = ctl
        .perform(
            1,
            retire_request(),
            Some(Confirmation::acknowledge(IrreversibleOperation::Retire)),
        )
        .await
        .unwrap();

    assert_eq!(retired.status, DeviceStatus::Retired);
    assert_eq!(backend.stored(1).status, DeviceStatus::Retired);
    assert_eq!(backend.submissions(), 1);
}

#[tokio::test]
async fn device_is_released_after_a_failed_submission() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Available, false)));
    let ctl = controller(&backend);
    backend.devices.lock().unwrap().remove(&1);

    assert!(matches!(
        ctl.perform(1, maintenance_request(), None).await,
        Err(ControllerError::Backend(BackendError::NotFound))
    ));

    backend
        .devices
        .lock()
        .unwrap()
        .insert(1, device(1, DeviceStatus::Available, false));
    let updated = ctl.perform(1, maintenance_request(), None).await.unwrap();
    assert_eq!(updated.status, DeviceStatus::Maintenance);
}

// =========================================================================
// returns
// =========================================================================

#[tokio::test]
async fn optimal_return_frees_the_device() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Assigned, true)));
    backend.add_assignment(assignment(10, 1));
    let ctl = controller(&backend);

    let outcome = ctl
        .record_return(&NewReturn {
            assignment_id: 10,
            returned_on: today(),
            condition: ReturnCondition::Optimal,
            notes: None,
        })
        .await
        .unwrap();

    assert!(outcome.matches_preview());
    assert_eq!(outcome.device.status, DeviceStatus::Available);
    assert!(!outcome.device.has_active_assignment);
}

#[tokio::test]
async fn damaged_return_sends_device_to_maintenance_without_assignment() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Assigned, true)));
    backend.add_assignment(assignment(10, 1));
    let ctl = controller(&backend);

    let outcome = ctl
        .record_return(&NewReturn {
            assignment_id: 10,
            returned_on: today(),
            condition: ReturnCondition::Damaged,
            notes: Some("bisagra suelta".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(outcome.expected_status, DeviceStatus::Maintenance);
    assert_eq!(outcome.device.status, DeviceStatus::Maintenance);
    assert_eq!(
        ctl.menu(1).await.unwrap().actions,
        vec![DeviceAction::MarkAvailable, DeviceAction::Retire]
    );
}

// =========================================================================
// discount letter
// =========================================================================

fn letter_params() -> DiscountLetterParams {
    DiscountLetterParams::new(CompanyKey::default(), dec!(810000), 4, Month::November).unwrap()
}

#[tokio::test]
async fn discount_suggestion_uses_depreciated_value() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Assigned, true)));
    backend.add_assignment(assignment(10, 1));
    let ctl = controller(&backend);

    // Acquired 2025-10-01, two completed periods by 2026-10-17.
    let total = ctl.discount_suggestion(10, today()).await.unwrap();

    assert_eq!(total, dec!(720000));
}

#[tokio::test]
async fn discount_letter_requires_confirmation() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Assigned, true)));
    backend.add_assignment(assignment(10, 1));
    let ctl = controller(&backend);

    let result = ctl.generate_discount_letter(10, &letter_params(), None).await;

    assert!(matches!(
        result,
        Err(ControllerError::ConfirmationRequired(IrreversibleOperation::DiscountLetter))
    ));
    assert_eq!(backend.submissions(), 0);
}

#[tokio::test]
async fn discount_letter_marks_device_stolen() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Assigned, true)));
    backend.add_assignment(assignment(10, 1));
    let ctl = controller(&backend);
    let confirmation = Confirmation::acknowledge(IrreversibleOperation::DiscountLetter);

    let outcome = ctl
        .generate_discount_letter(10, &letter_params(), Some(confirmation))
        .await
        .unwrap();

    assert!(outcome.document.starts_with(b"%PDF"));
    assert_eq!(outcome.device.status, DeviceStatus::Stolen);
    assert!(ctl.menu(1).await.unwrap().actions.is_empty());
}

#[tokio::test]
async fn list_devices_filters_by_status() {
    let backend = Arc::new(FakeBackend::with_device(device(1, DeviceStatus::Available, false)));
    backend
        .devices
        .lock()
        .unwrap()
        .insert(2, device(2, DeviceStatus::Retired, false));
    let ctl = controller(&backend);

    let page = ctl
        .list_devices(&DeviceFilter {
            status: Some(DeviceStatus::Retired),
            ..DeviceFilter::default()
        })
        .await
        .unwrap();

    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].id, 2);
}

#[tokio::test]
async fn list_devices_pages_through_results() {
    let backend = Arc::new(FakeBackend::default());
    for id in 1..=5 {
        backend
            .devices
            .lock()
            .unwrap()
            .insert(id, device(id, DeviceStatus::Available, false));
    }
    let ctl = controller(&backend);

    let mut seen = Vec::new();
    let mut filter = DeviceFilter {
        page_size: Some(2),
        ..DeviceFilter::default()
    };
    for page_number in 1..=5 {
        filter.page = Some(page_number);
        let page = ctl.list_devices(&filter).await.unwrap();
        assert_eq!(page.count, 5);
        seen.extend(page.results.iter().map(|d| d.id));
        if !page.has_next {
            break;
        }
    }

    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    assert_eq!(filter.page, Some(3));
}

#[tokio::test]
async fn discount_reports_are_filtered_by_period() {
    let backend = Arc::new(FakeBackend::default());
    let record = |assignment_id, day| DiscountRecord {
        assignment_id,
        employee_name: Some("Pedro Soto".to_string()),
        employee_rut: Some("15.222.333-4".to_string()),
        branch: Some("Osorno".to_string()),
        device_kind: Some(DeviceKind::Phone),
        brand: Some("Motorola".to_string()),
        model: Some("G84".to_string()),
        device_identifier: Some("351234567890123".to_string()),
        reported_on: NaiveDate::from_ymd_opt(2026, 9, day),
        total_amount: Some(dec!(180000)),
        installments: Some(3),
        first_installment_month: Some("Octubre".to_string()),
    };
    backend
        .discounts
        .lock()
        .unwrap()
        .extend([record(20, 3), record(21, 25)]);
    let ctl = controller(&backend);

    let records = ctl
        .discount_reports(&DiscountReportFilter {
            from: NaiveDate::from_ymd_opt(2026, 9, 10),
            ..DiscountReportFilter::default()
        })
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].assignment_id, 21);
}
