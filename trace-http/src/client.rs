use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use trace_core::api::{
    BackendError, DeviceBackend, DeviceFilter, DiscountReportFilter, Page, Session,
};
use trace_core::lifecycle::ActionRequest;
use trace_core::models::{Assignment, Device, DiscountLetterParams, DiscountRecord, NewReturn};
use tracing::{debug, info, warn};

use crate::error::{from_status, from_transport};
use crate::wire::{
    AssignmentDto, DeviceDto, DeviceEnvelope, DiscountLetterBody, DiscountReportDto, LoginBody,
    LoginResponse, LogoutBody, PageDto, ReturnBody, TransitionBody,
};

/// [`DeviceBackend`] over the inventory REST API.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// # Errors
    /// [`BackendError::Configuration`] when the base URL is not `http(s)` or
    /// the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BackendError::Configuration(format!(
                "base URL must start with http:// or https://, got '{base_url}'"
            )));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path such as `devices/7/`.
    pub fn endpoint(
        &self,
        path: &str,
    ) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(
        &self,
        builder: RequestBuilder,
        session: &Session,
    ) -> Result<RequestBuilder, BackendError> {
        let bearer = session.bearer().ok_or(BackendError::Unauthorized)?;
        Ok(builder
            .header(reqwest::header::AUTHORIZATION, bearer)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    async fn send(
        &self,
        builder: RequestBuilder,
    ) -> Result<Response, BackendError> {
        let response = builder.send().await.map_err(from_transport)?;
        let status = response.status();
        debug!(url = %response.url(), %status, "backend response");

        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(from_status(status, &body))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let builder = self.client.get(self.endpoint(path)).query(query);
        let response = self.send(self.authorized(builder, session)?).await?;
        response.json().await.map_err(from_transport)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
    ) -> Result<Response, BackendError> {
        let builder = self.client.post(self.endpoint(path)).json(body);
        self.send(self.authorized(builder, session)?).await
    }

    async fn transition(
        &self,
        session: &Session,
        id: i64,
        endpoint: &str,
        request: &ActionRequest,
    ) -> Result<Device, BackendError> {
        let path = format!("devices/{id}/{endpoint}/");
        let response = self
            .post(session, &path, &TransitionBody::from(request))
            .await?;
        let envelope: DeviceEnvelope = response.json().await.map_err(from_transport)?;
        let (message, dto) = envelope.into_parts();
        if let Some(message) = message {
            info!(device_id = id, "{}", message);
        }
        Device::try_from(dto)
    }
}

/// Query pairs for a device listing. Unset filters are left out.
pub(crate) fn filter_query(filter: &DeviceFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(status) = filter.status {
        query.push(("estado", status.as_str().to_string()));
    }
    if let Some(kind) = filter.kind {
        query.push(("tipo_equipo", kind.as_str().to_string()));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query.push(("search", search.to_string()));
    }
    if let Some(page) = filter.page {
        query.push(("page", page.to_string()));
    }
    if let Some(page_size) = filter.page_size {
        query.push(("page_size", page_size.to_string()));
    }
    query
}

/// The report is fetched in one page large enough to hold every discount.
const DISCOUNT_REPORT_PAGE_SIZE: u32 = 1000;

pub(crate) fn report_query(filter: &DiscountReportFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(from) = filter.from {
        query.push(("fecha_inicio", from.format("%Y-%m-%d").to_string()));
    }
    if let Some(to) = filter.to {
        query.push(("fecha_fin", to.format("%Y-%m-%d").to_string()));
    }
    if let Some(kind) = filter.kind {
        query.push(("tipo_dispositivo", kind.as_str().to_string()));
    }
    query.push(("page_size", DISCOUNT_REPORT_PAGE_SIZE.to_string()));
    query
}

#[async_trait]
impl DeviceBackend for HttpBackend {
    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, BackendError> {
        let builder = self
            .client
            .post(self.endpoint("auth/login/"))
            .json(&LoginBody { username, password });
        let response = self.send(builder).await?;
        let tokens: LoginResponse = response.json().await.map_err(from_transport)?;
        if tokens.refresh.is_none() {
            debug!("login response carried no refresh token");
        }
        info!(username, "logged in");
        Ok(Session::login(username, tokens.access))
    }

    async fn logout(
        &self,
        session: &Session,
    ) -> Result<(), BackendError> {
        self.post(session, "auth/logout/", &LogoutBody { refresh_token: None })
            .await?;
        Ok(())
    }

    async fn get_device(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<Device, BackendError> {
        let dto: DeviceDto = self
            .get_json(session, &format!("devices/{id}/"), &[])
            .await?;
        Device::try_from(dto)
    }

    async fn list_devices(
        &self,
        session: &Session,
        filter: &DeviceFilter,
    ) -> Result<Page<Device>, BackendError> {
        let page: PageDto<DeviceDto> = self
            .get_json(session, "devices/", &filter_query(filter))
            .await?;
        Page::try_from(page)
    }

    async fn send_to_maintenance(
        &self,
        session: &Session,
        id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError> {
        self.transition(session, id, "send-to-maintenance", request)
            .await
    }

    async fn mark_available(
        &self,
        session: &Session,
        id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError> {
        self.transition(session, id, "mark-available", request)
            .await
    }

    async fn return_from_maintenance(
        &self,
        session: &Session,
        id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError> {
        self.transition(session, id, "return-from-maintenance", request)
            .await
    }

    async fn retire(
        &self,
        session: &Session,
        id: i64,
        request: &ActionRequest,
    ) -> Result<Device, BackendError> {
        self.transition(session, id, "retire", request).await
    }

    async fn get_assignment(
        &self,
        session: &Session,
        id: i64,
    ) -> Result<Assignment, BackendError> {
        let dto: AssignmentDto = self
            .get_json(session, &format!("assignments/{id}/"), &[])
            .await?;
        Assignment::try_from(dto)
    }

    async fn create_return(
        &self,
        session: &Session,
        new_return: &NewReturn,
    ) -> Result<(), BackendError> {
        self.post(session, "returns/", &ReturnBody::from(new_return))
            .await?;
        Ok(())
    }

    async fn generate_discount_letter(
        &self,
        session: &Session,
        assignment_id: i64,
        params: &DiscountLetterParams,
    ) -> Result<Vec<u8>, BackendError> {
        let path = format!("assignments/{assignment_id}/discount-letter/");
        let response = self
            .post(session, &path, &DiscountLetterBody::from(params))
            .await?;
        let bytes = response.bytes().await.map_err(from_transport)?;
        Ok(bytes.to_vec())
    }

    async fn discount_reports(
        &self,
        session: &Session,
        filter: &DiscountReportFilter,
    ) -> Result<Vec<DiscountRecord>, BackendError> {
        let page: PageDto<DiscountReportDto> = self
            .get_json(
                session,
                "assignments/assignments/discount-reports/",
                &report_query(filter),
            )
            .await?;
        if page.has_more() {
            warn!(count = page.count(), "discount report truncated to first page");
        }
        Ok(page.into_results().into_iter().map(DiscountRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use trace_core::models::{DeviceKind, DeviceStatus};

    use super::*;

    fn backend() -> HttpBackend {
        HttpBackend::new("http://localhost:8000/api/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let backend = backend();
        assert_eq!(backend.base_url(), "http://localhost:8000/api");
        assert_eq!(
            backend.endpoint("devices/7/retire/"),
            "http://localhost:8000/api/devices/7/retire/"
        );
        assert_eq!(
            backend.endpoint("/auth/login/"),
            "http://localhost:8000/api/auth/login/"
        );
    }

    #[test]
    fn non_http_base_url_is_a_configuration_error() {
        assert!(matches!(
            HttpBackend::new("localhost:8000", Duration::from_secs(5)),
            Err(BackendError::Configuration(_))
        ));
    }

    #[test]
    fn filter_query_skips_unset_fields() {
        assert!(filter_query(&DeviceFilter::default()).is_empty());

        let query = filter_query(&DeviceFilter {
            status: Some(DeviceStatus::Maintenance),
            kind: Some(DeviceKind::Laptop),
            search: Some("  ".to_string()),
            page: Some(2),
            page_size: None,
        });
        assert_eq!(
            query,
            vec![
                ("estado", "MANTENIMIENTO".to_string()),
                ("tipo_equipo", "LAPTOP".to_string()),
                ("page", "2".to_string()),
            ]
        );
    }

    #[test]
    fn report_query_always_sends_page_size() {
        assert_eq!(
            report_query(&DiscountReportFilter::default()),
            vec![("page_size", "1000".to_string())]
        );

        let query = report_query(&DiscountReportFilter {
            from: chrono::NaiveDate::from_ymd_opt(2026, 1, 1),
            to: chrono::NaiveDate::from_ymd_opt(2026, 6, 30),
            kind: Some(DeviceKind::Phone),
        });
        assert_eq!(
            query,
            vec![
                ("fecha_inicio", "2026-01-01".to_string()),
                ("fecha_fin", "2026-06-30".to_string()),
                ("tipo_dispositivo", "TELEFONO".to_string()),
                ("page_size", "1000".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn anonymous_session_is_rejected_before_sending() {
        let result = backend().get_device(&Session::anonymous(), 7).await;
        assert_eq!(result, Err(BackendError::Unauthorized));
    }
}
