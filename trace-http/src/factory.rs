use std::time::Duration;

use async_trait::async_trait;
use trace_core::api::{BackendConfig, BackendError, BackendFactory, DeviceBackend};

use crate::client::HttpBackend;

/// [`BackendFactory`] for the REST backend.
///
/// Register this with a [`trace_core::api::BackendRegistry`] to make the
/// `"http"` backend available:
///
/// ```rust,no_run
/// use trace_core::api::BackendRegistry;
/// use trace_http::HttpBackendFactory;
///
/// let mut registry = BackendRegistry::new();
/// registry.register(Box::new(HttpBackendFactory));
/// ```
pub struct HttpBackendFactory;

#[async_trait]
impl BackendFactory for HttpBackendFactory {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    /// Builds a client for `config.base_url`. No request is sent until the
    /// first backend call.
    async fn create(
        &self,
        config: &BackendConfig,
    ) -> Result<Box<dyn DeviceBackend>, BackendError> {
        let backend = HttpBackend::new(&config.base_url, Duration::from_secs(config.timeout_secs))?;
        Ok(Box::new(backend))
    }
}
