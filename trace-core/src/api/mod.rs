mod backend;
mod factory;
mod session;

pub use backend::{BackendError, DeviceBackend, DeviceFilter, DiscountReportFilter, Page};
pub use factory::{
    BackendConfig, BackendFactory, BackendRegistry, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS,
};
pub use session::Session;
