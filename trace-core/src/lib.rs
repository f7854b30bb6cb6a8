pub mod api;
pub mod calculations;
pub mod controller;
pub mod format;
pub mod lifecycle;
pub mod models;
pub mod validation;

pub use api::{BackendError, DeviceBackend, Session};
pub use controller::{ControllerError, DeviceController};
pub use models::*;
