mod client;
mod error;
mod factory;
mod wire;

pub use client::HttpBackend;
pub use factory::HttpBackendFactory;
