pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod prompt;
pub mod render;
pub mod session_store;
