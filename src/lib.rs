/// flight-notify - relays flight-simulation network events to a notification
/// backend.
///
/// The library is embedded in a host application: the host hands over its
/// settings and debug channel at activation, then delivers events one at a
/// time. See [`app::AppBuilder`] for the activation sequence.
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatcher;
pub mod host;
pub mod notification;
pub mod relay;
pub mod task_manager;
pub mod update;

// Re-export core types for convenience
pub use crate::core::*;
