//! HTTP surface of Medibook: the scheduling endpoint plus health and
//! vocabulary introspection.

pub mod schedule_api;
pub mod server;
pub mod uploads;

pub use server::{GatewayState, build_router, start_server};
pub use uploads::TempUpload;
