//! Scribe Server - HTTP surface
//!
//! Exposes the composition pipeline and brand profile operations over HTTP
//! with `warp`. Identity arrives in a header from the upstream session
//! layer; guest state travels in cookies.

pub mod cookies;
pub mod identity;
pub mod routes;
pub mod server;
pub mod telemetry;

pub use routes::{routes, AppState};
pub use server::{build_pipeline, run};
