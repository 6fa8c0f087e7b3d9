//! # API Shared
//!
//! Shared wire types for the gallery APIs.
//!
//! Contains:
//! - Request/response bodies (`pb` module), serialised with serde and documented with utoipa
//! - Shared services like `HealthService`
//!
//! Used by `gallery-core` to shape results, by `api-rest` for JSON and OpenAPI, and by the CLI
//! for printing.

pub mod health;
pub mod pb;

pub use health::HealthService;
pub use pb::*;
