//! # API Shared
//!
//! Shared utilities and definitions for the DDX APIs.
//!
//! Contains:
//! - Request/response types (`dto` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and `cli` so both surfaces report the same shapes.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
