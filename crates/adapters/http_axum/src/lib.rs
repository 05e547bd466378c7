//! # switchbridge-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Expose accessories and their characteristics as JSON, standing in for
//!   the HomeKit host's get/set requests
//! - Map HTTP requests into [`AccessoryService`] calls (driving adapter)
//! - Map [`BridgeError`] into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `switchbridge-app` (for port traits and services) and
//! `switchbridge-domain` (for domain types used in request/response
//! mapping). Never leaks axum types into the domain.
//!
//! [`AccessoryService`]: switchbridge_app::services::accessory_service::AccessoryService
//! [`BridgeError`]: switchbridge_domain::error::BridgeError

pub mod api;
pub mod error;
pub mod router;
pub mod state;
