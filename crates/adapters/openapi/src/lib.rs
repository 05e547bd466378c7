//! # switchbridge-adapter-openapi
//!
//! Cloud adapter implementing the [`CloudApi`](switchbridge_app::ports::CloudApi)
//! port against the vendor's REST API (v1.1).
//!
//! ## How it works
//!
//! Every request is signed with the account token and secret (see
//! [`signing`]) and answered with a JSON envelope carrying a vendor
//! `statusCode`. The client returns envelopes untouched; non-2xx HTTP
//! answers are reported as rejections and network or decoding failures as
//! transport errors.
//!
//! | Operation | Method | Path |
//! |-----------|--------|------|
//! | list devices | `GET` | `/v1.1/devices` |
//! | device status | `GET` | `/v1.1/devices/{id}/status` |
//! | send command | `POST` | `/v1.1/devices/{id}/commands` |
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `switchbridge-app` and `switchbridge-domain`.

mod client;
mod config;
mod error;
pub mod signing;

pub use client::OpenApiClient;
pub use config::OpenApiConfig;
pub use error::OpenApiError;
