//! # switchbridge-domain
//!
//! Pure domain model for the switchbridge SwitchBot-to-HomeKit bridge.
//!
//! ## Responsibilities
//! - Foundational types: device identifiers, MAC addresses, error conventions, timestamps
//! - Describe the **device catalogue** (vendor device types and what they can do)
//! - Translate blind positions between the vendor encoding and HomeKit (**mapping modes**)
//! - Define HomeKit **characteristics** and their values
//! - Define logical **operations** and their cloud **commands**
//! - Decode cloud **status** payloads and classify vendor status codes
//! - Decide the **connection plan** (BLE, cloud, or BLE with cloud fallback)
//! - Define **events** emitted when accessory state changes
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod accessory;
pub mod advertisement;
pub mod api;
pub mod command;
pub mod connection;
pub mod device;
pub mod event;
pub mod homekit;
pub mod mapping;
pub mod operation;
