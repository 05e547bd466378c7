//! # switchbridge-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `CloudApi`: status, commands and device listing over the vendor cloud
//!   - `BleLink`: advertisement reads and commands over Bluetooth
//!   - `EventPublisher`: fan-out of accessory events
//! - Provide one **accessory** adapter per device family, translating device
//!   state into HomeKit characteristics and writes into operations
//! - **Dispatch** operations over BLE with cloud fallback and bounded retry
//! - Expose the `AccessoryService` use-case (list, get, refresh, write with
//!   debounce)
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `switchbridge-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod accessories;
pub mod dispatcher;
pub mod event_bus;
pub mod ports;
pub mod services;
