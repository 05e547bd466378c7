//! # switchbridged
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (TOML file, environment overrides)
//! - Initialise logging
//! - Construct the cloud client (only with credentials), the BLE client
//!   (only when enabled) and the MQTT state mirror (only when enabled)
//! - Compare configured devices with the vendor account
//! - Spawn one refresh loop per device
//! - Build the axum router and serve until Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use switchbridge_adapter_ble::BleClient;
use switchbridge_adapter_http_axum::state::AppState;
use switchbridge_adapter_mqtt::StateMirror;
use switchbridge_adapter_openapi::OpenApiClient;
use switchbridge_app::dispatcher::Dispatcher;
use switchbridge_app::event_bus::InProcessEventBus;
use switchbridge_app::services::accessory_service::AccessoryService;
use switchbridge_app::services::{discovery, refresh};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const EVENT_BUS_CAPACITY: usize = 256;

type Service = AccessoryService<OpenApiClient, BleClient, Arc<InProcessEventBus>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_tracing(&config.logging.filter);

    let devices = config.devices()?;
    tracing::info!(devices = devices.len(), "configuration loaded");

    // Transports
    let cloud = if config.openapi.has_credentials() {
        Some(OpenApiClient::new(&config.openapi)?)
    } else {
        tracing::warn!("no cloud credentials configured, devices are reachable over BLE only");
        None
    };
    let ble = config.ble.enabled.then(|| BleClient::new(&config.ble));
    let dispatcher = Dispatcher::new(cloud, ble, config.retry_policy());

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(EVENT_BUS_CAPACITY));
    let mirror = config
        .mqtt
        .enabled
        .then(|| StateMirror::start(&config.mqtt, &devices, event_bus.subscribe()));
    tracing::debug!(subscribers = event_bus.subscriber_count(), "event bus ready");

    // Services
    let service: Arc<Service> = Arc::new(AccessoryService::new(
        devices,
        dispatcher,
        Arc::clone(&event_bus),
        config.push_rate(),
    ));

    if config.options.discover {
        discover(&service).await;
    }
    let pollers = refresh::spawn_all(&service, config.refresh_rate());

    // HTTP
    let app = switchbridge_adapter_http_axum::router::build(AppState::new(service));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "switchbridged listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for poller in pollers {
        poller.abort();
    }
    if let Some(mirror) = mirror {
        mirror.abort();
    }
    tracing::info!("switchbridged stopped");
    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?}: {err}, falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Log differences between the configuration and the vendor account.
async fn discover(service: &Service) {
    match service.dispatcher().list_account_devices().await {
        Ok(Some(listing)) => {
            let report = discovery::compare(service.devices(), &listing);
            if report.is_empty() {
                tracing::info!("configured devices match the account");
            } else {
                report.log();
            }
        }
        Ok(None) => tracing::debug!("device discovery skipped without credentials"),
        Err(err) => tracing::warn!(%err, "device discovery failed"),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
