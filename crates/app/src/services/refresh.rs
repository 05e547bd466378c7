//! Periodic accessory refresh.
//!
//! One task per device polls its state at the device's refresh rate, or the
//! bridge-wide default when the device has none. Devices whose connection is
//! disabled are never polled.

use std::sync::Arc;
use std::time::Duration;

use switchbridge_domain::connection::ConnectionType;
use switchbridge_domain::id::DeviceId;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ports::{BleLink, CloudApi, EventPublisher};
use crate::services::accessory_service::AccessoryService;

/// Spawn a refresh loop for every pollable device.
///
/// The first refresh happens immediately. A zero rate disables polling.
#[must_use]
pub fn spawn_all<C, B, P>(
    service: &Arc<AccessoryService<C, B, P>>,
    default_rate: Duration,
) -> Vec<JoinHandle<()>>
where
    C: CloudApi + Send + Sync + 'static,
    B: BleLink + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    service
        .devices()
        .filter(|device| device.connection != ConnectionType::Disabled)
        .filter_map(|device| {
            let rate = device.refresh_rate.unwrap_or(default_rate);
            if rate.is_zero() {
                tracing::info!(device_id = %device.id, "polling disabled");
                return None;
            }
            Some(spawn(Arc::clone(service), device.id.clone(), rate))
        })
        .collect()
}

/// Spawn a single refresh loop.
pub fn spawn<C, B, P>(
    service: Arc<AccessoryService<C, B, P>>,
    device_id: DeviceId,
    rate: Duration,
) -> JoinHandle<()>
where
    C: CloudApi + Send + Sync + 'static,
    B: BleLink + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    tracing::debug!(%device_id, rate_secs = rate.as_secs(), "refresh loop started");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(rate);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = service.refresh(&device_id).await {
                tracing::warn!(%device_id, %err, "refresh failed, retrying next interval");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use switchbridge_domain::connection::RetryPolicy;
    use switchbridge_domain::device::{Device, DeviceType};
    use switchbridge_domain::error::BridgeError;
    use switchbridge_domain::event::Event;

    use crate::dispatcher::Dispatcher;
    use crate::dispatcher::tests::{FakeBle, ScriptedCloud, plug};

    struct NullPublisher;

    impl EventPublisher for NullPublisher {
        async fn publish(&self, _event: Event) -> Result<(), BridgeError> {
            Ok(())
        }
    }

    type Service = AccessoryService<ScriptedCloud, FakeBle, NullPublisher>;

    fn service(devices: Vec<Device>) -> Arc<Service> {
        let dispatcher = Dispatcher::new(
            Some(ScriptedCloud::new(vec![Ok(100)])),
            None,
            RetryPolicy::new(1, Duration::from_secs(1)),
        );
        Arc::new(AccessoryService::new(
            devices,
            dispatcher,
            NullPublisher,
            Duration::ZERO,
        ))
    }

    fn cloud_calls(service: &Service) -> u32 {
        service
            .dispatcher()
            .cloud()
            .unwrap()
            .calls
            .load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn should_refresh_immediately_then_every_interval() {
        let service = service(vec![plug(ConnectionType::OpenApi)]);
        let handles = spawn_all(&service, Duration::from_secs(60));
        assert_eq!(handles.len(), 1);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(cloud_calls(&service), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(cloud_calls(&service), 3);

        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn should_skip_disabled_devices_and_zero_rates() {
        let meter = Device::builder()
            .id(DeviceId::new("112233445566").unwrap())
            .name("Meter")
            .device_type(DeviceType::Meter)
            .refresh_rate(Duration::ZERO)
            .build()
            .unwrap();
        let service = service(vec![plug(ConnectionType::Disabled), meter]);
        let handles = spawn_all(&service, Duration::from_secs(60));
        assert!(handles.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_polling_after_failures() {
        let dispatcher = Dispatcher::new(
            Some(ScriptedCloud::new(vec![Err("timeout")])),
            None,
            RetryPolicy::new(1, Duration::from_secs(1)),
        );
        let service: Arc<Service> = Arc::new(AccessoryService::new(
            [plug(ConnectionType::OpenApi)],
            dispatcher,
            NullPublisher,
            Duration::ZERO,
        ));
        let device_id = plug(ConnectionType::OpenApi).id;
        let handle = spawn(Arc::clone(&service), device_id, Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(cloud_calls(&service), 3);
        handle.abort();
    }
}
