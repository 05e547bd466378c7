//! Accessory service: use-cases behind HomeKit reads and writes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use switchbridge_domain::accessory::AccessorySnapshot;
use switchbridge_domain::connection::Transport;
use switchbridge_domain::device::Device;
use switchbridge_domain::error::{BridgeError, NotFoundError};
use switchbridge_domain::event::{Event, EventKind};
use switchbridge_domain::homekit::{Characteristic, CharacteristicValue};
use switchbridge_domain::id::DeviceId;
use switchbridge_domain::time::{Timestamp, now};

use crate::accessories::Accessory;
use crate::dispatcher::{Dispatcher, StatusReport};
use crate::ports::{BleLink, CloudApi, EventPublisher};

/// What happened to a characteristic write once the debounce window closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The operation reached the device over this transport.
    Pushed(Transport),
    /// A newer write to the same accessory superseded this one.
    Coalesced,
}

struct SlotState {
    accessory: Accessory,
    /// Accessory as it was before the first write not yet delivered.
    /// Restored when the push fails.
    before_pending: Option<Accessory>,
    last_updated: Option<Timestamp>,
    source: Option<Transport>,
}

struct Slot {
    device: Device,
    state: Mutex<SlotState>,
    /// Bumped on every write; a pending push only proceeds if it still
    /// holds the latest value.
    generation: AtomicU64,
}

impl Slot {
    fn new(device: Device) -> Self {
        let accessory = Accessory::for_device(&device);
        Self {
            device,
            state: Mutex::new(SlotState {
                accessory,
                before_pending: None,
                last_updated: None,
                source: None,
            }),
            generation: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forget the pre-write state once the latest write was delivered.
    fn settle_pending(&self, generation: u64) {
        let mut state = self.lock();
        if self.generation.load(Ordering::SeqCst) == generation {
            state.before_pending = None;
        }
    }

    /// Undo optimistic writes after a failed push, unless a newer write is
    /// already pending.
    fn roll_back(&self, generation: u64) -> Option<AccessorySnapshot> {
        let mut state = self.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            return None;
        }
        state.accessory = state.before_pending.take()?;
        tracing::debug!(device_id = %self.device.id, "write rolled back");
        Some(self.snapshot(&state))
    }

    fn snapshot(&self, state: &SlotState) -> AccessorySnapshot {
        AccessorySnapshot {
            device_id: self.device.id.clone(),
            name: self.device.name.clone(),
            device_type: self.device.device_type,
            kind: state.accessory.kind(),
            characteristics: state.accessory.characteristics(),
            last_updated: state.last_updated,
            source: state.source,
        }
    }
}

/// Application service holding one accessory per configured device.
pub struct AccessoryService<C, B, P> {
    dispatcher: Dispatcher<C, B>,
    publisher: P,
    slots: BTreeMap<DeviceId, Slot>,
    push_rate: Duration,
}

impl<C, B, P> AccessoryService<C, B, P>
where
    C: CloudApi + Sync,
    B: BleLink + Sync,
    P: EventPublisher + Sync,
{
    /// Create the service. Devices sharing an id keep the last definition.
    pub fn new(
        devices: impl IntoIterator<Item = Device>,
        dispatcher: Dispatcher<C, B>,
        publisher: P,
        push_rate: Duration,
    ) -> Self {
        let slots = devices
            .into_iter()
            .map(|device| (device.id.clone(), Slot::new(device)))
            .collect();
        Self {
            dispatcher,
            publisher,
            slots,
            push_rate,
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher<C, B> {
        &self.dispatcher
    }

    /// Configured devices, ordered by id.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.slots.values().map(|slot| &slot.device)
    }

    fn slot(&self, id: &DeviceId) -> Result<&Slot, BridgeError> {
        self.slots.get(id).ok_or_else(|| {
            NotFoundError {
                entity: "Accessory",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Snapshots of every accessory.
    #[must_use]
    pub fn list(&self) -> Vec<AccessorySnapshot> {
        self.slots
            .values()
            .map(|slot| slot.snapshot(&slot.lock()))
            .collect()
    }

    /// Snapshot of one accessory.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotFound`] for an unknown device id.
    pub fn get(&self, id: &DeviceId) -> Result<AccessorySnapshot, BridgeError> {
        let slot = self.slot(id)?;
        Ok(slot.snapshot(&slot.lock()))
    }

    /// Fetch the device state and fold it into the accessory.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotFound`] for an unknown device id, or the
    /// dispatcher error when no transport delivered a status.
    #[tracing::instrument(skip(self), fields(device_id = %id))]
    pub async fn refresh(&self, id: &DeviceId) -> Result<AccessorySnapshot, BridgeError> {
        let slot = self.slot(id)?;
        let report = self.dispatcher.fetch_status(&slot.device).await?;
        let snapshot = {
            let mut state = slot.lock();
            match &report {
                StatusReport::Ble(advertisement) => {
                    state.accessory.apply_advertisement(advertisement);
                }
                StatusReport::Cloud(status) => state.accessory.apply_status(status),
            }
            state.last_updated = Some(now());
            state.source = Some(report.transport());
            slot.snapshot(&state)
        };
        tracing::debug!(transport = %report.transport(), "accessory refreshed");
        self.publish_state(&snapshot).await;
        Ok(snapshot)
    }

    /// Apply a HomeKit write and push it once the debounce window closes.
    ///
    /// The write is reflected locally and published right away. The push
    /// waits for the push rate; if another write to the same accessory
    /// arrives meanwhile, only the newer one is pushed. A failed push puts
    /// the accessory back to its state before the undelivered writes.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotFound`] for an unknown device id, a
    /// validation or unsupported error when the write is refused, or the
    /// dispatcher error when the push failed.
    #[tracing::instrument(skip(self, value), fields(device_id = %id))]
    pub async fn set_characteristic(
        &self,
        id: &DeviceId,
        characteristic: Characteristic,
        value: CharacteristicValue,
    ) -> Result<WriteOutcome, BridgeError> {
        let slot = self.slot(id)?;
        let (operation, generation, snapshot) = {
            let mut state = slot.lock();
            let previous = state.accessory.clone();
            let operation = state.accessory.handle_write(characteristic, value)?;
            if state.before_pending.is_none() {
                state.before_pending = Some(previous);
            }
            let generation = slot.generation.fetch_add(1, Ordering::SeqCst) + 1;
            (operation, generation, slot.snapshot(&state))
        };
        self.publish_state(&snapshot).await;

        tokio::time::sleep(self.push_rate).await;
        if slot.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(operation = operation.name(), "write coalesced");
            return Ok(WriteOutcome::Coalesced);
        }

        match self.dispatcher.execute(&slot.device, operation).await {
            Ok(transport) => {
                slot.settle_pending(generation);
                self.publish(
                    EventKind::CommandSucceeded,
                    id,
                    serde_json::json!({
                        "operation": operation,
                        "transport": transport,
                    }),
                )
                .await;
                if let Err(err) = self.refresh(id).await {
                    tracing::debug!(%err, "refresh after push failed");
                }
                Ok(WriteOutcome::Pushed(transport))
            }
            Err(err) => {
                tracing::error!(%err, operation = operation.name(), "push failed");
                self.publish(
                    EventKind::CommandFailed,
                    id,
                    serde_json::json!({
                        "operation": operation,
                        "error": err.to_string(),
                    }),
                )
                .await;
                if let Some(snapshot) = slot.roll_back(generation) {
                    self.publish_state(&snapshot).await;
                }
                Err(err)
            }
        }
    }

    async fn publish_state(&self, snapshot: &AccessorySnapshot) {
        let data = serde_json::to_value(snapshot).unwrap_or_default();
        self.publish(EventKind::StateUpdated, &snapshot.device_id, data)
            .await;
    }

    async fn publish(&self, kind: EventKind, id: &DeviceId, data: serde_json::Value) {
        let event = Event::new(kind, id.clone(), data);
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(%err, kind = kind.as_str(), "failed to publish event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use switchbridge_domain::api::DeviceStatus;
    use switchbridge_domain::command::DeviceCommand;
    use switchbridge_domain::connection::{ConnectionType, RetryPolicy};
    use switchbridge_domain::device::DeviceType;
    use switchbridge_domain::mapping::MappingMode;

    use crate::dispatcher::tests::{FakeBle, ScriptedCloud, plug};

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<Event>>,
    }

    impl RecordingPublisher {
        fn kinds(&self) -> Vec<EventKind> {
            self.events.lock().unwrap().iter().map(|e| e.kind).collect()
        }
    }

    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, event: Event) -> Result<(), BridgeError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    type Service = AccessoryService<ScriptedCloud, FakeBle, Arc<RecordingPublisher>>;

    fn make_service(cloud: ScriptedCloud) -> (Service, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::default());
        let dispatcher = Dispatcher::new(
            Some(cloud),
            None,
            RetryPolicy::new(3, Duration::from_secs(1)),
        );
        let service = AccessoryService::new(
            [plug(ConnectionType::OpenApi)],
            dispatcher,
            Arc::clone(&publisher),
            Duration::from_millis(100),
        );
        (service, publisher)
    }

    fn plug_on() -> DeviceStatus {
        DeviceStatus {
            power: Some("on".to_string()),
            ..DeviceStatus::default()
        }
    }

    fn plug_id() -> DeviceId {
        DeviceId::new("AABBCCDDEEFF").unwrap()
    }

    fn sent_commands(service: &Service) -> Vec<DeviceCommand> {
        service
            .dispatcher()
            .cloud()
            .unwrap()
            .commands
            .lock()
            .unwrap()
            .clone()
    }

    #[tokio::test(start_paused = true)]
    async fn should_list_configured_accessories() {
        let (service, _) = make_service(ScriptedCloud::new(vec![Ok(100)]));
        let list = service.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].device_id, plug_id());
        assert!(list[0].last_updated.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_return_not_found_for_unknown_accessory() {
        let (service, _) = make_service(ScriptedCloud::new(vec![Ok(100)]));
        let err = service
            .get(&DeviceId::new("000000000000").unwrap())
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn should_apply_status_on_refresh() {
        let (service, publisher) =
            make_service(ScriptedCloud::new(vec![Ok(100)]).with_status(plug_on()));
        let snapshot = service.refresh(&plug_id()).await.unwrap();
        assert_eq!(
            snapshot.get(Characteristic::On),
            Some(CharacteristicValue::Bool(true))
        );
        assert_eq!(snapshot.source, Some(Transport::OpenApi));
        assert!(snapshot.last_updated.is_some());
        assert_eq!(publisher.kinds(), vec![EventKind::StateUpdated]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_push_write_after_debounce() {
        let (service, publisher) =
            make_service(ScriptedCloud::new(vec![Ok(100)]).with_status(plug_on()));
        let outcome = service
            .set_characteristic(&plug_id(), Characteristic::On, CharacteristicValue::Bool(true))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Pushed(Transport::OpenApi));
        assert_eq!(sent_commands(&service), vec![DeviceCommand::simple("turnOn")]);
        assert_eq!(
            publisher.kinds(),
            vec![
                EventKind::StateUpdated,
                EventKind::CommandSucceeded,
                EventKind::StateUpdated,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_coalesce_writes_within_push_rate() {
        let (service, _) = make_service(ScriptedCloud::new(vec![Ok(100)]));
        let id = plug_id();
        let (first, second) = tokio::join!(
            service.set_characteristic(&id, Characteristic::On, CharacteristicValue::Bool(true)),
            service.set_characteristic(&id, Characteristic::On, CharacteristicValue::Bool(false)),
        );
        assert_eq!(first.unwrap(), WriteOutcome::Coalesced);
        assert_eq!(second.unwrap(), WriteOutcome::Pushed(Transport::OpenApi));
        assert_eq!(sent_commands(&service), vec![DeviceCommand::simple("turnOff")]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_push_writes_spaced_beyond_push_rate() {
        let (service, _) = make_service(ScriptedCloud::new(vec![Ok(100)]));
        let id = plug_id();
        service
            .set_characteristic(&id, Characteristic::On, CharacteristicValue::Bool(true))
            .await
            .unwrap();
        service
            .set_characteristic(&id, Characteristic::On, CharacteristicValue::Bool(false))
            .await
            .unwrap();
        assert_eq!(
            sent_commands(&service),
            vec![DeviceCommand::simple("turnOn"), DeviceCommand::simple("turnOff")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_publish_failure_when_push_rejected() {
        let (service, publisher) = make_service(ScriptedCloud::new(vec![Ok(161)]));
        let err = service
            .set_characteristic(&plug_id(), Characteristic::On, CharacteristicValue::Bool(true))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Rejected { status_code: 161, .. }));
        assert_eq!(
            publisher.kinds(),
            vec![
                EventKind::StateUpdated,
                EventKind::CommandFailed,
                EventKind::StateUpdated,
            ]
        );
        let events = publisher.events.lock().unwrap();
        assert_eq!(events[1].data["operation"]["operation"], "turn_on");
        assert_eq!(events[2].data["characteristics"]["On"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn should_roll_back_blind_motion_when_push_rejected() {
        let publisher = Arc::new(RecordingPublisher::default());
        let blind = Device::builder()
            .id(DeviceId::new("C1A2B3C4D5E6").unwrap())
            .name("Office blind")
            .device_type(DeviceType::BlindTilt)
            .connection(ConnectionType::OpenApi)
            .mapping_mode(MappingMode::DownAndUp)
            .build()
            .unwrap();
        let id = blind.id.clone();
        let service: Service = AccessoryService::new(
            [blind],
            Dispatcher::new(
                Some(ScriptedCloud::new(vec![Ok(161)])),
                None,
                RetryPolicy::new(1, Duration::ZERO),
            ),
            Arc::clone(&publisher),
            Duration::from_millis(100),
        );

        let err = service
            .set_characteristic(&id, Characteristic::TargetPosition, CharacteristicValue::Int(90))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Rejected { status_code: 161, .. }));

        let snapshot = service.get(&id).unwrap();
        assert_ne!(
            snapshot.get(Characteristic::TargetPosition),
            Some(CharacteristicValue::Int(90))
        );
        assert_eq!(
            snapshot.get(Characteristic::TargetPosition),
            snapshot.get(Characteristic::CurrentPosition)
        );
        assert_eq!(
            snapshot.get(Characteristic::PositionState),
            Some(CharacteristicValue::Int(2))
        );
        assert_eq!(publisher.kinds().last(), Some(&EventKind::StateUpdated));
    }

    #[tokio::test(start_paused = true)]
    async fn should_clear_pending_state_after_delivery() {
        let (service, _) = make_service(ScriptedCloud::new(vec![Ok(100)]));
        let id = plug_id();
        let (first, second) = tokio::join!(
            service.set_characteristic(&id, Characteristic::On, CharacteristicValue::Bool(true)),
            service.set_characteristic(&id, Characteristic::On, CharacteristicValue::Bool(true)),
        );
        assert_eq!(first.unwrap(), WriteOutcome::Coalesced);
        assert_eq!(second.unwrap(), WriteOutcome::Pushed(Transport::OpenApi));
        assert!(service.slot(&id).unwrap().lock().before_pending.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_refuse_invalid_write_without_side_effects() {
        let (service, publisher) = make_service(ScriptedCloud::new(vec![Ok(100)]));
        let err = service
            .set_characteristic(&plug_id(), Characteristic::On, CharacteristicValue::Int(7))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Validation(_)));
        assert!(publisher.kinds().is_empty());
        let cloud = service.dispatcher().cloud().unwrap();
        assert_eq!(cloud.calls.load(Ordering::SeqCst), 0);
    }
}
