//! Startup comparison between the configured devices and the vendor account.

use std::collections::BTreeSet;

use switchbridge_domain::api::{DeviceListing, ListedDevice};
use switchbridge_domain::device::Device;
use switchbridge_domain::id::DeviceId;

/// Differences between configuration and account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryReport {
    /// Configured devices the account does not list.
    pub missing: Vec<DeviceId>,
    /// Account devices with no configuration entry.
    pub unconfigured: Vec<ListedDevice>,
}

impl DiscoveryReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unconfigured.is_empty()
    }

    /// Log every difference at `warn` for missing devices and `info` for
    /// unconfigured ones.
    pub fn log(&self) {
        for device_id in &self.missing {
            tracing::warn!(%device_id, "configured device not found on the account");
        }
        for listed in &self.unconfigured {
            tracing::info!(
                device_id = %listed.device_id,
                name = %listed.device_name,
                device_type = listed.device_type.as_deref().unwrap_or("unknown"),
                supported = listed.known_type().is_some(),
                "account device is not configured"
            );
        }
    }
}

/// Compare configured devices with the account listing.
///
/// Listed ids are normalised the same way configured ids are, so case
/// differences do not count. Infrared remotes are ignored.
#[must_use]
pub fn compare<'a>(
    devices: impl IntoIterator<Item = &'a Device>,
    listing: &DeviceListing,
) -> DiscoveryReport {
    let configured: BTreeSet<&DeviceId> = devices.into_iter().map(|d| &d.id).collect();
    let listed: BTreeSet<DeviceId> = listing
        .device_list
        .iter()
        .filter_map(|d| DeviceId::new(&d.device_id).ok())
        .collect();

    let missing = configured
        .iter()
        .filter(|id| !listed.contains(**id))
        .map(|id| (*id).clone())
        .collect();
    let unconfigured = listing
        .device_list
        .iter()
        .filter(|d| DeviceId::new(&d.device_id).is_ok_and(|id| !configured.contains(&id)))
        .cloned()
        .collect();

    DiscoveryReport {
        missing,
        unconfigured,
    }
}
