use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use shared::types::DeviceEntry;
use crate::network;

/// A stored registration. `external_address` is already normalized and
/// is never handed out through the listing views.
#[derive(Debug, Clone)]
struct DeviceRecord {
    external_address: String,
    internal_address: IpAddr,
    identifier: Option<String>,
    name: String,
    tags: BTreeMap<String, String>,
    added: DateTime<Utc>,
}

/// What a record is matched on within its partition.
#[derive(Debug, PartialEq, Eq)]
enum DeviceKey<'a> {
    Id(&'a str),
    Address(IpAddr),
}

fn device_key(identifier: Option<&str>, internal_address: IpAddr) -> DeviceKey<'_> {
    match identifier {
        Some(id) if !id.is_empty() => DeviceKey::Id(id),
        _ => DeviceKey::Address(internal_address),
    }
}

impl DeviceRecord {
    fn key(&self) -> DeviceKey<'_> {
        device_key(self.identifier.as_deref(), self.internal_address)
    }

    fn to_entry(&self) -> DeviceEntry {
        DeviceEntry {
            address: self.internal_address,
            id: self.identifier.clone(),
            name: self.name.clone(),
            tags: self.tags.clone(),
            added: self.added,
        }
    }
}

/// Outcome of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    Updated,
}

/// Handle to the in-memory device directory.
///
/// Every operation holds the single lock for its whole duration, so calls
/// are linearized. Clones share the same underlying records.
#[derive(Clone, Default)]
pub struct DeviceRegistry {
    devices: Arc<Mutex<Vec<DeviceRecord>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a device or refresh the one with the same identity under the
    /// same (normalized) external address.
    pub fn upsert(
        &self,
        external_address: &str,
        internal_address: IpAddr,
        identifier: Option<String>,
        name: String,
        tags: BTreeMap<String, String>,
    ) -> Registration {
        self.upsert_at(Utc::now(), external_address, internal_address, identifier, name, tags)
    }

    pub(crate) fn upsert_at(
        &self,
        now: DateTime<Utc>,
        external_address: &str,
        internal_address: IpAddr,
        identifier: Option<String>,
        name: String,
        tags: BTreeMap<String, String>,
    ) -> Registration {
        let external_address = network::normalize(external_address);
        let identifier = identifier.filter(|id| !id.is_empty());
        let key = device_key(identifier.as_deref(), internal_address);

        let mut devices = self.devices.lock();
        let existing = devices
            .iter_mut()
            .find(|d| d.external_address == external_address && d.key() == key);

        match existing {
            Some(device) => {
                device.name = name;
                device.internal_address = internal_address;
                device.tags = tags;
                device.added = now.max(device.added);
                tracing::debug!(
                    "Device updated: {} from {}",
                    internal_address,
                    external_address
                );
                Registration::Updated
            }
            None => {
                tracing::debug!(
                    "Device added: {} ({}) from {}",
                    internal_address,
                    name,
                    external_address
                );
                devices.push(DeviceRecord {
                    external_address,
                    internal_address,
                    identifier,
                    name,
                    tags,
                    added: now,
                });
                Registration::Created
            }
        }
    }

    /// Devices registered from `external_address`'s partition, in
    /// registration order.
    pub fn list_for(&self, external_address: &str) -> Vec<DeviceEntry> {
        let external_address = network::normalize(external_address);
        let devices = self.devices.lock();
        let found: Vec<DeviceEntry> = devices
            .iter()
            .filter(|d| d.external_address == external_address)
            .map(DeviceRecord::to_entry)
            .collect();
        tracing::debug!("Devices for {}: {}", external_address, found.len());
        found
    }

    /// Every device across all partitions
    pub fn list_all(&self) -> Vec<DeviceEntry> {
        self.devices.lock().iter().map(DeviceRecord::to_entry).collect()
    }

    pub fn len(&self) -> usize {
        self.devices.lock().len()
    }

    /// Remove every device whose last registration is more than `lifetime`
    /// ago. Returns the number removed.
    pub fn evict_older_than(&self, lifetime: Duration) -> usize {
        self.evict_older_than_at(Utc::now(), lifetime)
    }

    pub(crate) fn evict_older_than_at(&self, now: DateTime<Utc>, lifetime: Duration) -> usize {
        let mut devices = self.devices.lock();
        let before = devices.len();
        devices.retain(|d| now.signed_duration_since(d.added) <= lifetime);
        before - devices.len()
    }
}
