//! The identity-keyed device map.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use homeguard_core::{identity_key, DeviceRecord};
use serde::{Deserialize, Deserializer, Serialize};

/// Mapping from device identity to its record.
///
/// Serializes as a plain JSON object keyed by identity, in identity order.
/// Keys are canonicalized with [`identity_key`] on every access, so lookups
/// ignore the case of hardware addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DeviceRegistry {
    devices: BTreeMap<String, DeviceRecord>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, identity: &str) -> Option<&DeviceRecord> {
        self.devices.get(&identity_key(identity))
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.devices.contains_key(&identity_key(identity))
    }

    /// Seed a record directly, replacing any record under the same identity.
    pub fn insert(&mut self, identity: &str, record: DeviceRecord) {
        self.devices.insert(identity_key(identity), record);
    }

    /// Iterate `(identity, record)` pairs in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceRecord)> {
        self.devices.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn online_count(&self) -> usize {
        self.devices.values().filter(|d| d.is_online()).count()
    }

    pub(crate) fn get_mut(&mut self, identity: &str) -> Option<&mut DeviceRecord> {
        self.devices.get_mut(&identity_key(identity))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut DeviceRecord)> {
        self.devices.iter_mut()
    }
}

/// Identities that only differ in case collapse into one record; the most
/// recently seen one wins.
impl FromIterator<(String, DeviceRecord)> for DeviceRegistry {
    fn from_iter<I: IntoIterator<Item = (String, DeviceRecord)>>(iter: I) -> Self {
        let mut devices = BTreeMap::new();
        for (identity, record) in iter {
            match devices.entry(identity_key(&identity)) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(mut slot) => {
                    if record.last_seen > slot.get().last_seen {
                        slot.insert(record);
                    }
                }
            }
        }
        Self { devices }
    }
}

impl<'de> Deserialize<'de> for DeviceRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, DeviceRecord>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}
