//! Device listing with duplicate-interface collapsing.

use crate::error::Result;
use crate::text;
use crate::transport::{DeviceIds, HidTransport, RawDeviceEntry};

/// A physical keyboard, identified by its serial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
}

impl DeviceDescriptor {
    /// Convert every field of `entry`; the first failing field fails the whole descriptor.
    pub fn from_raw(entry: &RawDeviceEntry) -> Result<Self> {
        Ok(DeviceDescriptor {
            manufacturer: text::to_portable(&entry.manufacturer)?,
            product: text::to_portable(&entry.product)?,
            serial: text::to_portable(&entry.serial)?,
        })
    }
}

/// Drop entries whose serial equals the previous kept entry's serial.
///
/// hidapi lists each HID interface of a device as its own entry, and those
/// entries come out next to each other. Only adjacent repeats are collapsed;
/// the first entry of every run is kept and order is preserved.
pub fn dedup_adjacent(entries: &[RawDeviceEntry]) -> Vec<&RawDeviceEntry> {
    let mut kept: Vec<&RawDeviceEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(prev) = kept.last()
            && prev.serial == entry.serial
        {
            log::debug!("skipping duplicate interface {}", entry.path);
            continue;
        }
        kept.push(entry);
    }
    kept
}

/// List connected devices matching `ids`, one descriptor per physical device.
///
/// An empty list is not an error. Any string conversion failure fails the
/// whole listing.
pub fn list_devices<T: HidTransport>(
    transport: &T,
    ids: DeviceIds,
) -> Result<Vec<DeviceDescriptor>> {
    let entries = transport.enumerate(ids)?;
    dedup_adjacent(&entries)
        .into_iter()
        .map(DeviceDescriptor::from_raw)
        .collect()
}
