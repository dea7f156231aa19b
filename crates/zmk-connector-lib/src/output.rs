//! Serializable result records.
//!
//! Field names and order are the JSON shape consumers parse; do not rename.

use serde::Serialize;

use crate::directory::DeviceDescriptor;
use crate::error::Result;
use crate::report::{FunctionsReport, KeyDataReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
}

impl From<DeviceDescriptor> for DeviceRecord {
    fn from(d: DeviceDescriptor) -> Self {
        DeviceRecord {
            manufacturer: d.manufacturer,
            product: d.product,
            serial: d.serial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeaturesRecord {
    pub protocol_revision: u8,
    pub keycount: u8,
    pub layer_count: u8,
    pub key_remap_support: bool,
}

impl From<FunctionsReport> for FeaturesRecord {
    fn from(r: FunctionsReport) -> Self {
        FeaturesRecord {
            protocol_revision: r.protocol_revision,
            keycount: r.keycount,
            layer_count: r.layer_count,
            key_remap_support: r.key_remap_support,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyDataRecord {
    pub behavior_id: u32,
    pub param1: u32,
    pub param2: u32,
}

impl From<KeyDataReport> for KeyDataRecord {
    fn from(r: KeyDataReport) -> Self {
        KeyDataRecord {
            behavior_id: r.behavior_id,
            param1: r.param1,
            param2: r.param2,
        }
    }
}

/// Build the device-list records from a listing.
pub fn device_records(devices: Vec<DeviceDescriptor>) -> Vec<DeviceRecord> {
    devices.into_iter().map(DeviceRecord::from).collect()
}

/// Render a record as JSON: one line by default, indented when `pretty`.
pub fn render_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let s = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(s)
}
