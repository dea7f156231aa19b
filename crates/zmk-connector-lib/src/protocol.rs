//! Protocol constants for the ZMK HID settings interface.
//!
//! All settings traffic uses HID feature reports. Each report starts with a
//! one-byte report id that selects a fixed layout; multi-byte fields are
//! little-endian.

// ── USB identifiers ──

/// ZMK vendor ID (OpenMoko allocation).
pub const ZMK_VID: u16 = 0x1d50;

/// ZMK keyboard product ID.
pub const ZMK_PID: u16 = 0x615e;

// ── Report ids ──

/// Capability query: keycount, layers, protocol revision, flags.
pub const REPORT_ID_FUNCTIONS: u8 = 0x03;

/// Latch a (layer, key) selection on the device.
pub const REPORT_ID_KEY_SEL: u8 = 0x04;

/// Read back the binding of the latched key.
pub const REPORT_ID_KEY_DATA: u8 = 0x05;

/// Commit pending key changes. Recognised only; no command sends it.
pub const REPORT_ID_KEY_COMMIT: u8 = 0x06;

// ── Report sizes (report id byte included) ──

/// `[id][keycount][layers][protocol_rev][flags]`
pub const FUNCTIONS_REPORT_SIZE: usize = 5;

/// `[id][layer_index][key_index]`
pub const KEY_SEL_REPORT_SIZE: usize = 3;

/// `[id][behavior_id:u32][param1:u32][param2:u32]`
pub const KEY_DATA_REPORT_SIZE: usize = 13;

/// `[id]`
pub const KEY_COMMIT_REPORT_SIZE: usize = 1;

/// Bit 0 of the functions flags byte. Bits 1-7 are reserved.
pub const FLAG_KEY_REMAP_SUPPORT: u8 = 0x01;

// ── String limits ──

/// Upper bound on UTF-8 bytes produced from one device string.
pub const MAX_STRING_BYTES: usize = 256;

/// Upper bound on wide code units produced for an open-by-serial request.
pub const MAX_STRING_UNITS: usize = 256;
