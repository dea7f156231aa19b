//! HID transport — traits + hidapi backend + in-memory mock.

use std::fmt;

use hidapi::{HidApi, HidDevice};

use crate::protocol::{ZMK_PID, ZMK_VID};
use crate::text::WideString;

// ── Error type ──

/// Transport-level failures.
///
/// String payloads follow the convention **"context: details"** where
/// *context* names the step (e.g. `"hidapi init"`, `"get feature 0x03"`)
/// and *details* is the underlying hidapi message.
#[derive(Debug)]
pub enum TransportError {
    NotFound,
    EnumerateFailed(String),
    OpenFailed(String),
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NotFound => write!(f, "ZMK device not found"),
            TransportError::EnumerateFailed(e) => write!(f, "Could not enumerate devices: {e}"),
            TransportError::OpenFailed(e) => write!(f, "Unable to open device: {e}"),
            TransportError::Io(e) => write!(f, "HID error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

pub type Result<T> = std::result::Result<T, TransportError>;

// ── Identity ──

/// USB vendor/product pair that selects settings-capable keyboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIds {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for DeviceIds {
    fn default() -> Self {
        DeviceIds {
            vendor_id: ZMK_VID,
            product_id: ZMK_PID,
        }
    }
}

impl fmt::Display for DeviceIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// One enumeration entry, strings still in platform wide form.
///
/// A composite keyboard shows up once per HID interface, so several entries
/// may describe the same physical device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDeviceEntry {
    pub path: String,
    pub manufacturer: WideString,
    pub product: WideString,
    pub serial: WideString,
}

// ── Traits ──

/// An open device that exchanges feature reports.
pub trait FeatureChannel {
    /// Read a feature report. `buf[0]` holds the report id on entry; the
    /// return value is the number of bytes written into `buf`, id included.
    fn get_feature_report(&self, buf: &mut [u8]) -> Result<usize>;

    /// Write a feature report; `data[0]` is the report id.
    fn send_feature_report(&self, data: &[u8]) -> Result<()>;

    /// Release the device. Called exactly once, by the owning session.
    fn close(&mut self) {}
}

/// Device enumeration and open.
pub trait HidTransport {
    type Channel: FeatureChannel;

    /// All entries matching `ids`, in the order the platform reports them.
    fn enumerate(&self, ids: DeviceIds) -> Result<Vec<RawDeviceEntry>>;

    /// Open the device whose serial equals `serial` (wide units).
    fn open(&self, ids: DeviceIds, serial: &[u32]) -> Result<Self::Channel>;
}

// ── hidapi backend ──

/// Widen a raw hidapi string (`wchar_t` is `i32` or `u16` by platform).
///
/// Units that do not fit a `u32` map to `u32::MAX`, which the string bridge
/// rejects as unrepresentable.
fn widen<T>(raw: Option<&[T]>) -> WideString
where
    T: Copy + TryInto<u32>,
{
    raw.map(|units| {
        units
            .iter()
            .map(|&u| u.try_into().unwrap_or(u32::MAX))
            .collect()
    })
    .unwrap_or_default()
}

fn matches_ids(info: &hidapi::DeviceInfo, ids: DeviceIds) -> bool {
    info.vendor_id() == ids.vendor_id && info.product_id() == ids.product_id
}

/// [`HidTransport`] backed by the system HID library.
pub struct HidApiTransport {
    api: HidApi,
}

impl HidApiTransport {
    pub fn new() -> Result<Self> {
        let api = HidApi::new()
            .map_err(|e| TransportError::EnumerateFailed(format!("hidapi init: {e}")))?;
        Ok(HidApiTransport { api })
    }
}

impl HidTransport for HidApiTransport {
    type Channel = HidChannel;

    fn enumerate(&self, ids: DeviceIds) -> Result<Vec<RawDeviceEntry>> {
        let entries: Vec<RawDeviceEntry> = self
            .api
            .device_list()
            .filter(|info| matches_ids(info, ids))
            .map(|info| RawDeviceEntry {
                path: info.path().to_string_lossy().into_owned(),
                manufacturer: widen(info.manufacturer_string_raw()),
                product: widen(info.product_string_raw()),
                serial: widen(info.serial_number_raw()),
            })
            .collect();
        log::debug!("{} HID entries for {ids}", entries.len());
        Ok(entries)
    }

    fn open(&self, ids: DeviceIds, serial: &[u32]) -> Result<HidChannel> {
        let info = self
            .api
            .device_list()
            .filter(|info| matches_ids(info, ids))
            .find(|info| widen(info.serial_number_raw()) == serial)
            .ok_or(TransportError::NotFound)?;
        log::debug!("opening {}", info.path().to_string_lossy());
        let device = self
            .api
            .open_path(info.path())
            .map_err(|e| TransportError::OpenFailed(format!("open_path: {e}")))?;
        Ok(HidChannel { device })
    }
}

/// Open hidapi device. The handle is released when the channel is dropped.
pub struct HidChannel {
    device: HidDevice,
}

impl FeatureChannel for HidChannel {
    fn get_feature_report(&self, buf: &mut [u8]) -> Result<usize> {
        let id = buf.first().copied().unwrap_or_default();
        self.device
            .get_feature_report(buf)
            .map_err(|e| TransportError::Io(format!("get feature 0x{id:02X}: {e}")))
    }

    fn send_feature_report(&self, data: &[u8]) -> Result<()> {
        let id = data.first().copied().unwrap_or_default();
        self.device
            .send_feature_report(data)
            .map_err(|e| TransportError::Io(format!("send feature 0x{id:02X}: {e}")))
    }
}

// ── Mock transport for testing ──

/// In-memory transport for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    /// One recorded transport interaction.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Enumerate,
        Open(WideString),
        GetFeature(u8),
        SendFeature(Vec<u8>),
        Close,
    }

    /// State shared between the transport and every channel it opens.
    #[derive(Default)]
    pub struct MockState {
        /// Every call, in order.
        pub calls: RefCell<Vec<Call>>,
        /// Queued get-feature responses, keyed by report id.
        pub responses: RefCell<HashMap<u8, Vec<Vec<u8>>>>,
        /// If true, `send_feature_report` fails.
        pub fail_send: Cell<bool>,
        /// If true, `get_feature_report` fails.
        pub fail_get: Cell<bool>,
    }

    pub struct MockTransport {
        /// Entries returned by `enumerate`, in order.
        pub devices: RefCell<Vec<RawDeviceEntry>>,
        /// If true, `enumerate` fails.
        pub fail_enumerate: Cell<bool>,
        pub state: Rc<MockState>,
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockTransport {
        pub fn new() -> Self {
            MockTransport {
                devices: RefCell::new(Vec::new()),
                fail_enumerate: Cell::new(false),
                state: Rc::new(MockState::default()),
            }
        }

        /// Append an enumeration entry built from UTF-8 strings.
        pub fn add_device(&self, manufacturer: &str, product: &str, serial: &str) {
            let index = self.devices.borrow().len();
            self.devices.borrow_mut().push(RawDeviceEntry {
                path: format!("mock://hid/{index}"),
                manufacturer: manufacturer.chars().map(u32::from).collect(),
                product: product.chars().map(u32::from).collect(),
                serial: serial.chars().map(u32::from).collect(),
            });
        }

        /// Queue a get-feature response; the report id is taken from byte 0.
        pub fn add_response(&self, response: Vec<u8>) {
            let id = response.first().copied().unwrap_or_default();
            self.state
                .responses
                .borrow_mut()
                .entry(id)
                .or_default()
                .push(response);
        }

        /// Snapshot of the recorded calls.
        pub fn calls(&self) -> Vec<Call> {
            self.state.calls.borrow().clone()
        }

        fn record(&self, call: Call) {
            self.state.calls.borrow_mut().push(call);
        }
    }

    impl HidTransport for MockTransport {
        type Channel = MockChannel;

        fn enumerate(&self, _ids: DeviceIds) -> Result<Vec<RawDeviceEntry>> {
            self.record(Call::Enumerate);
            if self.fail_enumerate.get() {
                return Err(TransportError::EnumerateFailed(
                    "mock: enumerate failure injected".into(),
                ));
            }
            Ok(self.devices.borrow().clone())
        }

        fn open(&self, _ids: DeviceIds, serial: &[u32]) -> Result<MockChannel> {
            self.record(Call::Open(serial.to_vec()));
            if !self.devices.borrow().iter().any(|d| d.serial == serial) {
                return Err(TransportError::NotFound);
            }
            Ok(MockChannel {
                state: Rc::clone(&self.state),
            })
        }
    }

    pub struct MockChannel {
        state: Rc<MockState>,
    }

    impl FeatureChannel for MockChannel {
        fn get_feature_report(&self, buf: &mut [u8]) -> Result<usize> {
            let id = buf.first().copied().unwrap_or_default();
            self.state.calls.borrow_mut().push(Call::GetFeature(id));
            if self.state.fail_get.get() {
                return Err(TransportError::Io("mock: get feature failure injected".into()));
            }
            let mut responses = self.state.responses.borrow_mut();
            let Some(response) = responses.get_mut(&id).filter(|r| !r.is_empty()) else {
                return Err(TransportError::Io(format!(
                    "no mock response for report 0x{id:02X}"
                )));
            };
            let response = response.remove(0);
            let n = response.len().min(buf.len());
            buf[..n].copy_from_slice(&response[..n]);
            Ok(n)
        }

        fn send_feature_report(&self, data: &[u8]) -> Result<()> {
            self.state
                .calls
                .borrow_mut()
                .push(Call::SendFeature(data.to_vec()));
            if self.state.fail_send.get() {
                return Err(TransportError::Io("mock: send feature failure injected".into()));
            }
            Ok(())
        }

        fn close(&mut self) {
            self.state.calls.borrow_mut().push(Call::Close);
        }
    }
}
