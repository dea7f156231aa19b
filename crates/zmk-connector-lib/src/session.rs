//! Settings session — one open device, one transaction at a time.
//!
//! The device keeps the "selected key" as state set by the last key-select
//! report on the connection, and the protocol has no transaction id. The
//! select and the fetch are therefore exposed only as a single call, and
//! every query borrows the session mutably so two transactions cannot
//! interleave on one handle.

use crate::error::Result;
use crate::report::{FunctionsReport, KeyDataReport, KeySelectRequest, ReportId};
use crate::text;
use crate::transport::{DeviceIds, FeatureChannel, HidTransport};

/// Exclusive owner of an open device. The device is closed when the
/// session is closed or dropped, on every exit path.
pub struct Session<C: FeatureChannel> {
    channel: C,
    serial: String,
}

impl<C: FeatureChannel> Session<C> {
    /// Open the device with the given serial.
    pub fn open<T>(transport: &T, ids: DeviceIds, serial: &str) -> Result<Self>
    where
        T: HidTransport<Channel = C>,
    {
        let native = text::to_native(serial)?;
        let channel = transport.open(ids, &native)?;
        log::debug!("opened {ids} serial {serial}");
        Ok(Session {
            channel,
            serial: serial.to_string(),
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Read the firmware capability report.
    pub fn query_functions(&mut self) -> Result<FunctionsReport> {
        let buf = self.read(ReportId::Functions)?;
        Ok(FunctionsReport::decode(&buf)?)
    }

    /// Select `key` and read back its binding.
    ///
    /// The select write completes before the fetch starts. If the select
    /// fails the fetch is not attempted.
    pub fn query_key_data(&mut self, key: KeySelectRequest) -> Result<KeyDataReport> {
        let select = key.encode();
        log::debug!("key select: {select:02X?}");
        self.channel.send_feature_report(&select)?;

        let buf = self.read(ReportId::KeyData)?;
        Ok(KeyDataReport::decode(&buf)?)
    }

    /// Release the device now instead of at end of scope.
    pub fn close(self) {
        drop(self);
    }

    /// Issue a bare read request for `id`, returning the bytes the device filled.
    fn read(&self, id: ReportId) -> Result<Vec<u8>> {
        let mut buf = id.request_buffer();
        let n = self.channel.get_feature_report(&mut buf)?;
        buf.truncate(n);
        log::debug!("{id} report: {buf:02X?}");
        Ok(buf)
    }
}

impl<C: FeatureChannel> Drop for Session<C> {
    fn drop(&mut self) {
        log::debug!("closing serial {}", self.serial);
        self.channel.close();
    }
}

/// Open `serial`, read its capabilities, close.
pub fn read_features<T: HidTransport>(
    transport: &T,
    ids: DeviceIds,
    serial: &str,
) -> Result<FunctionsReport> {
    let mut session = Session::open(transport, ids, serial)?;
    session.query_functions()
}

/// Open `serial`, read the binding of `key_index` on `layer_index`, close.
pub fn read_key<T: HidTransport>(
    transport: &T,
    ids: DeviceIds,
    serial: &str,
    layer_index: u8,
    key_index: u8,
) -> Result<KeyDataReport> {
    let mut session = Session::open(transport, ids, serial)?;
    session.query_key_data(KeySelectRequest::new(layer_index, key_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConnectorError;
    use crate::report::DecodeError;
    use crate::text::EncodingError;
    use crate::transport::TransportError;
    use crate::transport::mock::{Call, MockTransport};

    fn wide(s: &str) -> Vec<u32> {
        s.chars().map(u32::from).collect()
    }

    fn transport_with_device() -> MockTransport {
        let t = MockTransport::new();
        t.add_device("ZMK Project", "Corne", "ABC123");
        t
    }

    // ── open / close ──

    #[test]
    fn open_passes_wide_serial() {
        let t = transport_with_device();
        let session = Session::open(&t, DeviceIds::default(), "ABC123").unwrap();
        assert_eq!(session.serial(), "ABC123");
        session.close();
        assert_eq!(t.calls(), vec![Call::Open(wide("ABC123")), Call::Close]);
    }

    #[test]
    fn open_unknown_serial_is_not_found() {
        let t = transport_with_device();
        let err = Session::open(&t, DeviceIds::default(), "NOPE").err().unwrap();
        assert!(matches!(
            err,
            ConnectorError::Transport(TransportError::NotFound)
        ));
        assert!(!t.calls().contains(&Call::Close));
    }

    #[test]
    fn open_overlong_serial_fails_before_transport() {
        let t = transport_with_device();
        let serial = "S".repeat(300);
        let err = Session::open(&t, DeviceIds::default(), &serial).err().unwrap();
        assert!(matches!(
            err,
            ConnectorError::Encoding(EncodingError::TooLong { .. })
        ));
        assert!(t.calls().is_empty());
    }

    #[test]
    fn drop_closes_exactly_once() {
        let t = transport_with_device();
        {
            let _session = Session::open(&t, DeviceIds::default(), "ABC123").unwrap();
        }
        let closes = t.calls().iter().filter(|c| **c == Call::Close).count();
        assert_eq!(closes, 1);
    }

    // ── query_functions ──

    #[test]
    fn query_functions_decodes_response() {
        let t = transport_with_device();
        t.add_response(vec![3, 10, 4, 1, 1]);
        let mut session = Session::open(&t, DeviceIds::default(), "ABC123").unwrap();
        let f = session.query_functions().unwrap();
        assert_eq!(f.keycount, 10);
        assert_eq!(f.layer_count, 4);
        assert_eq!(f.protocol_revision, 1);
        assert!(f.key_remap_support);
    }

    #[test]
    fn query_functions_transport_failure() {
        let t = transport_with_device();
        t.state.fail_get.set(true);
        let err = read_features(&t, DeviceIds::default(), "ABC123").unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::Transport(TransportError::Io(_))
        ));
        assert_eq!(t.calls().last(), Some(&Call::Close));
    }

    #[test]
    fn query_functions_short_response_is_malformed() {
        let t = transport_with_device();
        t.add_response(vec![3, 10, 4]);
        let err = read_features(&t, DeviceIds::default(), "ABC123").unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::Malformed(DecodeError::WrongLength {
                expected: 5,
                actual: 3,
                ..
            })
        ));
        assert_eq!(t.calls().last(), Some(&Call::Close));
    }

    // ── query_key_data ──

    #[test]
    fn query_key_data_selects_then_fetches() {
        let t = transport_with_device();
        t.add_response(vec![5, 1, 0, 0, 0, 7, 0, 0, 0, 42, 0, 0, 0]);
        let data = read_key(&t, DeviceIds::default(), "ABC123", 2, 15).unwrap();
        assert_eq!(
            data,
            KeyDataReport {
                behavior_id: 1,
                param1: 7,
                param2: 42,
            }
        );
        assert_eq!(
            t.calls(),
            vec![
                Call::Open(wide("ABC123")),
                Call::SendFeature(vec![4, 2, 15]),
                Call::GetFeature(5),
                Call::Close,
            ]
        );
    }

    #[test]
    fn failed_select_skips_fetch() {
        let t = transport_with_device();
        t.add_response(vec![5, 1, 0, 0, 0, 7, 0, 0, 0, 42, 0, 0, 0]);
        t.state.fail_send.set(true);
        let err = read_key(&t, DeviceIds::default(), "ABC123", 0, 0).unwrap_err();
        assert!(matches!(err, ConnectorError::Transport(_)));
        assert!(!t.calls().iter().any(|c| matches!(c, Call::GetFeature(_))));
        assert_eq!(t.calls().last(), Some(&Call::Close));
    }

    #[test]
    fn failed_fetch_still_closes() {
        let t = transport_with_device();
        t.state.fail_get.set(true);
        let err = read_key(&t, DeviceIds::default(), "ABC123", 1, 1).unwrap_err();
        assert!(matches!(err, ConnectorError::Transport(_)));
        assert_eq!(
            t.calls(),
            vec![
                Call::Open(wide("ABC123")),
                Call::SendFeature(vec![4, 1, 1]),
                Call::GetFeature(5),
                Call::Close,
            ]
        );
    }

    #[test]
    fn repeated_queries_on_one_session_stay_paired() {
        let t = transport_with_device();
        t.add_response(vec![5, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        t.add_response(vec![5, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let mut session = Session::open(&t, DeviceIds::default(), "ABC123").unwrap();
        let a = session.query_key_data(KeySelectRequest::new(0, 1)).unwrap();
        let b = session.query_key_data(KeySelectRequest::new(0, 2)).unwrap();
        assert_eq!((a.behavior_id, b.behavior_id), (1, 2));
        let exchanges: Vec<Call> = t
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::SendFeature(_) | Call::GetFeature(_)))
            .collect();
        assert_eq!(
            exchanges,
            vec![
                Call::SendFeature(vec![4, 0, 1]),
                Call::GetFeature(5),
                Call::SendFeature(vec![4, 0, 2]),
                Call::GetFeature(5),
            ]
        );
    }
}
