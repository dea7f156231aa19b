//! Feature report codec.
//!
//! Every report is a fixed-size positional buffer: the report id byte, then
//! the body fields in declared order with no padding. Decoding checks the
//! exact length and the leading id before reading any field; reserved bits
//! are never interpreted.

use std::fmt;

use crate::protocol::*;

// ── Error type ──

/// A buffer that does not match the layout of its declared report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Zero-length buffer; there is no id byte to dispatch on.
    Empty,
    /// First byte is not a known settings report id.
    UnknownReportId(u8),
    /// Buffer length differs from the fixed size of the report.
    WrongLength {
        id: ReportId,
        expected: usize,
        actual: usize,
    },
    /// Buffer carries a different report id than the one requested.
    IdMismatch { expected: ReportId, actual: u8 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "empty report buffer"),
            DecodeError::UnknownReportId(b) => write!(f, "unknown report id 0x{b:02X}"),
            DecodeError::WrongLength {
                id,
                expected,
                actual,
            } => write!(f, "{id} report must be {expected} bytes, got {actual}"),
            DecodeError::IdMismatch { expected, actual } => write!(
                f,
                "expected {expected} report (id 0x{:02X}), got id 0x{actual:02X}",
                expected.byte()
            ),
        }
    }
}

impl std::error::Error for DecodeError {}

pub type Result<T> = std::result::Result<T, DecodeError>;

// ── Report ids ──

/// Discriminant carried in the first byte of every settings report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportId {
    Functions,
    KeySelect,
    KeyData,
    KeyCommit,
}

impl ReportId {
    pub const ALL: [ReportId; 4] = [
        ReportId::Functions,
        ReportId::KeySelect,
        ReportId::KeyData,
        ReportId::KeyCommit,
    ];

    /// Wire value of the id byte.
    pub const fn byte(self) -> u8 {
        match self {
            ReportId::Functions => REPORT_ID_FUNCTIONS,
            ReportId::KeySelect => REPORT_ID_KEY_SEL,
            ReportId::KeyData => REPORT_ID_KEY_DATA,
            ReportId::KeyCommit => REPORT_ID_KEY_COMMIT,
        }
    }

    /// Total buffer length, id byte included.
    pub const fn size(self) -> usize {
        match self {
            ReportId::Functions => FUNCTIONS_REPORT_SIZE,
            ReportId::KeySelect => KEY_SEL_REPORT_SIZE,
            ReportId::KeyData => KEY_DATA_REPORT_SIZE,
            ReportId::KeyCommit => KEY_COMMIT_REPORT_SIZE,
        }
    }

    /// Zero-filled buffer of the right size with the id byte set.
    ///
    /// This is the request form for reads: hidapi expects the caller to
    /// place the report id in byte 0 of the buffer it fills.
    pub fn request_buffer(self) -> Vec<u8> {
        let mut buf = vec![0u8; self.size()];
        buf[0] = self.byte();
        buf
    }
}

impl TryFrom<u8> for ReportId {
    type Error = DecodeError;

    fn try_from(b: u8) -> Result<Self> {
        ReportId::ALL
            .into_iter()
            .find(|id| id.byte() == b)
            .ok_or(DecodeError::UnknownReportId(b))
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportId::Functions => "functions",
            ReportId::KeySelect => "key-select",
            ReportId::KeyData => "key-data",
            ReportId::KeyCommit => "key-commit",
        };
        f.write_str(name)
    }
}

/// Validate length and id byte of `buf` against `id`.
fn check_frame(id: ReportId, buf: &[u8]) -> Result<()> {
    if buf.len() != id.size() {
        return Err(DecodeError::WrongLength {
            id,
            expected: id.size(),
            actual: buf.len(),
        });
    }
    if buf[0] != id.byte() {
        return Err(DecodeError::IdMismatch {
            expected: id,
            actual: buf[0],
        });
    }
    Ok(())
}

fn read_u32_le(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

// ── Report bodies ──

/// Firmware capabilities returned by the functions report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunctionsReport {
    pub keycount: u8,
    pub layer_count: u8,
    pub protocol_revision: u8,
    pub key_remap_support: bool,
}

impl FunctionsReport {
    pub fn encode(&self) -> [u8; FUNCTIONS_REPORT_SIZE] {
        let flags = if self.key_remap_support {
            FLAG_KEY_REMAP_SUPPORT
        } else {
            0
        };
        [
            REPORT_ID_FUNCTIONS,
            self.keycount,
            self.layer_count,
            self.protocol_revision,
            flags,
        ]
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_frame(ReportId::Functions, buf)?;
        Ok(FunctionsReport {
            keycount: buf[1],
            layer_count: buf[2],
            protocol_revision: buf[3],
            key_remap_support: buf[4] & FLAG_KEY_REMAP_SUPPORT != 0,
        })
    }
}

/// Which key the next key-data read refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeySelectRequest {
    pub layer_index: u8,
    pub key_index: u8,
}

impl KeySelectRequest {
    pub fn new(layer_index: u8, key_index: u8) -> Self {
        KeySelectRequest {
            layer_index,
            key_index,
        }
    }

    pub fn encode(&self) -> [u8; KEY_SEL_REPORT_SIZE] {
        [REPORT_ID_KEY_SEL, self.layer_index, self.key_index]
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_frame(ReportId::KeySelect, buf)?;
        Ok(KeySelectRequest::new(buf[1], buf[2]))
    }
}

/// Behavior binding of the selected key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyDataReport {
    pub behavior_id: u32,
    pub param1: u32,
    pub param2: u32,
}

impl KeyDataReport {
    pub fn encode(&self) -> [u8; KEY_DATA_REPORT_SIZE] {
        let mut buf = [0u8; KEY_DATA_REPORT_SIZE];
        buf[0] = REPORT_ID_KEY_DATA;
        buf[1..5].copy_from_slice(&self.behavior_id.to_le_bytes());
        buf[5..9].copy_from_slice(&self.param1.to_le_bytes());
        buf[9..13].copy_from_slice(&self.param2.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_frame(ReportId::KeyData, buf)?;
        Ok(KeyDataReport {
            behavior_id: read_u32_le(buf, 1),
            param1: read_u32_le(buf, 5),
            param2: read_u32_le(buf, 9),
        })
    }
}

/// Bare commit report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyCommitReport;

impl KeyCommitReport {
    pub fn encode(&self) -> [u8; KEY_COMMIT_REPORT_SIZE] {
        [REPORT_ID_KEY_COMMIT]
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_frame(ReportId::KeyCommit, buf)?;
        Ok(KeyCommitReport)
    }
}

// ── Tagged union ──

/// Any decoded settings report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Functions(FunctionsReport),
    KeySelect(KeySelectRequest),
    KeyData(KeyDataReport),
    KeyCommit(KeyCommitReport),
}

impl Report {
    pub fn id(&self) -> ReportId {
        match self {
            Report::Functions(_) => ReportId::Functions,
            Report::KeySelect(_) => ReportId::KeySelect,
            Report::KeyData(_) => ReportId::KeyData,
            Report::KeyCommit(_) => ReportId::KeyCommit,
        }
    }

    /// Encode to a buffer of exactly `self.id().size()` bytes.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Report::Functions(r) => r.encode().to_vec(),
            Report::KeySelect(r) => r.encode().to_vec(),
            Report::KeyData(r) => r.encode().to_vec(),
            Report::KeyCommit(r) => r.encode().to_vec(),
        }
    }
}

/// Decode `buf` as a report of kind `id`.
pub fn decode(id: ReportId, buf: &[u8]) -> Result<Report> {
    Ok(match id {
        ReportId::Functions => Report::Functions(FunctionsReport::decode(buf)?),
        ReportId::KeySelect => Report::KeySelect(KeySelectRequest::decode(buf)?),
        ReportId::KeyData => Report::KeyData(KeyDataReport::decode(buf)?),
        ReportId::KeyCommit => Report::KeyCommit(KeyCommitReport::decode(buf)?),
    })
}

/// Decode a buffer whose kind is taken from its own first byte.
pub fn decode_any(buf: &[u8]) -> Result<Report> {
    let Some(&first) = buf.first() else {
        return Err(DecodeError::Empty);
    };
    decode(ReportId::try_from(first)?, buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Functions ──

    #[test]
    fn functions_decodes_capability_response() {
        let r = FunctionsReport::decode(&[3, 10, 4, 1, 1]).unwrap();
        assert_eq!(
            r,
            FunctionsReport {
                keycount: 10,
                layer_count: 4,
                protocol_revision: 1,
                key_remap_support: true,
            }
        );
    }

    #[test]
    fn functions_ignores_reserved_flag_bits() {
        let r = FunctionsReport::decode(&[3, 1, 1, 1, 0xFE]).unwrap();
        assert!(!r.key_remap_support);
        let r = FunctionsReport::decode(&[3, 1, 1, 1, 0xFF]).unwrap();
        assert!(r.key_remap_support);
    }

    #[test]
    fn functions_encode_leaves_reserved_bits_clear() {
        let r = FunctionsReport {
            key_remap_support: true,
            ..Default::default()
        };
        assert_eq!(r.encode()[4], 0x01);
    }

    #[test]
    fn functions_boundaries_survive_encode_decode() {
        for (value, flag) in [(0u8, false), (0, true), (u8::MAX, false), (u8::MAX, true)] {
            let r = FunctionsReport {
                keycount: value,
                layer_count: value,
                protocol_revision: value,
                key_remap_support: flag,
            };
            assert_eq!(FunctionsReport::decode(&r.encode()).unwrap(), r);
        }
    }

    #[test]
    fn functions_rejects_short_buffer() {
        let err = FunctionsReport::decode(&[3, 10, 4, 1]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::WrongLength {
                id: ReportId::Functions,
                expected: 5,
                actual: 4,
            }
        );
    }

    #[test]
    fn functions_rejects_long_buffer() {
        assert!(matches!(
            FunctionsReport::decode(&[3, 10, 4, 1, 1, 0]),
            Err(DecodeError::WrongLength { actual: 6, .. })
        ));
    }

    #[test]
    fn functions_rejects_wrong_id() {
        assert_eq!(
            FunctionsReport::decode(&[5, 10, 4, 1, 1]).unwrap_err(),
            DecodeError::IdMismatch {
                expected: ReportId::Functions,
                actual: 5,
            }
        );
    }

    // ── KeySelect ──

    #[test]
    fn key_select_encodes_layer_then_key() {
        assert_eq!(KeySelectRequest::new(2, 15).encode(), [4, 2, 15]);
    }

    #[test]
    fn key_select_boundaries_survive_encode_decode() {
        for (layer, key) in [(0, 0), (u8::MAX, 0), (0, u8::MAX), (u8::MAX, u8::MAX)] {
            let r = KeySelectRequest::new(layer, key);
            assert_eq!(KeySelectRequest::decode(&r.encode()).unwrap(), r);
        }
    }

    // ── KeyData ──

    #[test]
    fn key_data_decodes_little_endian_fields() {
        let buf = [5, 1, 0, 0, 0, 7, 0, 0, 0, 42, 0, 0, 0];
        let r = KeyDataReport::decode(&buf).unwrap();
        assert_eq!(
            r,
            KeyDataReport {
                behavior_id: 1,
                param1: 7,
                param2: 42,
            }
        );
    }

    #[test]
    fn key_data_multibyte_values() {
        let r = KeyDataReport {
            behavior_id: 0x0102_0304,
            param1: 0,
            param2: u32::MAX,
        };
        let buf = r.encode();
        assert_eq!(&buf[1..5], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&buf[9..13], &[0xFF; 4]);
        assert_eq!(KeyDataReport::decode(&buf).unwrap(), r);
    }

    #[test]
    fn key_data_rejects_truncated_response() {
        assert!(matches!(
            KeyDataReport::decode(&[5, 1, 0, 0, 0, 7, 0, 0, 0]),
            Err(DecodeError::WrongLength {
                id: ReportId::KeyData,
                expected: 13,
                actual: 9,
            })
        ));
    }

    // ── KeyCommit ──

    #[test]
    fn key_commit_is_bare_id() {
        assert_eq!(KeyCommitReport.encode(), [6]);
        assert_eq!(KeyCommitReport::decode(&[6]).unwrap(), KeyCommitReport);
        assert!(KeyCommitReport::decode(&[6, 0]).is_err());
    }

    // ── ReportId / dispatch ──

    #[test]
    fn report_id_bytes_round_trip() {
        for id in ReportId::ALL {
            assert_eq!(ReportId::try_from(id.byte()).unwrap(), id);
        }
        assert_eq!(
            ReportId::try_from(0x07).unwrap_err(),
            DecodeError::UnknownReportId(0x07)
        );
    }

    #[test]
    fn request_buffer_has_id_and_exact_size() {
        for id in ReportId::ALL {
            let buf = id.request_buffer();
            assert_eq!(buf.len(), id.size());
            assert_eq!(buf[0], id.byte());
            assert!(buf[1..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn tagged_encode_matches_declared_size() {
        let reports = [
            Report::Functions(FunctionsReport::default()),
            Report::KeySelect(KeySelectRequest::default()),
            Report::KeyData(KeyDataReport::default()),
            Report::KeyCommit(KeyCommitReport),
        ];
        for r in reports {
            let buf = r.encode();
            assert_eq!(buf.len(), r.id().size());
            assert_eq!(decode(r.id(), &buf).unwrap(), r);
            assert_eq!(decode_any(&buf).unwrap(), r);
        }
    }

    #[test]
    fn decode_any_rejects_empty_and_unknown() {
        assert_eq!(decode_any(&[]).unwrap_err(), DecodeError::Empty);
        assert_eq!(
            decode_any(&[0x42, 0]).unwrap_err(),
            DecodeError::UnknownReportId(0x42)
        );
    }

    #[test]
    fn decode_error_display() {
        let e = DecodeError::WrongLength {
            id: ReportId::KeyData,
            expected: 13,
            actual: 2,
        };
        assert_eq!(e.to_string(), "key-data report must be 13 bytes, got 2");
        let e = DecodeError::IdMismatch {
            expected: ReportId::Functions,
            actual: 9,
        };
        assert_eq!(
            e.to_string(),
            "expected functions report (id 0x03), got id 0x09"
        );
    }
}
