//! Conversion between HID wide strings and UTF-8.
//!
//! hidapi reports manufacturer, product and serial strings as `wchar_t`
//! arrays: UTF-32 on Unix, UTF-16 on Windows. These helpers work on the raw
//! code units widened to `u32` so one implementation covers both.
//!
//! Both directions are bounded and fail instead of substituting. Every call
//! owns its decoder state; a pending surrogate can never carry over into the
//! next conversion.

use std::fmt;

use crate::protocol::{MAX_STRING_BYTES, MAX_STRING_UNITS};

/// Platform `wchar_t` code units, widened.
pub type WideString = Vec<u32>;

// ── Error type ──

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Code unit at `index` has no Unicode scalar value.
    Unrepresentable { index: usize, unit: u32 },
    /// Input ended in the middle of a surrogate pair.
    Incomplete,
    /// Wide output would exceed `limit` code units.
    TooLong { limit: usize },
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingError::Unrepresentable { index, unit } => {
                write!(f, "unrepresentable code unit 0x{unit:X} at position {index}")
            }
            EncodingError::Incomplete => write!(f, "string ends inside a surrogate pair"),
            EncodingError::TooLong { limit } => {
                write!(f, "string exceeds {limit} wide characters")
            }
        }
    }
}

impl std::error::Error for EncodingError {}

pub type Result<T> = std::result::Result<T, EncodingError>;

// ── Decoder ──

/// Per-call decoder for wide code units.
///
/// Accepts UTF-32 scalars directly and joins UTF-16 surrogate pairs.
#[derive(Default)]
struct WideDecoder {
    high: Option<(usize, u32)>,
}

impl WideDecoder {
    /// Feed one unit. `Ok(None)` means a high surrogate is pending.
    fn push(&mut self, index: usize, unit: u32) -> Result<Option<char>> {
        match (self.high.take(), unit) {
            (None, 0xD800..=0xDBFF) => {
                self.high = Some((index, unit));
                Ok(None)
            }
            (Some((_, hi)), 0xDC00..=0xDFFF) => {
                let scalar = 0x10000 + ((hi - 0xD800) << 10) + (unit - 0xDC00);
                char::from_u32(scalar)
                    .map(Some)
                    .ok_or(EncodingError::Unrepresentable { index, unit })
            }
            (Some((hi_index, hi)), _) => Err(EncodingError::Unrepresentable {
                index: hi_index,
                unit: hi,
            }),
            (None, _) => char::from_u32(unit)
                .map(Some)
                .ok_or(EncodingError::Unrepresentable { index, unit }),
        }
    }

    fn finish(self) -> Result<()> {
        match self.high {
            Some(_) => Err(EncodingError::Incomplete),
            None => Ok(()),
        }
    }
}

/// Convert a device-supplied wide string to UTF-8.
///
/// Stops at the first NUL unit, at the end of input, or before the first
/// character whose encoding would take the output past
/// [`MAX_STRING_BYTES`]. Truncation always lands on a character boundary.
pub fn to_portable(native: &[u32]) -> Result<String> {
    to_portable_bounded(native, MAX_STRING_BYTES)
}

/// [`to_portable`] with an explicit byte bound.
pub fn to_portable_bounded(native: &[u32], max_bytes: usize) -> Result<String> {
    let mut decoder = WideDecoder::default();
    let mut out = String::new();
    for (index, &unit) in native.iter().enumerate() {
        if unit == 0 {
            break;
        }
        let Some(c) = decoder.push(index, unit)? else {
            continue;
        };
        if out.len() + c.len_utf8() > max_bytes {
            log::debug!("device string truncated at {} bytes", out.len());
            return Ok(out);
        }
        out.push(c);
    }
    decoder.finish()?;
    Ok(out)
}

/// Convert a UTF-8 string to platform wide units for an open request.
///
/// Fails with [`EncodingError::TooLong`] rather than truncating: a cut-down
/// serial would address a different device.
pub fn to_native(portable: &str) -> Result<WideString> {
    to_native_bounded(portable, MAX_STRING_UNITS)
}

/// [`to_native`] with an explicit unit bound.
pub fn to_native_bounded(portable: &str, max_units: usize) -> Result<WideString> {
    let mut out = WideString::new();
    for c in portable.chars() {
        out.extend(wide_units(c));
        if out.len() > max_units {
            return Err(EncodingError::TooLong { limit: max_units });
        }
    }
    Ok(out)
}

#[cfg(windows)]
fn wide_units(c: char) -> impl Iterator<Item = u32> {
    let mut buf = [0u16; 2];
    let n = c.encode_utf16(&mut buf).len();
    buf.into_iter().take(n).map(u32::from)
}

#[cfg(not(windows))]
fn wide_units(c: char) -> impl Iterator<Item = u32> {
    std::iter::once(u32::from(c))
}
