//! # Time-File Header
//!
//! The first 4096 bytes of a time file hold a zero-padded UTF-8 JSON object
//! describing the log: payload type and layout tags, record stride, whether
//! records are fixed-size, the gap string, and the next write positions of
//! both files. `LogHeader` is the serde model of that object; parse and
//! shape errors surface as [`WrongProtocolType`] so callers can tell a
//! foreign file from an I/O failure.

use std::fmt;

use eyre::{ensure, Result, WrapErr};
use serde::{Deserialize, Serialize};

/// Size of the time-file header region. Records start at this offset.
pub const HEADER_SIZE: usize = 4096;

/// The file exists but does not carry a parseable chronolog header, or its
/// header disagrees with what the caller asked to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrongProtocolType;

impl fmt::Display for WrongProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("wrong protocol type")
    }
}

impl std::error::Error for WrongProtocolType {}

/// JSON header persisted at the start of every time file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogHeader {
    pub data_type: String,
    pub data_layout: String,
    pub record_size: u64,
    pub fixed_size: bool,
    pub gap_data: String,
    pub time_write_pos: u64,
    pub data_write_pos: u64,
}

impl LogHeader {
    /// Parses a header from the first [`HEADER_SIZE`] bytes of a time file.
    ///
    /// Trailing NUL padding is ignored. A missing key, a mistyped value, or
    /// non-JSON content is a [`WrongProtocolType`] error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let end = bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(bytes.len());
        let header: LogHeader =
            serde_json::from_slice(&bytes[..end]).map_err(|_| WrongProtocolType)?;
        Ok(header)
    }

    /// Serializes the header as pretty-printed JSON with a trailing newline,
    /// zero-padded to exactly [`HEADER_SIZE`] bytes.
    pub fn to_padded_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = serde_json::to_vec_pretty(self).wrap_err("failed to serialize log header")?;
        buf.push(b'\n');
        ensure!(
            buf.len() <= HEADER_SIZE,
            "log header of {} bytes does not fit in the {}-byte header region",
            buf.len(),
            HEADER_SIZE
        );
        buf.resize(HEADER_SIZE, 0);
        Ok(buf)
    }
}
