//! # Typed Value Views
//!
//! Thin wrappers over [`Log`] that fix the type tag, layout tag, and record
//! format of a log and encode/decode payloads. They add no storage behavior
//! of their own: each is a value wrapper around the byte-oriented core, and
//! the inner [`Log`] stays reachable through `log()` / `into_inner()` for
//! callers that need raw access.

use std::path::Path;

use eyre::Result;

use crate::log::{Log, LogConfig, RecordFormat};
use crate::storage::{read_u64_le, Disposition};

fn read_u32_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

/// Log of `f64` samples: fixed 16-byte records, IEEE-754 bits
/// little-endian.
#[derive(Debug)]
pub struct F64Log {
    log: Log,
}

impl F64Log {
    pub const DATA_TYPE: &'static str = "double";
    pub const DATA_LAYOUT: &'static str = "IEEE-754 binary64, little-endian";

    pub fn open(
        path: impl AsRef<Path>,
        disposition: Disposition,
        config: &LogConfig,
    ) -> Result<Self> {
        let log = Log::open(
            path,
            Self::DATA_TYPE,
            Self::DATA_LAYOUT,
            RecordFormat::Fixed { record_size: 16 },
            disposition,
            config,
        )?;
        Ok(Self { log })
    }

    pub fn append(&mut self, timestamp: u64, value: f64) -> bool {
        self.log
            .append_raw(timestamp, &value.to_bits().to_le_bytes())
    }

    /// Returns `(0, 0.0)` when `n` is out of range.
    pub fn get(&self, n: usize) -> (u64, f64) {
        let (timestamp, bytes) = self.log.read_raw(n);
        if bytes.len() < 8 {
            return (0, 0.0);
        }
        (timestamp, f64::from_bits(read_u64_le(bytes)))
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn into_inner(self) -> Log {
        self.log
    }
}

/// Log of boolean arrays: variable-size records, one byte per element.
#[derive(Debug)]
pub struct BoolArrayLog {
    log: Log,
}

impl BoolArrayLog {
    pub const DATA_TYPE: &'static str = "boolean[]";
    pub const DATA_LAYOUT: &'static str = "one byte per element, 0 or 1";

    pub fn open(
        path: impl AsRef<Path>,
        disposition: Disposition,
        config: &LogConfig,
    ) -> Result<Self> {
        let log = Log::open(
            path,
            Self::DATA_TYPE,
            Self::DATA_LAYOUT,
            RecordFormat::Variable,
            disposition,
            config,
        )?;
        Ok(Self { log })
    }

    pub fn append(&mut self, timestamp: u64, values: &[bool]) -> bool {
        let Some(mut slot) = self.log.append_start(timestamp, values.len() as u64) else {
            return false;
        };
        for (dst, value) in slot.iter_mut().zip(values) {
            *dst = u8::from(*value);
        }
        slot.commit();
        true
    }

    pub fn get(&self, n: usize) -> (u64, Vec<bool>) {
        let (timestamp, bytes) = self.log.read_raw(n);
        (timestamp, bytes.iter().map(|&b| b != 0).collect())
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn into_inner(self) -> Log {
        self.log
    }
}

/// Log of `f64` arrays: variable-size records, 8-byte little-endian
/// elements.
#[derive(Debug)]
pub struct F64ArrayLog {
    log: Log,
}

impl F64ArrayLog {
    pub const DATA_TYPE: &'static str = "double[]";
    pub const DATA_LAYOUT: &'static str = "IEEE-754 binary64, little-endian";

    pub fn open(
        path: impl AsRef<Path>,
        disposition: Disposition,
        config: &LogConfig,
    ) -> Result<Self> {
        let log = Log::open(
            path,
            Self::DATA_TYPE,
            Self::DATA_LAYOUT,
            RecordFormat::Variable,
            disposition,
            config,
        )?;
        Ok(Self { log })
    }

    pub fn append(&mut self, timestamp: u64, values: &[f64]) -> bool {
        let Some(mut slot) = self.log.append_start(timestamp, values.len() as u64 * 8) else {
            return false;
        };
        for (dst, value) in slot.chunks_exact_mut(8).zip(values) {
            dst.copy_from_slice(&value.to_bits().to_le_bytes());
        }
        slot.commit();
        true
    }

    pub fn get(&self, n: usize) -> (u64, Vec<f64>) {
        let (timestamp, bytes) = self.log.read_raw(n);
        let values = bytes
            .chunks_exact(8)
            .map(|chunk| f64::from_bits(read_u64_le(chunk)))
            .collect();
        (timestamp, values)
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn into_inner(self) -> Log {
        self.log
    }
}

/// Log of string arrays.
///
/// Payload layout: `u32` element count, then one `(u32 offset, u32 len)`
/// pair per string (offsets relative to the payload start), then the string
/// bytes, each followed by a NUL so payloads stay grep-friendly on disk.
#[derive(Debug)]
pub struct StringArrayLog {
    log: Log,
}

impl StringArrayLog {
    pub const DATA_TYPE: &'static str = "string[]";
    pub const DATA_LAYOUT: &'static str = "u32 count, (u32 offset, u32 len) table, NUL-terminated UTF-8";

    pub fn open(
        path: impl AsRef<Path>,
        disposition: Disposition,
        config: &LogConfig,
    ) -> Result<Self> {
        let log = Log::open(
            path,
            Self::DATA_TYPE,
            Self::DATA_LAYOUT,
            RecordFormat::Variable,
            disposition,
            config,
        )?;
        Ok(Self { log })
    }

    pub fn append(&mut self, timestamp: u64, values: &[&str]) -> bool {
        let table_end = 4 + 8 * values.len();
        let total: usize = table_end + values.iter().map(|v| v.len() + 1).sum::<usize>();

        let Some(mut slot) = self.log.append_start(timestamp, total as u64) else {
            return false;
        };

        slot[0..4].copy_from_slice(&(values.len() as u32).to_le_bytes());
        let mut offset = table_end as u32;
        for (i, value) in values.iter().enumerate() {
            let entry = 4 + i * 8;
            slot[entry..entry + 4].copy_from_slice(&offset.to_le_bytes());
            slot[entry + 4..entry + 8].copy_from_slice(&(value.len() as u32).to_le_bytes());
            offset += value.len() as u32 + 1;
        }

        let mut cursor = table_end;
        for value in values {
            slot[cursor..cursor + value.len()].copy_from_slice(value.as_bytes());
            cursor += value.len();
            slot[cursor] = 0;
            cursor += 1;
        }

        slot.commit();
        true
    }

    /// Returns the empty vector for out-of-range ordinals and for payloads
    /// whose offset table points outside the record.
    pub fn get(&self, n: usize) -> (u64, Vec<String>) {
        let (timestamp, bytes) = self.log.read_raw(n);
        if bytes.len() < 4 {
            return (timestamp, Vec::new());
        }
        let count = read_u32_le(bytes) as usize;
        let Some(table) = bytes.get(4..4 + count * 8) else {
            return (timestamp, Vec::new());
        };

        let mut values = Vec::with_capacity(count);
        for entry in table.chunks_exact(8) {
            let offset = read_u32_le(&entry[0..4]) as usize;
            let len = read_u32_le(&entry[4..8]) as usize;
            let Some(raw) = bytes.get(offset..offset + len) else {
                return (timestamp, Vec::new());
            };
            values.push(String::from_utf8_lossy(raw).into_owned());
        }
        (timestamp, values)
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn into_inner(self) -> Log {
        self.log
    }
}
