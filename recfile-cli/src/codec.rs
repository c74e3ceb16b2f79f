//! Conversion between command line values and raw records

use anyhow::{bail, Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use clap::ValueEnum;
use serde::Deserialize;

/// How values on the command line map onto record bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Raw UTF-8 bytes
    #[default]
    Text,
    /// Pairs of hex digits
    Hex,
    /// Unsigned 64-bit integer, little-endian
    U64,
    /// Signed 64-bit integer, little-endian
    I64,
    /// 64-bit float, little-endian
    F64,
}

/// Encodes values into records of one store
#[derive(Debug, Clone, Copy)]
pub struct RecordCodec {
    pub encoding: Encoding,
    pub record_size: usize,
    /// Zero-pad values shorter than the record size
    pub pad: bool,
}

impl RecordCodec {
    /// Turn a command line value into record bytes
    ///
    /// Values longer than the record size are rejected. Shorter values are
    /// only padded when asked to; otherwise the store reports the mismatch.
    pub fn encode(&self, value: &str) -> Result<Vec<u8>> {
        let mut record = match self.encoding {
            Encoding::Text => value.as_bytes().to_vec(),
            Encoding::Hex => from_hex(value)
                .with_context(|| format!("invalid hex value: {:?}", value))?,
            Encoding::U64 => {
                let n: u64 = value.parse().with_context(|| format!("invalid u64: {:?}", value))?;
                let mut buf = Vec::with_capacity(8);
                buf.write_u64::<LittleEndian>(n)?;
                buf
            }
            Encoding::I64 => {
                let n: i64 = value.parse().with_context(|| format!("invalid i64: {:?}", value))?;
                let mut buf = Vec::with_capacity(8);
                buf.write_i64::<LittleEndian>(n)?;
                buf
            }
            Encoding::F64 => {
                let n: f64 = value.parse().with_context(|| format!("invalid f64: {:?}", value))?;
                let mut buf = Vec::with_capacity(8);
                buf.write_f64::<LittleEndian>(n)?;
                buf
            }
        };

        if record.len() > self.record_size {
            bail!(
                "value is {} bytes, longer than the record size {}",
                record.len(),
                self.record_size
            );
        }
        if self.pad {
            record.resize(self.record_size, 0);
        }
        Ok(record)
    }

    /// Render record bytes for display
    pub fn decode(&self, record: &[u8]) -> Result<String> {
        let mut reader = record;
        Ok(match self.encoding {
            Encoding::Text => {
                let end = record.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
                String::from_utf8_lossy(&record[..end]).into_owned()
            }
            Encoding::Hex => hex(record),
            Encoding::U64 => reader
                .read_u64::<LittleEndian>()
                .context("record too short for u64")?
                .to_string(),
            Encoding::I64 => reader
                .read_i64::<LittleEndian>()
                .context("record too short for i64")?
                .to_string(),
            Encoding::F64 => reader
                .read_f64::<LittleEndian>()
                .context("record too short for f64")?
                .to_string(),
        })
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Parse hex digits, tolerating a `0x` prefix
fn from_hex(value: &str) -> Option<Vec<u8>> {
    let value = value.strip_prefix("0x").unwrap_or(value);
    if value.len() % 2 != 0 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    (0..value.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&value[i..i + 2], 16).ok())
        .collect()
}
