//! Binary layout for a packed per-record sample buffer (spec §4.2).
//!
//! ```text
//! header: u16 version(1), u16 numFields
//! per field: u8 nameLen, utf8 name, f64 initialValue, u32 sampleCount,
//!            sampleCount * { f64 time, f64 value }
//! ```
//! Little-endian throughout. Unknown versions are rejected.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;
use town_core::Timestamp;

use crate::error::{StoreError, StoreResult};

const VERSION: u16 = 1;

/// One tracked field's history for a single flush interval.
pub struct FieldHistory {
    pub name: &'static str,
    pub initial_value: f64,
    pub samples: Vec<(Timestamp, f64)>,
}

/// A field's history after unpacking, field name owned since it no longer
/// has to match a `&'static str` in the current schema (spec §9: unknown
/// fields are discarded on read, missing fields default to their last known
/// value — both decisions belong to the reader, not this decoder).
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackedField {
    pub name: String,
    pub initial_value: f64,
    pub samples: Vec<(Timestamp, f64)>,
}

/// Encode `fields` into the binary blob described above.
pub fn pack(fields: &[FieldHistory]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u16::<LittleEndian>(VERSION).expect("Vec writes never fail");
    buf.write_u16::<LittleEndian>(fields.len() as u16).expect("Vec writes never fail");
    for field in fields {
        let name_bytes = field.name.as_bytes();
        buf.write_u8(name_bytes.len() as u8).expect("Vec writes never fail");
        buf.extend_from_slice(name_bytes);
        buf.write_f64::<LittleEndian>(field.initial_value).expect("Vec writes never fail");
        buf.write_u32::<LittleEndian>(field.samples.len() as u32).expect("Vec writes never fail");
        for (t, v) in &field.samples {
            buf.write_f64::<LittleEndian>(t.0 as f64).expect("Vec writes never fail");
            buf.write_f64::<LittleEndian>(*v).expect("Vec writes never fail");
        }
    }
    buf
}

/// Decode a blob produced by [`pack`]. Rejects any version other than the
/// one this crate writes.
pub fn unpack(bytes: &[u8]) -> StoreResult<Vec<UnpackedField>> {
    let mut cursor = std::io::Cursor::new(bytes);
    let version = cursor.read_u16::<LittleEndian>().map_err(|_| {
        StoreError::Malformed("blob too short for header".to_string())
    })?;
    if version != VERSION {
        return Err(StoreError::UnsupportedVersion(version));
    }
    let num_fields =
        cursor.read_u16::<LittleEndian>().map_err(|_| StoreError::Malformed("truncated header".into()))?;

    let mut fields = Vec::with_capacity(num_fields as usize);
    for _ in 0..num_fields {
        let name_len = cursor
            .read_u8()
            .map_err(|_| StoreError::Malformed("truncated field name length".into()))?
            as usize;
        let mut name_buf = vec![0u8; name_len];
        cursor.read_exact(&mut name_buf).map_err(|_| StoreError::Malformed("truncated field name".into()))?;
        let name = String::from_utf8(name_buf)
            .map_err(|e| StoreError::Malformed(format!("field name not utf8: {e}")))?;

        let initial_value = cursor
            .read_f64::<LittleEndian>()
            .map_err(|_| StoreError::Malformed("truncated initial value".into()))?;
        let sample_count = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| StoreError::Malformed("truncated sample count".into()))?;

        let mut samples = Vec::with_capacity(sample_count as usize);
        for _ in 0..sample_count {
            let t = cursor
                .read_f64::<LittleEndian>()
                .map_err(|_| StoreError::Malformed("truncated sample time".into()))?;
            let v = cursor
                .read_f64::<LittleEndian>()
                .map_err(|_| StoreError::Malformed("truncated sample value".into()))?;
            samples.push((Timestamp(t as u64), v));
        }

        fields.push(UnpackedField { name, initial_value, samples });
    }

    Ok(fields)
}
