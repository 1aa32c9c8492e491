//! Binary container for persisted surfaces.
//!
//! ```text
//! offset  size  field
//! 0       4     magic  "NSRF" (little-endian u32)
//! 4       4     format version
//! 8       8     payload length in bytes
//! 16      n     bincode payload (fixed-width integers, little-endian)
//! ```
//!
//! Any mismatch (magic, version, length, trailing bytes, payload decode)
//! is an error; callers treat it as "no persisted surface".

use std::io::Cursor;

use bincode::Options;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::mesh::SurfaceData;
use crate::{SurfaceError, SurfaceResult};

pub const MAGIC: u32 = u32::from_le_bytes(*b"NSRF");
pub const VERSION: u32 = 1;
pub const HEADER_LEN: usize = 16;

fn payload_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

pub fn encode(data: &SurfaceData) -> SurfaceResult<Vec<u8>> {
    let payload = payload_options()
        .serialize(data)
        .map_err(|e| SurfaceError::Encode(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.write_u32::<LittleEndian>(MAGIC)?;
    out.write_u32::<LittleEndian>(VERSION)?;
    out.write_u64::<LittleEndian>(payload.len() as u64)?;
    out.extend_from_slice(&payload);
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> SurfaceResult<SurfaceData> {
    if bytes.len() < HEADER_LEN {
        return Err(SurfaceError::Corrupt(format!("{} bytes is shorter than the header", bytes.len())));
    }
    let mut cur = Cursor::new(bytes);
    let magic = cur.read_u32::<LittleEndian>()?;
    if magic != MAGIC {
        return Err(SurfaceError::Corrupt(format!("bad magic {magic:#010x}")));
    }
    let version = cur.read_u32::<LittleEndian>()?;
    if version != VERSION {
        return Err(SurfaceError::VersionMismatch { found: version, expected: VERSION });
    }
    let len = cur.read_u64::<LittleEndian>()?;
    let remaining = (bytes.len() - HEADER_LEN) as u64;
    if len != remaining {
        return Err(SurfaceError::Corrupt(format!("payload length {len}, {remaining} bytes present")));
    }

    payload_options()
        .with_limit(len)
        .reject_trailing_bytes()
        .deserialize(&bytes[HEADER_LEN..])
        .map_err(|e| SurfaceError::Corrupt(e.to_string()))
}
