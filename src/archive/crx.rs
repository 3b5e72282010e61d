//! CRX container header.
//!
//! A CRX package is a ZIP archive prefixed with a signed header:
//!
//! ```text
//! offset  size  field
//! 0       4     magic "Cr24"
//! 4       4     format version (u32, little-endian)
//! 8       4     header size (u32, little-endian)
//! 12      n     signed header (ignored)
//! 12 + n  ...   ZIP payload
//! ```
//!
//! The signed header is skipped without verification.

use crate::error::ArchiveError;

/// Magic prefix identifying a CRX container.
pub const CRX_MAGIC: &[u8; 4] = b"Cr24";

/// Size of the fixed prelude (magic + version + header size).
pub const PRELUDE_LEN: usize = 12;

/// Parsed fixed part of a CRX header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrxHeader {
    pub version: u32,
    pub header_size: u32,
}

impl CrxHeader {
    /// Offset at which the ZIP payload begins.
    pub fn payload_offset(&self) -> usize {
        PRELUDE_LEN.saturating_add(self.header_size as usize)
    }
}

/// Whether `raw` starts with the CRX magic.
pub fn is_crx(raw: &[u8]) -> bool {
    raw.starts_with(CRX_MAGIC)
}

/// Parse the fixed prelude. Returns `Ok(None)` for input without the magic.
pub fn parse_header(raw: &[u8]) -> Result<Option<CrxHeader>, ArchiveError> {
    if !is_crx(raw) {
        return Ok(None);
    }
    if raw.len() < PRELUDE_LEN {
        return Err(ArchiveError::Corrupt(format!(
            "CRX header truncated: {} bytes, need at least {}",
            raw.len(),
            PRELUDE_LEN
        )));
    }

    let version = read_u32_le(&raw[4..8]);
    let header_size = read_u32_le(&raw[8..12]);
    Ok(Some(CrxHeader {
        version,
        header_size,
    }))
}

/// Strip the container header, returning the archive payload.
///
/// Input without the magic is returned unchanged (bare ZIP).
pub fn payload(raw: &[u8]) -> Result<&[u8], ArchiveError> {
    let Some(header) = parse_header(raw)? else {
        return Ok(raw);
    };

    let offset = header.payload_offset();
    if offset > raw.len() {
        return Err(ArchiveError::Corrupt(format!(
            "CRX header size {} points past end of input ({} bytes)",
            header.header_size,
            raw.len()
        )));
    }
    Ok(&raw[offset..])
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}
