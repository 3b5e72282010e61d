//! Central-directory walk over the raw ZIP bytes.
//!
//! The ZIP reader indexes entries by name and keeps only the last of
//! duplicate names. This walk sees every record in directory order, so the
//! first of several same-named entries can still be located and read.

use std::io::{self, BufReader, Read, Seek, SeekFrom};

use flate2::read::DeflateDecoder;

const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_FIXED_LEN: usize = 46;
const LOCAL_FIXED_LEN: usize = 30;
/// Size or offset field deferring to a ZIP64 extra field.
const ZIP64_MARKER: u32 = 0xFFFF_FFFF;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;

/// One central-directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CentralRecord {
    pub name: Vec<u8>,
    pub method: u16,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub local_header_offset: u32,
}

impl CentralRecord {
    pub fn is_dir(&self) -> bool {
        self.name.ends_with(b"/")
    }

    fn is_zip64(&self) -> bool {
        self.compressed_size == ZIP64_MARKER
            || self.uncompressed_size == ZIP64_MARKER
            || self.local_header_offset == ZIP64_MARKER
    }
}

fn le_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn skip<R: Read>(reader: &mut R, n: u64) -> io::Result<()> {
    io::copy(&mut reader.take(n), &mut io::sink())?;
    Ok(())
}

/// All records starting at absolute offset `dir_start`, in directory order.
/// The walk stops at the first non-record signature (the end record).
pub(crate) fn records<R: Read + Seek>(reader: &mut R, dir_start: u64) -> io::Result<Vec<CentralRecord>> {
    reader.seek(SeekFrom::Start(dir_start))?;
    let mut reader = BufReader::new(reader);
    let mut out = Vec::new();

    loop {
        let mut fixed = [0u8; CENTRAL_FIXED_LEN];
        match reader.read_exact(&mut fixed) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
        if le_u32(&fixed, 0) != CENTRAL_HEADER_SIG {
            break;
        }

        let name_len = le_u16(&fixed, 28) as usize;
        let trailing = u64::from(le_u16(&fixed, 30)) + u64::from(le_u16(&fixed, 32));
        let mut name = vec![0u8; name_len];
        reader.read_exact(&mut name)?;
        skip(&mut reader, trailing)?;

        out.push(CentralRecord {
            name,
            method: le_u16(&fixed, 10),
            compressed_size: le_u32(&fixed, 20),
            uncompressed_size: le_u32(&fixed, 24),
            local_header_offset: le_u32(&fixed, 42),
        });
    }

    Ok(out)
}

/// Decompressing reader over the data of `record`. `archive_offset` is the
/// number of bytes preceding the ZIP data in `reader`.
pub(crate) fn entry_reader<'a, R: Read + Seek>(
    reader: &'a mut R,
    archive_offset: u64,
    record: &CentralRecord,
) -> io::Result<Box<dyn Read + 'a>> {
    if record.is_zip64() {
        return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "ZIP64 record cannot be read directly",
        ));
    }

    let start = archive_offset + u64::from(record.local_header_offset);
    reader.seek(SeekFrom::Start(start))?;
    let mut local = [0u8; LOCAL_FIXED_LEN];
    reader.read_exact(&mut local)?;
    if le_u32(&local, 0) != LOCAL_HEADER_SIG {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("no local header at offset {start}"),
        ));
    }
    let header_rest = u64::from(le_u16(&local, 26)) + u64::from(le_u16(&local, 28));
    skip(reader, header_rest)?;

    let data = reader.take(u64::from(record.compressed_size));
    match record.method {
        METHOD_STORED => Ok(Box::new(data)),
        METHOD_DEFLATED => Ok(Box::new(DeflateDecoder::new(data))),
        other => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("compression method {other} not supported"),
        )),
    }
}
