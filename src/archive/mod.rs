//! Package unwrapping: CRX container or bare ZIP into a random-access view.
//!
//! The ZIP payload is copied into an anonymous temporary file so the ZIP
//! reader can seek. The file is unlinked by the OS as soon as the
//! [`ArchiveView`] (or a failed [`open`]) drops it, so scratch storage never
//! outlives the analysis run.

mod central;
pub mod crx;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::ArchiveError;

/// Entries larger than this are not materialized.
pub const MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Random-access index over the entries of an unwrapped package.
pub struct ArchiveView {
    archive: ZipArchive<File>,
    /// Second handle on the scratch file for direct central-directory reads.
    scratch: File,
}

/// A non-directory entry read from the archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Unwrap `raw` (CRX container or bare ZIP) into an [`ArchiveView`].
pub fn open(raw: &[u8]) -> Result<ArchiveView, ArchiveError> {
    let header = crx::parse_header(raw)?;
    match header {
        Some(h) => debug!(
            version = h.version,
            header_size = h.header_size,
            "detected CRX container"
        ),
        None => debug!("no CRX magic, treating input as bare archive"),
    }
    let payload = crx::payload(raw)?;

    let mut scratch = tempfile::tempfile()?;
    scratch.write_all(payload)?;
    scratch.flush()?;
    scratch.seek(SeekFrom::Start(0))?;

    let handle = scratch.try_clone()?;
    let archive = ZipArchive::new(scratch)
        .map_err(|e| ArchiveError::Corrupt(format!("failed to open ZIP archive: {e}")))?;

    Ok(ArchiveView {
        archive,
        scratch: handle,
    })
}

impl ArchiveView {
    /// Number of entries, directories included.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Read the entry stored at exactly `path`. Returns `Ok(None)` if absent
    /// or a directory.
    pub fn read(&mut self, path: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
        let mut entry = match self.archive.by_name(path) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(ArchiveError::Corrupt(format!(
                    "failed to read ZIP entry '{path}': {e}"
                )))
            }
        };
        if entry.is_dir() {
            return Ok(None);
        }

        let declared = entry.size();
        let bytes = read_limited(&mut entry, declared)
            .map_err(|e| ArchiveError::Corrupt(format!("failed to read ZIP entry '{path}': {e}")))?;
        Ok(Some(bytes))
    }

    /// Read the first non-directory entry at exactly `path`, in
    /// central-directory order. Same-named entries after it are ignored.
    pub fn read_first(&mut self, path: &str) -> Result<Option<Vec<u8>>, ArchiveError> {
        let records = match central::records(&mut self.scratch, self.archive.central_directory_start()) {
            Ok(records) => records,
            Err(e) => {
                debug!(error = %e, "central directory walk failed, using indexed lookup");
                return self.read(path);
            }
        };

        let mut matches = records
            .iter()
            .filter(|r| r.name == path.as_bytes() && !r.is_dir());
        let Some(first) = matches.next() else {
            return self.read(path);
        };
        if matches.next().is_none() {
            return self.read(path);
        }

        warn!(path, "duplicate archive entries, using the first in directory order");
        let corrupt = |e: std::io::Error| {
            ArchiveError::Corrupt(format!("failed to read ZIP entry '{path}': {e}"))
        };
        let declared = u64::from(first.uncompressed_size);
        let mut reader = central::entry_reader(&mut self.scratch, self.archive.offset(), first)
            .map_err(corrupt)?;
        read_limited(&mut reader, declared).map(Some).map_err(corrupt)
    }

    /// Read the entry at `index`. Returns `Ok(None)` for directories.
    pub fn read_index(&mut self, index: usize) -> Result<Option<ArchiveEntry>, ArchiveError> {
        let mut entry = self
            .archive
            .by_index(index)
            .map_err(|e| ArchiveError::Corrupt(format!("failed to read ZIP entry #{index}: {e}")))?;
        if entry.is_dir() {
            return Ok(None);
        }

        let path = entry.name().to_string();
        let declared = entry.size();
        let bytes = read_limited(&mut entry, declared)
            .map_err(|e| ArchiveError::Corrupt(format!("failed to read ZIP entry '{path}': {e}")))?;
        Ok(Some(ArchiveEntry { path, bytes }))
    }
}

impl std::fmt::Debug for ArchiveView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveView")
            .field("entries", &self.archive.len())
            .finish()
    }
}

fn read_limited<R: Read>(reader: &mut R, declared: u64) -> std::io::Result<Vec<u8>> {
    if declared > MAX_ENTRY_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("entry declares {declared} bytes, limit is {MAX_ENTRY_BYTES}"),
        ));
    }
    let mut bytes = Vec::with_capacity(declared as usize);
    reader.take(MAX_ENTRY_BYTES + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > MAX_ENTRY_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("entry exceeds {MAX_ENTRY_BYTES} bytes"),
        ));
    }
    Ok(bytes)
}
