//! Builders for in-memory test packages.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::archive::crx::CRX_MAGIC;

/// Build a ZIP archive from `(path, content)` pairs. Paths ending in `/`
/// become directory entries.
pub fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (path, data) in entries {
        if path.ends_with('/') {
            zip.add_directory(*path, options).unwrap();
        } else {
            zip.start_file(*path, options).unwrap();
            zip.write_all(data).unwrap();
        }
    }

    zip.finish().unwrap().into_inner()
}

/// A bare ZIP with only `manifest.json`.
pub fn zip_with_manifest(manifest: &str) -> Vec<u8> {
    zip_with(&[("manifest.json", manifest.as_bytes())])
}

/// Wrap an archive in a CRX3-style container with an opaque signed header.
pub fn crx_wrap(archive: &[u8], signed_header: &[u8]) -> Vec<u8> {
    let mut out = CRX_MAGIC.to_vec();
    out.extend_from_slice(&3u32.to_le_bytes());
    out.extend_from_slice(&(signed_header.len() as u32).to_le_bytes());
    out.extend_from_slice(signed_header);
    out.extend_from_slice(archive);
    out
}

/// Rename entry `from` to `to` in both its local and central header. Lets a
/// test build an archive with duplicate names, which `ZipWriter` refuses.
pub fn rename_entry(raw: &mut [u8], from: &[u8], to: &[u8]) {
    assert_eq!(from.len(), to.len());
    let hits: Vec<usize> = raw
        .windows(from.len())
        .enumerate()
        .filter(|(_, w)| *w == from)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(hits.len(), 2);
    for at in hits {
        raw[at..at + to.len()].copy_from_slice(to);
    }
}
