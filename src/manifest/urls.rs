//! Best-effort discovery of URL literals across every archive entry.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::archive::ArchiveView;

/// Scheme, optional `www.`, host characters, then a dotted 1-6 character TLD.
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?|ftp|file)://(?:www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9]{1,6}")
        .unwrap()
});

/// All non-overlapping URL matches in `text`, in order of appearance.
pub fn find_urls(text: &str) -> impl Iterator<Item = &str> + '_ {
    URL_RE.find_iter(text).map(|m| m.as_str())
}

/// Scan every readable text entry of the archive for URLs.
///
/// Binary (non UTF-8) entries and entries that fail to read are skipped.
pub fn scan_archive(view: &mut ArchiveView) -> BTreeSet<String> {
    let mut urls = BTreeSet::new();

    for index in 0..view.len() {
        let entry = match view.read_index(index) {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(e) => {
                debug!(index, error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let Ok(text) = std::str::from_utf8(&entry.bytes) else {
            debug!(path = %entry.path, "skipping binary entry");
            continue;
        };

        urls.extend(find_urls(text).map(str::to_string));
    }

    urls
}
