//! Dashboard rollup over stored results.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{ExtensionId, StoredScan};

const ALL_URLS: &str = "<all_urls>";
const RECENT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub minimal: usize,
}

impl SeverityCounts {
    /// Count one display level. Returns false for levels outside the five
    /// buckets.
    fn record(&mut self, level: &str) -> bool {
        let slot = match level {
            "Critical" => &mut self.critical,
            "High" => &mut self.high,
            "Medium" => &mut self.medium,
            "Low" => &mut self.low,
            "Minimal" => &mut self.minimal,
            _ => return false,
        };
        *slot += 1;
        true
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.minimal
    }
}

/// One row of the "most findings" table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpicyEntry {
    pub extension_id: ExtensionId,
    pub extension_name: Option<String>,
    pub extension_image: Option<String>,
    pub finding_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub severity_counts: SeverityCounts,
    pub spiciest: Vec<SpicyEntry>,
    pub scans_last_30_days: usize,
    pub all_urls_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Roll up `scans` as of `now`, keeping the `top_n` records with the most
/// findings.
pub fn compute(scans: &[StoredScan], now: DateTime<Utc>, top_n: usize) -> StatsSnapshot {
    let mut severity_counts = SeverityCounts::default();
    for scan in scans {
        severity_counts.record(&scan.risk.display_level());
    }

    let mut spiciest: Vec<SpicyEntry> = scans
        .iter()
        .map(|scan| SpicyEntry {
            extension_id: scan.extension_id.clone(),
            extension_name: scan.extension_name.clone(),
            extension_image: scan.extension_image.clone(),
            finding_count: scan.security_findings.len(),
        })
        .collect();
    // Stable: ties keep store order.
    spiciest.sort_by(|a, b| b.finding_count.cmp(&a.finding_count));
    spiciest.truncate(top_n);

    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let scans_last_30_days = scans.iter().filter(|s| s.created_at >= cutoff).count();

    let all_urls_count = scans
        .iter()
        .filter(|s| {
            s.manifest.permissions.iter().any(|p| p == ALL_URLS)
                || s.manifest.host_permissions.iter().any(|p| p == ALL_URLS)
        })
        .count();

    StatsSnapshot {
        severity_counts,
        spiciest,
        scans_last_30_days,
        all_urls_count,
        generated_at: now,
    }
}
