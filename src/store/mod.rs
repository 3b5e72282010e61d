//! Persisted analysis results, keyed by extension ID.
//!
//! A [`JsonFileStore`] keeps one pretty-printed JSON file per extension in
//! a directory. [`FreshnessPolicy`] decides whether a stored result can be
//! served instead of re-analyzing.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use walkdir::WalkDir;

use crate::advisory::RiskAssessment;
use crate::error::{AuditError, Result};
use crate::manifest::Manifest;
use crate::metadata::StoreMetadata;
use crate::rules::FindingList;
use crate::AnalysisReport;

/// Length of a Chrome Web Store extension ID.
pub const EXTENSION_ID_LEN: usize = 32;

/// A validated extension ID: exactly 32 ASCII alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtensionId(String);

impl ExtensionId {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() == EXTENSION_ID_LEN && s.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(Self(s.to_string()))
        } else {
            Err(AuditError::InvalidExtensionId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ExtensionId {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ExtensionId {
    type Error = AuditError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ExtensionId> for String {
    fn from(id: ExtensionId) -> Self {
        id.0
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One stored analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredScan {
    pub extension_id: ExtensionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_image: Option<String>,
    pub manifest: Manifest,
    #[serde(default)]
    pub extension_details: StoreMetadata,
    pub security_findings: FindingList,
    pub risk: RiskAssessment,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredScan {
    pub fn new(
        extension_id: ExtensionId,
        report: &AnalysisReport,
        metadata: Option<&StoreMetadata>,
        now: DateTime<Utc>,
    ) -> Self {
        let details = metadata.cloned().unwrap_or_default();
        Self {
            extension_id,
            extension_name: details.name.clone().or_else(|| report.manifest.name.clone()),
            extension_image: details.image.clone(),
            manifest: report.manifest.clone(),
            extension_details: details,
            security_findings: report.findings.clone(),
            risk: report.risk.clone(),
            sha256: report.sha256.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.updated_at
    }
}

/// When a stored result may be served instead of re-analyzing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    pub max_age: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::hours(24),
        }
    }
}

impl FreshnessPolicy {
    pub fn with_max_age_hours(hours: i64) -> Self {
        Self {
            max_age: Duration::hours(hours),
        }
    }

    /// A stored result is reused unless the caller forces a refresh and it
    /// is older than `max_age`.
    pub fn should_reuse(&self, stored: &StoredScan, now: DateTime<Utc>, force: bool) -> bool {
        !(force && stored.age(now) > self.max_age)
    }
}

/// Storage for analysis results.
pub trait ResultStore {
    fn get(&self, id: &ExtensionId) -> Result<Option<StoredScan>>;

    /// Insert or replace. An existing record's `created_at` is preserved.
    fn put(&self, scan: StoredScan) -> Result<StoredScan>;

    fn all(&self) -> Result<Vec<StoredScan>>;

    /// Stored result for `id`, if the freshness policy allows reusing it.
    fn lookup_fresh(
        &self,
        id: &ExtensionId,
        policy: &FreshnessPolicy,
        now: DateTime<Utc>,
        force: bool,
    ) -> Result<Option<StoredScan>> {
        Ok(self
            .get(id)?
            .filter(|stored| policy.should_reuse(stored, now, force)))
    }
}

/// Directory of `<extension_id>.json` files.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &ExtensionId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn read_record(path: &Path) -> Result<StoredScan> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| AuditError::Store(format!("{}: {e}", path.display())))
    }
}

impl ResultStore for JsonFileStore {
    fn get(&self, id: &ExtensionId) -> Result<Option<StoredScan>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_record(&path).map(Some)
    }

    fn put(&self, mut scan: StoredScan) -> Result<StoredScan> {
        fs::create_dir_all(&self.dir)?;
        if let Some(existing) = self.get(&scan.extension_id)? {
            scan.created_at = existing.created_at;
        }

        let path = self.path_for(&scan.extension_id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&scan)?)?;
        fs::rename(&tmp, &path)?;
        Ok(scan)
    }

    fn all(&self) -> Result<Vec<StoredScan>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable store entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut scans = Vec::with_capacity(paths.len());
        for path in paths {
            match Self::read_record(&path) {
                Ok(scan) => scans.push(scan),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping undecodable record"),
            }
        }
        Ok(scans)
    }
}
