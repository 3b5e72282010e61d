//! crxaudit: offline risk auditing for browser extension packages.
//!
//! Opens a CRX or bare ZIP package, normalizes its `manifest.json`, runs a
//! fixed battery of permission and policy rules, and folds the findings
//! into a single risk verdict.
//!
//! # Quick Start
//!
//! ```no_run
//! let raw = std::fs::read("extension.crx").unwrap();
//! let report = crxaudit::analyze(&raw, None).unwrap();
//! println!("{}", report.findings.verdict().title());
//! for finding in report.findings.findings() {
//!     println!("{}: {}", finding.severity, finding.title);
//! }
//! ```

pub mod advisory;
pub mod archive;
pub mod config;
pub mod error;
pub mod manifest;
pub mod metadata;
pub mod output;
pub mod rules;
pub mod stats;
pub mod store;

#[cfg(test)]
mod test_support;

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use advisory::{AdvisoryProvider, FileAdvisor, RiskAssessment};
use config::{Config, CONFIG_FILE};
use error::{AuditError, Result};
use manifest::Manifest;
use metadata::StoreMetadata;
use output::OutputFormat;
use rules::policy::{Policy, PolicyVerdict};
use rules::{aggregate, FindingList, RuleEngine};
use store::{ExtensionId, JsonFileStore, ResultStore, StoredScan};

/// Result of analyzing one package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub manifest: Manifest,
    /// Verdict plus rule findings, then the advisory note if one was produced.
    pub findings: FindingList,
    pub risk: RiskAssessment,
    /// SHA-256 of the raw package bytes, lowercase hex.
    pub sha256: String,
    /// Rule findings dropped by the policy's `ignore_rules`.
    #[serde(default)]
    pub ignored_findings: usize,
}

/// Runs the analysis pipeline: open, extract, evaluate, filter, aggregate,
/// then the optional advisory note.
pub struct Analyzer {
    engine: RuleEngine,
    policy: Policy,
    advisor: Option<Box<dyn AdvisoryProvider>>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            engine: RuleEngine::new(),
            policy: Policy::default(),
            advisor: None,
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_advisor(mut self, advisor: Box<dyn AdvisoryProvider>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Analyze raw package bytes. Only an unreadable container, a missing
    /// manifest, or invalid manifest JSON fail the run.
    pub fn analyze(&self, raw: &[u8], metadata: Option<&StoreMetadata>) -> Result<AnalysisReport> {
        let sha256 = hex::encode(Sha256::digest(raw));
        let mut view = archive::open(raw)?;
        debug!(entries = view.len(), "package opened");
        let manifest = manifest::extract(&mut view)?;

        let (mut findings, ignored_findings) = self.evaluate(&manifest, metadata);

        if let Some(advisor) = &self.advisor {
            let prompt = advisory::format_prompt(&manifest, metadata, &findings);
            match advisor.advise(&prompt) {
                Ok(note) => findings.push_advisory(note),
                Err(e) => warn!(provider = advisor.name(), error = %e, "advisory note omitted"),
            }
        }

        let risk = RiskAssessment::from_findings(&findings);
        info!(
            verdict = %findings.verdict().severity,
            findings = findings.len(),
            embedded_urls = manifest.embedded_urls.len(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            manifest,
            findings,
            risk,
            sha256,
            ignored_findings,
        })
    }
}

impl Analyzer {
    /// Re-run the rules under the current policy over a stored result's
    /// manifest. The stored advisory note is carried over unchanged.
    pub fn reevaluate(&self, stored: StoredScan) -> AnalysisReport {
        let (mut findings, ignored_findings) =
            self.evaluate(&stored.manifest, Some(&stored.extension_details));
        if let Some(note) = stored.security_findings.advisory() {
            findings.push_advisory(note.description.clone());
        }

        AnalysisReport {
            risk: RiskAssessment::from_findings(&findings),
            manifest: stored.manifest,
            findings,
            sha256: stored.sha256,
            ignored_findings,
        }
    }

    /// Rule findings after policy, aggregated, plus the ignored count.
    fn evaluate(&self, manifest: &Manifest, metadata: Option<&StoreMetadata>) -> (FindingList, usize) {
        let raw_findings = self.engine.evaluate(manifest, metadata);
        let ignored_findings = self.policy.ignored_count(&raw_findings);
        (aggregate(self.policy.apply(raw_findings)), ignored_findings)
    }
}

/// Analyze a package with the default rule battery and no advisory note.
pub fn analyze(raw: &[u8], metadata: Option<&StoreMetadata>) -> Result<AnalysisReport> {
    Analyzer::new().analyze(raw, metadata)
}

/// Options for a scan invocation.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Path to config file (defaults to `.crxaudit.toml` in the working
    /// directory).
    pub config_path: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// CLI override for fail_on threshold.
    pub fail_on_override: Option<rules::Severity>,
    /// Store-page details as JSON.
    pub metadata_path: Option<PathBuf>,
    /// Pre-written advisory note.
    pub advisory_path: Option<PathBuf>,
    /// Store key; required when `use_store` is set.
    pub extension_id: Option<ExtensionId>,
    pub use_store: bool,
    /// Re-analyze even if a stored result exists, once it is stale.
    pub force: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            format: OutputFormat::Console,
            fail_on_override: None,
            metadata_path: None,
            advisory_path: None,
            extension_id: None,
            use_store: false,
            force: false,
        }
    }
}

/// Complete scan report.
#[derive(Debug)]
pub struct ScanReport {
    pub target_name: String,
    pub report: AnalysisReport,
    pub verdict: PolicyVerdict,
    /// Served from the result store instead of re-analyzed.
    pub reused: bool,
}

/// Run a complete scan of the package at `path`: load config, consult the
/// store, analyze, evaluate policy, persist.
pub fn scan(path: &Path, options: &ScanOptions) -> Result<ScanReport> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let mut config = Config::load(&config_path)?;

    if let Some(fail_on) = options.fail_on_override {
        config.policy.fail_on = fail_on;
    }

    let target_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".into());

    let store = match (options.use_store, &options.extension_id) {
        (false, _) => None,
        (true, Some(id)) => Some((JsonFileStore::new(&config.store.dir), id)),
        (true, None) => {
            return Err(AuditError::Config(
                "using the result store requires an extension ID".into(),
            ))
        }
    };

    let mut analyzer = Analyzer::new().with_policy(config.policy.clone());

    let now = Utc::now();
    if let Some((store, id)) = &store {
        let freshness = config.store.freshness();
        if let Some(stored) = store.lookup_fresh(id, &freshness, now, options.force)? {
            info!(extension_id = %id, "reusing stored result");
            let report = analyzer.reevaluate(stored);
            let verdict = config
                .policy
                .evaluate(&report.findings, report.ignored_findings);
            return Ok(ScanReport {
                target_name,
                report,
                verdict,
                reused: true,
            });
        }
    }

    let metadata = options
        .metadata_path
        .as_deref()
        .map(StoreMetadata::load)
        .transpose()?;

    if let Some(note) = &options.advisory_path {
        analyzer = analyzer.with_advisor(Box::new(FileAdvisor::new(note)));
    }

    let raw = std::fs::read(path)?;
    let report = analyzer.analyze(&raw, metadata.as_ref())?;
    let verdict = config
        .policy
        .evaluate(&report.findings, report.ignored_findings);

    if let Some((store, id)) = &store {
        store.put(StoredScan::new((*id).clone(), &report, metadata.as_ref(), now))?;
        debug!(extension_id = %id, dir = %store.dir().display(), "result stored");
    }

    Ok(ScanReport {
        target_name,
        report,
        verdict,
        reused: false,
    })
}

/// Render a scan report in the specified format.
pub fn render_report(report: &ScanReport, format: OutputFormat) -> Result<String> {
    output::render(
        &report.report,
        &report.verdict,
        format,
        &report.target_name,
    )
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::advisory::StaticAdvisor;
    use crate::error::{ArchiveError, ManifestError};
    use crate::rules::Severity;
    use crate::test_support::{crx_wrap, zip_with, zip_with_manifest};
    use pretty_assertions::assert_eq;

    fn titles(report: &AnalysisReport) -> Vec<String> {
        report
            .findings
            .findings()
            .iter()
            .map(|f| f.title.clone())
            .collect()
    }

    #[test]
    fn clean_mv3_zip_is_minimal() {
        let raw = zip_with_manifest(
            r#"{"manifest_version":3,"name":"Clean","version":"1.0","permissions":["alarms"]}"#,
        );
        let report = analyze(&raw, None).unwrap();
        assert!(report.findings.is_empty());
        assert_eq!(report.findings.verdict().severity, Severity::Minimal);
        assert_eq!(
            report.findings.to_flat()[0].description,
            "Based on 0 total findings, ranked without considering overall context, \
             including 0 high-risk and 0 medium-risk findings."
        );
        assert_eq!(report.manifest.name.as_deref(), Some("Clean"));
    }

    #[test]
    fn crx_container_is_unwrapped() {
        let archive = zip_with_manifest(r#"{"manifest_version":3,"permissions":["tabs"]}"#);
        let raw = crx_wrap(&archive, &[0xAB; 40]);
        let report = analyze(&raw, None).unwrap();
        assert_eq!(titles(&report), vec!["High-Risk Permission: tabs"]);
        assert_eq!(report.findings.verdict().severity, Severity::Medium);
    }

    #[test]
    fn all_urls_host_permission() {
        let raw = zip_with_manifest(
            r#"{"manifest_version":3,"host_permissions":["<all_urls>"]}"#,
        );
        let report = analyze(&raw, None).unwrap();
        assert_eq!(titles(&report), vec!["Broad Host Permissions"]);
        assert_eq!(report.findings.verdict().severity, Severity::Medium);
    }

    #[test]
    fn structured_csp_with_wasm_eval() {
        let raw = zip_with_manifest(
            r#"{"manifest_version":3,
                "content_security_policy":{"extension_pages":"script-src 'self' 'wasm-unsafe-eval'"}}"#,
        );
        let report = analyze(&raw, None).unwrap();
        assert_eq!(titles(&report), vec!["Unsafe WebAssembly Execution"]);
        assert_eq!(
            report.manifest.content_security_policy,
            vec!["extension_pages: script-src 'self' 'wasm-unsafe-eval'".to_string()]
        );
    }

    #[test]
    fn embedded_urls_come_from_every_text_entry() {
        let raw = zip_with(&[
            ("manifest.json", br#"{"manifest_version":3}"#),
            ("js/bg.js", b"fetch('https://api.example.com/v1/track')"),
            ("img/logo.png", &[0x89, 0x50, 0x4E, 0x47, 0xFF, 0xFE]),
        ]);
        let report = analyze(&raw, None).unwrap();
        assert!(report.manifest.embedded_urls.contains("https://api.example.com"));
    }

    #[test]
    fn corrupt_crx_header_is_an_archive_error() {
        let mut raw = b"Cr24".to_vec();
        raw.extend_from_slice(&3u32.to_le_bytes());
        raw.extend_from_slice(&u32::MAX.to_le_bytes());
        raw.extend_from_slice(b"short");
        assert!(matches!(
            analyze(&raw, None),
            Err(AuditError::Archive(ArchiveError::Corrupt(_)))
        ));
    }

    #[test]
    fn missing_manifest_and_bad_json() {
        let raw = zip_with(&[("background.js", b"console.log(1)")]);
        assert!(matches!(
            analyze(&raw, None),
            Err(AuditError::Manifest(ManifestError::NotFound))
        ));

        let raw = zip_with_manifest("{ not json");
        assert!(matches!(
            analyze(&raw, None),
            Err(AuditError::Manifest(ManifestError::InvalidJson(_)))
        ));
    }

    #[test]
    fn digest_is_of_raw_bytes() {
        let raw = zip_with_manifest(r#"{"manifest_version":3}"#);
        let report = analyze(&raw, None).unwrap();
        assert_eq!(report.sha256, hex::encode(Sha256::digest(&raw)));
    }

    #[test]
    fn advisory_note_is_appended_last() {
        let raw = zip_with_manifest(r#"{"manifest_version":2,"permissions":["tabs"]}"#);
        let analyzer = Analyzer::new().with_advisor(Box::new(StaticAdvisor(Ok(
            "Risk Level: Low\nWidely used, reputable publisher.".into(),
        ))));
        let report = analyzer.analyze(&raw, None).unwrap();

        let last = report.findings.findings().last().unwrap();
        assert_eq!(last.severity, Severity::Info);
        assert_eq!(last.title, "AI Context Analysis");
        assert_eq!(report.findings.verdict().severity, Severity::Medium);
        assert_eq!(report.risk.advisory_level.as_deref(), Some("Low"));
        assert_eq!(report.risk.display_level(), "Low");
    }

    #[test]
    fn advisory_failure_is_not_fatal() {
        let raw = zip_with_manifest(r#"{"manifest_version":3,"permissions":["tabs"]}"#);
        let analyzer =
            Analyzer::new().with_advisor(Box::new(StaticAdvisor(Err("timeout".into()))));
        let report = analyzer.analyze(&raw, None).unwrap();
        assert_eq!(report.findings.len(), 1);
        assert!(report.findings.advisory().is_none());
        assert_eq!(report.risk.advisory_level, None);
    }

    #[test]
    fn policy_filters_before_aggregation() {
        let raw = zip_with_manifest(
            r#"{"manifest_version":2,"permissions":["tabs","cookies","history"]}"#,
        );
        let mut policy = Policy::default();
        policy.ignore_rules.insert("CRX-006".into());
        policy.overrides.insert("CRX-001".into(), Severity::Low);

        let report = Analyzer::new().with_policy(policy).analyze(&raw, None).unwrap();
        assert_eq!(report.ignored_findings, 1);
        assert_eq!(report.findings.len(), 3);
        assert_eq!(report.findings.verdict().severity, Severity::Minimal);
    }

    fn write_package(dir: &Path, manifest: &str) -> PathBuf {
        let path = dir.join("ext.crx");
        std::fs::write(&path, crx_wrap(&zip_with_manifest(manifest), b"sig")).unwrap();
        path
    }

    fn store_options(dir: &Path, force: bool) -> ScanOptions {
        store_options_with(dir, force, "")
    }

    fn store_options_with(dir: &Path, force: bool, policy: &str) -> ScanOptions {
        let config_path = dir.join(CONFIG_FILE);
        std::fs::write(
            &config_path,
            format!(
                "[policy]\n{policy}\n[store]\ndir = {:?}\n",
                dir.join("results").display().to_string()
            ),
        )
        .unwrap();
        ScanOptions {
            config_path: Some(config_path),
            extension_id: Some(ExtensionId::parse(&"k".repeat(32)).unwrap()),
            use_store: true,
            force,
            ..Default::default()
        }
    }

    #[test]
    fn scan_stores_then_reuses() {
        let dir = tempfile::tempdir().unwrap();
        let package = write_package(dir.path(), r#"{"manifest_version":3,"permissions":["tabs","cookies"]}"#);

        let first = scan(&package, &store_options(dir.path(), false)).unwrap();
        assert!(!first.reused);
        assert!(!first.verdict.pass);
        assert_eq!(first.target_name, "ext.crx");

        // The package changes, but a fresh stored result is still served.
        write_package(dir.path(), r#"{"manifest_version":3}"#);
        let second = scan(&package, &store_options(dir.path(), true)).unwrap();
        assert!(second.reused);
        assert_eq!(second.report.findings, first.report.findings);

        let stored = JsonFileStore::new(dir.path().join("results")).all().unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn reused_result_follows_current_policy() {
        let dir = tempfile::tempdir().unwrap();
        let package = write_package(
            dir.path(),
            r#"{"manifest_version":3,"permissions":["tabs","cookies"]}"#,
        );
        let first = scan(&package, &store_options(dir.path(), false)).unwrap();
        assert!(!first.verdict.pass);

        let options = store_options_with(dir.path(), false, r#"ignore_rules = ["CRX-001"]"#);
        let second = scan(&package, &options).unwrap();
        assert!(second.reused);
        assert!(second.report.findings.is_empty());
        assert_eq!(second.report.ignored_findings, 2);
        assert_eq!(second.verdict.ignored_findings, 2);
        assert!(second.verdict.pass);
    }

    #[test]
    fn reevaluate_keeps_stored_advisory_note() {
        let raw = zip_with_manifest(r#"{"manifest_version":3,"permissions":["tabs"]}"#);
        let report = Analyzer::new()
            .with_advisor(Box::new(StaticAdvisor(Ok("Risk Level: High\nCareful.".into()))))
            .analyze(&raw, None)
            .unwrap();
        let stored = StoredScan::new(
            ExtensionId::parse(&"n".repeat(32)).unwrap(),
            &report,
            None,
            Utc::now(),
        );

        let mut policy = Policy::default();
        policy.overrides.insert("CRX-001".into(), Severity::Low);
        let again = Analyzer::new().with_policy(policy).reevaluate(stored);
        assert_eq!(again.findings.verdict().severity, Severity::Minimal);
        assert_eq!(again.findings.findings()[0].severity, Severity::Low);
        assert_eq!(again.findings.advisory().unwrap().description, "Risk Level: High\nCareful.");
        assert_eq!(again.risk.advisory_level.as_deref(), Some("High"));
        assert_eq!(again.sha256, report.sha256);
    }

    #[test]
    fn store_without_id_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let package = write_package(dir.path(), r#"{"manifest_version":3}"#);
        let mut options = store_options(dir.path(), false);
        options.extension_id = None;
        assert!(matches!(scan(&package, &options), Err(AuditError::Config(_))));
    }

    #[test]
    fn scan_with_metadata_and_note_files() {
        let dir = tempfile::tempdir().unwrap();
        let package = write_package(dir.path(), r#"{"manifest_version":3,"name":"Pkg"}"#);
        let meta = dir.path().join("meta.json");
        std::fs::write(&meta, r#"{"name":"Store Name","users":"10,000+"}"#).unwrap();
        let note = dir.path().join("note.txt");
        std::fs::write(&note, "Risk Level: Medium\nNew publisher.").unwrap();

        let options = ScanOptions {
            config_path: Some(dir.path().join("absent.toml")),
            metadata_path: Some(meta),
            advisory_path: Some(note),
            fail_on_override: Some(Severity::Low),
            ..Default::default()
        };
        let result = scan(&package, &options).unwrap();
        assert!(result.verdict.pass);
        assert_eq!(result.verdict.fail_threshold, Severity::Low);
        assert_eq!(result.report.risk.display_level(), "Medium");

        let rendered = render_report(&result, OutputFormat::Json).unwrap();
        assert!(rendered.contains("AI Context Analysis"));
    }
}
