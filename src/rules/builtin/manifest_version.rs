use crate::rules::{Detector, Finding, RuleMetadata, ScanTarget, Severity};

/// CRX-006: Manifest version older than 3
pub struct ManifestVersionDetector;

const RULE_ID: &str = "CRX-006";

impl Detector for ManifestVersionDetector {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: RULE_ID.into(),
            name: "Older Manifest Version".into(),
            description: "Uses a manifest version with fewer security restrictions than V3".into(),
            default_severity: Severity::Medium,
        }
    }

    fn run(&self, target: &ScanTarget<'_>) -> Vec<Finding> {
        if target.manifest.format_version >= 3 {
            return Vec::new();
        }
        let declared = target
            .manifest
            .declared_version
            .as_deref()
            .unwrap_or("(unspecified)");

        vec![Finding::new(
            RULE_ID,
            Severity::Medium,
            "Older Manifest Version",
            format!(
                "This extension uses Manifest Version {declared}, which has fewer \
                 security restrictions than Manifest V3. Consider using extensions that have upgraded to V3."
            ),
        )]
    }
}
