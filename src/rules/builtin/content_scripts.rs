use crate::rules::tables::MATCH_EVERYTHING_PATTERNS;
use crate::rules::{Detector, Finding, RuleMetadata, ScanTarget, Severity};

/// CRX-005: Broad content script injection
///
/// Unlike CRX-003 this is an exact membership test: a content script match
/// pattern must itself be one of the match-everything patterns.
pub struct BroadContentScriptDetector;

const RULE_ID: &str = "CRX-005";

impl Detector for BroadContentScriptDetector {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: RULE_ID.into(),
            name: "Broad Content Script Injection".into(),
            description: "Injects content scripts into every website".into(),
            default_severity: Severity::High,
        }
    }

    fn run(&self, target: &ScanTarget<'_>) -> Vec<Finding> {
        let Some(scripts) = &target.manifest.content_scripts else {
            return Vec::new();
        };

        let broad = scripts.iter().any(|script| {
            script
                .matches
                .iter()
                .any(|m| MATCH_EVERYTHING_PATTERNS.contains(&m.as_str()))
        });

        if !broad {
            return Vec::new();
        }

        vec![Finding::new(
            RULE_ID,
            Severity::High,
            "Broad Content Script Injection",
            "This extension can inject scripts into any website. This means it could potentially \
             read sensitive data, modify website content, or steal credentials.",
        )]
    }
}
