use crate::rules::tables::MATCH_EVERYTHING_PATTERNS;
use crate::rules::{Detector, Finding, RuleMetadata, ScanTarget, Severity};

/// CRX-003: Broad host permissions
///
/// Textual containment: any host pattern containing one of the
/// match-everything patterns trips the rule. Since `*` is one of them, any
/// wildcard host pattern counts as broad.
pub struct BroadHostDetector;

const RULE_ID: &str = "CRX-003";

impl Detector for BroadHostDetector {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: RULE_ID.into(),
            name: "Broad Host Permissions".into(),
            description: "Host permissions cover many or all websites".into(),
            default_severity: Severity::High,
        }
    }

    fn run(&self, target: &ScanTarget<'_>) -> Vec<Finding> {
        let broad = target.manifest.host_permissions.iter().any(|host| {
            MATCH_EVERYTHING_PATTERNS
                .iter()
                .any(|pattern| host.contains(pattern))
        });

        if !broad {
            return Vec::new();
        }

        vec![Finding::new(
            RULE_ID,
            Severity::High,
            "Broad Host Permissions",
            "This extension has broad host permissions allowing it to access many or all websites. \
             This could potentially be used to steal sensitive data or track browsing activity.",
        )]
    }
}
