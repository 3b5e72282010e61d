use crate::rules::tables::SENSITIVE_DOMAIN_KEYWORDS;
use crate::rules::{Detector, Finding, RuleMetadata, ScanTarget, Severity};

/// CRX-004: Access to sensitive domains
///
/// Host patterns naming banks, payment processors, crypto services, major
/// social/email/shopping sites, or code and package hosting. Case-sensitive
/// substring match; all matching patterns are listed in a single finding.
pub struct SensitiveDomainDetector;

const RULE_ID: &str = "CRX-004";

impl Detector for SensitiveDomainDetector {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: RULE_ID.into(),
            name: "Access to Sensitive Domains".into(),
            description: "Host permissions name high-value financial, social, or developer sites"
                .into(),
            default_severity: Severity::Medium,
        }
    }

    fn run(&self, target: &ScanTarget<'_>) -> Vec<Finding> {
        let matching: Vec<&str> = target
            .manifest
            .host_permissions
            .iter()
            .filter(|host| {
                SENSITIVE_DOMAIN_KEYWORDS
                    .iter()
                    .any(|keyword| host.contains(keyword))
            })
            .map(String::as_str)
            .collect();

        if matching.is_empty() {
            return Vec::new();
        }

        vec![Finding::new(
            RULE_ID,
            Severity::Medium,
            "Access to Sensitive Domains",
            format!(
                "This extension requests access to sensitive domains: {}. \
                 Ensure you trust this extension with access to these sites.",
                matching.join(", ")
            ),
        )]
    }
}
