use crate::rules::{Detector, Finding, RuleMetadata, ScanTarget, Severity};

/// CRX-002: webRequest + webRequestBlocking
///
/// Reported in addition to the per-permission findings of CRX-001.
pub struct WebRequestBlockingDetector;

const RULE_ID: &str = "CRX-002";

impl Detector for WebRequestBlockingDetector {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: RULE_ID.into(),
            name: "Dangerous Permission Combination".into(),
            description: "Can intercept and block web requests in real time".into(),
            default_severity: Severity::High,
        }
    }

    fn run(&self, target: &ScanTarget<'_>) -> Vec<Finding> {
        let permissions = &target.manifest.permissions;
        let has = |name: &str| permissions.iter().any(|p| p == name);

        if !(has("webRequest") && has("webRequestBlocking")) {
            return Vec::new();
        }

        vec![Finding::new(
            RULE_ID,
            Severity::High,
            "Dangerous Permission Combination: webRequest + webRequestBlocking",
            "This extension can intercept, modify, and block web requests in real-time. \
             This combination could be used to modify sensitive web traffic or steal data.",
        )]
    }
}
