use crate::rules::tables::{HIGH_RISK_PERMISSIONS, MEDIUM_RISK_PERMISSIONS};
use crate::rules::{Detector, Finding, RuleMetadata, ScanTarget, Severity};

/// CRX-001: Permission risk
///
/// One finding per declared permission found in the high- or medium-risk
/// table, in declaration order. High-risk membership wins.
pub struct PermissionRiskDetector;

const RULE_ID: &str = "CRX-001";

impl Detector for PermissionRiskDetector {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: RULE_ID.into(),
            name: "Permission Risk".into(),
            description: "Requests a permission with broad access to browsing data or browser control"
                .into(),
            default_severity: Severity::High,
        }
    }

    fn run(&self, target: &ScanTarget<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for permission in &target.manifest.permissions {
            if let Some(rationale) = HIGH_RISK_PERMISSIONS.get(permission.as_str()) {
                findings.push(Finding::new(
                    RULE_ID,
                    Severity::High,
                    format!("High-Risk Permission: {permission}"),
                    format!(
                        "This extension has the {permission} permission. {rationale}. \
                         This could potentially be used maliciously to compromise security or privacy."
                    ),
                ));
            } else if let Some(rationale) = MEDIUM_RISK_PERMISSIONS.get(permission.as_str()) {
                findings.push(Finding::new(
                    RULE_ID,
                    Severity::Medium,
                    format!("Medium-Risk Permission: {permission}"),
                    format!("This extension has the {permission} permission. {rationale}."),
                ));
            }
        }

        findings
    }
}
