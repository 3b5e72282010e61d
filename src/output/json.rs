use crate::advisory::RiskAssessment;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::rules::policy::PolicyVerdict;
use crate::rules::FindingList;
use crate::AnalysisReport;

use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    target: &'a str,
    sha256: &'a str,
    manifest: &'a Manifest,
    findings: &'a FindingList,
    risk: &'a RiskAssessment,
    policy: &'a PolicyVerdict,
}

/// Render the full report as JSON.
pub fn render(report: &AnalysisReport, verdict: &PolicyVerdict, target: &str) -> Result<String> {
    let json = JsonReport {
        target,
        sha256: &report.sha256,
        manifest: &report.manifest,
        findings: &report.findings,
        risk: &report.risk,
        policy: verdict,
    };
    Ok(serde_json::to_string_pretty(&json)?)
}
