use crate::error::Result;
use crate::manifest::MANIFEST_PATH;
use crate::rules::verdict::{ADVISORY_RULE_ID, ADVISORY_TITLE};
use crate::rules::{RuleEngine, Severity};
use crate::AnalysisReport;

use serde_json::{json, Value};
use uuid::Uuid;

/// Render findings as SARIF 2.1.0.
///
/// Rule descriptors come from the registered detectors; the aggregate
/// verdict is not a result and is recorded under run `properties`.
pub fn render(report: &AnalysisReport, target_name: &str) -> Result<String> {
    let mut rules: Vec<Value> = RuleEngine::new()
        .list_rules()
        .into_iter()
        .map(|rule| {
            json!({
                "id": rule.id,
                "name": rule.name,
                "shortDescription": { "text": rule.name },
                "fullDescription": { "text": rule.description },
                "defaultConfiguration": {
                    "level": severity_to_sarif_level(rule.default_severity),
                },
            })
        })
        .collect();
    if report.findings.advisory().is_some() {
        rules.push(json!({
            "id": ADVISORY_RULE_ID,
            "name": ADVISORY_TITLE,
            "shortDescription": { "text": ADVISORY_TITLE },
            "defaultConfiguration": { "level": "note" },
        }));
    }

    let results: Vec<Value> = report
        .findings
        .findings()
        .iter()
        .map(|f| {
            json!({
                "ruleId": f.rule_id,
                "level": severity_to_sarif_level(f.severity),
                "message": { "text": format!("{}: {}", f.title, f.description) },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": { "uri": MANIFEST_PATH },
                    },
                }],
                "properties": { "severity": f.severity },
            })
        })
        .collect();

    let verdict = report.findings.verdict();
    let sarif = json!({
        "$schema": "https://docs.oasis-open.org/sarif/sarif/v2.1.0/errata01/os/schemas/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "crxaudit",
                    "version": env!("CARGO_PKG_VERSION"),
                    "semanticVersion": env!("CARGO_PKG_VERSION"),
                    "rules": rules,
                },
            },
            "results": results,
            "automationDetails": {
                "id": format!("crxaudit/{}", target_name),
                "guid": Uuid::new_v4().to_string(),
            },
            "properties": {
                "verdict": {
                    "severity": verdict.severity,
                    "title": verdict.title(),
                    "description": verdict.description(),
                    "high": verdict.high,
                    "medium": verdict.medium,
                    "total": verdict.total,
                },
                "advisoryLevel": report.risk.advisory_level,
                "sha256": report.sha256,
            },
        }],
    });

    let output = serde_json::to_string_pretty(&sarif)?;
    Ok(output)
}

fn severity_to_sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low | Severity::Minimal | Severity::Info => "note",
    }
}
