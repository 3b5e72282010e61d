use crate::rules::policy::PolicyVerdict;
use crate::rules::Severity;
use crate::stats::StatsSnapshot;
use crate::AnalysisReport;

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "[CRITICAL]",
        Severity::High => "[HIGH]    ",
        Severity::Medium => "[MEDIUM]  ",
        Severity::Low => "[LOW]     ",
        Severity::Minimal => "[MINIMAL] ",
        Severity::Info => "[INFO]    ",
    }
}

/// Render a report for the terminal. Findings keep rule order.
pub fn render(report: &AnalysisReport, verdict: &PolicyVerdict) -> String {
    let mut output = String::new();
    let overall = report.findings.verdict();

    output.push_str(&format!(
        "\n  {} {}\n",
        severity_tag(overall.severity),
        overall.title()
    ));
    output.push_str(&format!("             {}\n\n", overall.description()));

    let name = report.manifest.name.as_deref().unwrap_or("(unnamed)");
    let version = report.manifest.version.as_deref().unwrap_or("?");
    output.push_str(&format!(
        "  {} {} (manifest v{})\n  sha256 {}\n\n",
        name, version, report.manifest.format_version, report.sha256
    ));

    if report.findings.is_empty() {
        output.push_str("  No security findings detected.\n\n");
    } else {
        output.push_str(&format!(
            "  {} finding(s) detected:\n\n",
            report.findings.len()
        ));
        for finding in report.findings.findings() {
            output.push_str(&format!(
                "  {} {} {}\n",
                severity_tag(finding.severity),
                finding.rule_id,
                finding.title
            ));
            for line in finding.description.lines() {
                output.push_str(&format!("             {}\n", line));
            }
            output.push('\n');
        }
    }

    output.push_str(&format!(
        "  Embedded URLs: {}\n",
        report.manifest.embedded_urls.len()
    ));
    if report.risk.disagrees() {
        output.push_str(&format!(
            "  Risk level: {} / {} (advisory / computed)\n",
            report.risk.display_level(),
            report.risk.verdict
        ));
    } else {
        output.push_str(&format!("  Risk level: {}\n", report.risk.display_level()));
    }

    let status = if verdict.pass { "PASS" } else { "FAIL" };
    output.push_str(&format!(
        "  Result: {} (threshold: {}, verdict: {})\n",
        status, verdict.fail_threshold, verdict.verdict,
    ));
    if verdict.ignored_findings > 0 {
        output.push_str(&format!(
            "  {} finding(s) ignored by policy\n",
            verdict.ignored_findings
        ));
    }
    output.push('\n');

    output
}

/// Render the dashboard rollup.
pub fn render_stats(snapshot: &StatsSnapshot) -> String {
    let counts = &snapshot.severity_counts;
    let mut output = String::new();

    output.push_str(&format!(
        "\n  {} stored result(s), {} in the last 30 days\n\n",
        counts.total(),
        snapshot.scans_last_30_days
    ));
    for (label, count) in [
        ("Critical", counts.critical),
        ("High", counts.high),
        ("Medium", counts.medium),
        ("Low", counts.low),
        ("Minimal", counts.minimal),
    ] {
        output.push_str(&format!("  {:<10} {}\n", label, count));
    }
    output.push_str(&format!(
        "\n  Requesting <all_urls>: {}\n",
        snapshot.all_urls_count
    ));

    if !snapshot.spiciest.is_empty() {
        output.push_str("\n  Most findings:\n");
        for entry in &snapshot.spiciest {
            output.push_str(&format!(
                "  {:>4}  {}  {}\n",
                entry.finding_count,
                entry.extension_id,
                entry.extension_name.as_deref().unwrap_or("-")
            ));
        }
    }
    output.push('\n');

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::RiskAssessment;
    use crate::rules::policy::Policy;
    use crate::test_support::zip_with_manifest;

    #[test]
    fn verdict_comes_first_and_result_last() {
        let raw = zip_with_manifest(
            r#"{"manifest_version":2,"name":"Demo","permissions":["tabs","cookies"]}"#,
        );
        let report = crate::analyze(&raw, None).unwrap();
        let verdict = Policy::default().evaluate(&report.findings, 0);
        let text = render(&report, &verdict);

        let overall = text.find("Overall Risk: High").unwrap();
        let first_rule = text.find("CRX-001 High-Risk Permission: tabs").unwrap();
        assert!(overall < first_rule);
        assert!(text.contains("[MEDIUM]   CRX-006 Older Manifest Version"));
        assert!(text.contains("Embedded URLs: 0"));
        assert!(text.trim_end().ends_with("Result: FAIL (threshold: High, verdict: High)"));
    }

    #[test]
    fn clean_package() {
        let raw = zip_with_manifest(r#"{"manifest_version":3,"name":"Clean"}"#);
        let report = crate::analyze(&raw, None).unwrap();
        let verdict = Policy::default().evaluate(&report.findings, 0);
        let text = render(&report, &verdict);
        assert!(text.contains("Overall Risk: Minimal"));
        assert!(text.contains("No security findings detected."));
        assert!(text.contains("Result: PASS"));
    }

    #[test]
    fn risk_line_shows_both_levels_only_on_disagreement() {
        let raw = zip_with_manifest(r#"{"manifest_version":3,"permissions":["tabs"]}"#);
        let verdict_for = |report: &AnalysisReport| Policy::default().evaluate(&report.findings, 0);

        let mut report = crate::analyze(&raw, None).unwrap();
        report.findings.push_advisory("Risk Level: critical\nUnknown publisher.");
        report.risk = RiskAssessment::from_findings(&report.findings);
        let text = render(&report, &verdict_for(&report));
        assert!(text.contains("  Risk level: Critical / Medium (advisory / computed)\n"));

        let mut report = crate::analyze(&raw, None).unwrap();
        report.findings.push_advisory("Risk Level: medium\nAs expected.");
        report.risk = RiskAssessment::from_findings(&report.findings);
        let text = render(&report, &verdict_for(&report));
        assert!(text.contains("  Risk level: Medium\n"));
        assert!(!text.contains("advisory / computed"));
    }

    #[test]
    fn stats_table() {
        use crate::store::fixtures::{high, id, stored};

        let now = chrono::Utc::now();
        let scans = vec![stored(id('a'), high(2), now), stored(id('b'), Vec::new(), now)];
        let text = render_stats(&crate::stats::compute(&scans, now, 5));
        assert!(text.contains("2 stored result(s), 2 in the last 30 days"));
        assert!(text.contains("  High       1\n"));
        assert!(text.contains(&format!("     2  {}  Fixture", id('a'))));
    }
}
