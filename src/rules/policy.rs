use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{Finding, FindingList, Severity};

/// Policy verdict: pass/fail of an aggregated result against the
/// configured threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyVerdict {
    pub pass: bool,
    pub verdict: Severity,
    pub fail_threshold: Severity,
    /// Rule findings removed by `ignore_rules`.
    pub ignored_findings: usize,
}

/// Policy configuration loaded from `.crxaudit.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Minimum verdict severity that fails the scan.
    #[serde(default = "default_fail_on")]
    pub fail_on: Severity,
    /// Rule IDs to ignore entirely.
    #[serde(default)]
    pub ignore_rules: HashSet<String>,
    /// Per-rule severity overrides.
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

fn default_fail_on() -> Severity {
    Severity::High
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            fail_on: Severity::High,
            ignore_rules: HashSet::new(),
            overrides: HashMap::new(),
        }
    }
}

impl Policy {
    /// Filter rule findings: remove ignored rules, apply overrides. Runs
    /// before aggregation so the verdict reflects the effective findings.
    pub fn apply(&self, findings: Vec<Finding>) -> Vec<Finding> {
        findings
            .into_iter()
            .filter(|f| !self.ignore_rules.contains(&f.rule_id))
            .map(|mut f| {
                if let Some(&override_sev) = self.overrides.get(&f.rule_id) {
                    f.severity = override_sev;
                }
                f
            })
            .collect()
    }

    /// Number of findings `apply` would drop.
    pub fn ignored_count(&self, findings: &[Finding]) -> usize {
        findings
            .iter()
            .filter(|f| self.ignore_rules.contains(&f.rule_id))
            .count()
    }

    /// Evaluate an aggregated result against the fail threshold.
    pub fn evaluate(&self, list: &FindingList, ignored_findings: usize) -> PolicyVerdict {
        let verdict = list.verdict().severity;
        PolicyVerdict {
            pass: verdict < self.fail_on,
            verdict,
            fail_threshold: self.fail_on,
            ignored_findings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::aggregate;

    fn make_finding(rule_id: &str, severity: Severity) -> Finding {
        Finding::new(rule_id, severity, "Test", "test")
    }

    #[test]
    fn default_policy_fails_on_high_verdict() {
        let policy = Policy::default();
        let list = aggregate(vec![
            make_finding("CRX-001", Severity::High),
            make_finding("CRX-003", Severity::High),
        ]);
        assert!(!policy.evaluate(&list, 0).pass);
    }

    #[test]
    fn default_policy_passes_on_medium_verdict() {
        let policy = Policy::default();
        let list = aggregate(vec![make_finding("CRX-001", Severity::High)]);
        let verdict = policy.evaluate(&list, 0);
        assert!(verdict.pass);
        assert_eq!(verdict.verdict, Severity::Medium);
    }

    #[test]
    fn ignore_rule_removes_finding() {
        let mut policy = Policy::default();
        policy.ignore_rules.insert("CRX-006".into());
        let findings = vec![
            make_finding("CRX-006", Severity::Medium),
            make_finding("CRX-001", Severity::Medium),
        ];
        assert_eq!(policy.ignored_count(&findings), 1);
        let effective = policy.apply(findings);
        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].rule_id, "CRX-001");
    }

    #[test]
    fn override_changes_what_aggregation_counts() {
        let mut policy = Policy::default();
        policy.overrides.insert("CRX-001".into(), Severity::Info);
        let effective = policy.apply(vec![make_finding("CRX-001", Severity::High)]);
        let list = aggregate(effective);
        assert_eq!(list.verdict().severity, Severity::Minimal);
        assert!(policy.evaluate(&list, 0).pass);
    }

    #[test]
    fn deserializes_lowercase_severities() {
        let policy: Policy = toml::from_str(
            r#"
            fail_on = "critical"
            ignore_rules = ["CRX-006"]
            [overrides]
            "CRX-004" = "low"
            "#,
        )
        .unwrap();
        assert_eq!(policy.fail_on, Severity::Critical);
        assert!(policy.ignore_rules.contains("CRX-006"));
        assert_eq!(policy.overrides["CRX-004"], Severity::Low);
    }
}
