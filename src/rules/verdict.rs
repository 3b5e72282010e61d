//! Aggregate risk verdict.
//!
//! The verdict is kept apart from the rule findings in [`FindingList`], so
//! consumers never have to rely on "element 0 is the verdict". The legacy
//! flat shape is still available through [`FindingList::to_flat`].

use serde::{Deserialize, Serialize};

use super::{Finding, Severity};

/// Rule id used when the verdict is rendered as a finding.
pub const VERDICT_RULE_ID: &str = "OVERALL";

/// Rule id and title of the advisory note.
pub const ADVISORY_RULE_ID: &str = "ADVISORY";
pub const ADVISORY_TITLE: &str = "AI Context Analysis";

/// The synthesized overall severity of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub severity: Severity,
    /// Number of `High` rule findings.
    pub high: usize,
    /// Number of `Medium` rule findings.
    pub medium: usize,
    /// Number of rule findings, `Info` excluded.
    pub total: usize,
}

impl Verdict {
    /// Score a set of rule findings. `Info` findings are ignored.
    pub fn from_findings(findings: &[Finding]) -> Self {
        let counted = findings.iter().filter(|f| f.severity != Severity::Info);
        let (mut high, mut medium, mut total) = (0, 0, 0);
        for finding in counted {
            total += 1;
            match finding.severity {
                Severity::High => high += 1,
                Severity::Medium => medium += 1,
                _ => {}
            }
        }

        Self {
            severity: severity_for(high, medium),
            high,
            medium,
            total,
        }
    }

    pub fn title(&self) -> String {
        format!("Overall Risk: {}", self.severity)
    }

    pub fn description(&self) -> String {
        format!(
            "Based on {} total findings, ranked without considering overall context, \
             including {} high-risk and {} medium-risk findings.",
            self.total, self.high, self.medium
        )
    }

    pub fn to_finding(&self) -> Finding {
        Finding::new(VERDICT_RULE_ID, self.severity, self.title(), self.description())
    }
}

/// Verdict thresholds, first match wins.
pub fn severity_for(high: usize, medium: usize) -> Severity {
    if high > 3 {
        Severity::Critical
    } else if high > 1 {
        Severity::High
    } else if medium > 1 || high > 0 {
        Severity::Medium
    } else if medium > 0 {
        Severity::Low
    } else {
        Severity::Minimal
    }
}

/// Verdict plus the ordered findings it was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingList {
    verdict: Verdict,
    findings: Vec<Finding>,
}

/// Compute the verdict for `findings` and attach it ahead of them.
pub fn aggregate(findings: Vec<Finding>) -> FindingList {
    FindingList {
        verdict: Verdict::from_findings(&findings),
        findings,
    }
}

impl FindingList {
    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    /// Rule findings followed by any advisory note, verdict excluded.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Append the advisory note as an `Info` finding. The verdict is not
    /// recomputed.
    pub fn push_advisory(&mut self, text: impl Into<String>) {
        self.findings.push(Finding::new(
            ADVISORY_RULE_ID,
            Severity::Info,
            ADVISORY_TITLE,
            text,
        ));
    }

    pub fn advisory(&self) -> Option<&Finding> {
        self.findings
            .iter()
            .find(|f| f.severity == Severity::Info && f.title == ADVISORY_TITLE)
    }

    /// Flat list with the verdict rendered as the first element.
    pub fn to_flat(&self) -> Vec<Finding> {
        std::iter::once(self.verdict.to_finding())
            .chain(self.findings.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn findings(high: usize, medium: usize) -> Vec<Finding> {
        let mut out = Vec::new();
        out.extend((0..high).map(|i| Finding::new("T", Severity::High, format!("h{i}"), "")));
        out.extend((0..medium).map(|i| Finding::new("T", Severity::Medium, format!("m{i}"), "")));
        out
    }

    #[test]
    fn threshold_boundaries() {
        assert_eq!(severity_for(4, 0), Severity::Critical);
        assert_eq!(severity_for(2, 0), Severity::High);
        assert_eq!(severity_for(1, 0), Severity::Medium);
        assert_eq!(severity_for(0, 2), Severity::Medium);
        assert_eq!(severity_for(0, 1), Severity::Low);
        assert_eq!(severity_for(0, 0), Severity::Minimal);
    }

    #[test]
    fn medium_count_never_lifts_above_medium() {
        assert_eq!(severity_for(0, 50), Severity::Medium);
        assert_eq!(severity_for(1, 50), Severity::Medium);
        assert_eq!(severity_for(3, 0), Severity::High);
    }

    #[test]
    fn verdict_is_first_in_flat_list() {
        let list = aggregate(findings(4, 1));
        let flat = list.to_flat();
        assert_eq!(flat.len(), 6);
        assert_eq!(flat[0].severity, Severity::Critical);
        assert_eq!(flat[0].title, "Overall Risk: Critical");
        assert_eq!(flat[0].rule_id, VERDICT_RULE_ID);
        assert_eq!(
            flat[0].description,
            "Based on 5 total findings, ranked without considering overall context, \
             including 4 high-risk and 1 medium-risk findings."
        );
        assert_eq!(flat[1].title, "h0");
    }

    #[test]
    fn info_and_low_are_not_counted_as_high_or_medium() {
        let mut input = findings(1, 0);
        input.push(Finding::new("T", Severity::Info, "note", ""));
        input.push(Finding::new("T", Severity::Low, "low", ""));
        let verdict = Verdict::from_findings(&input);
        assert_eq!(verdict.severity, Severity::Medium);
        assert_eq!(verdict.high, 1);
        assert_eq!(verdict.medium, 0);
        assert_eq!(verdict.total, 2);
    }

    #[test]
    fn advisory_does_not_change_verdict() {
        let mut list = aggregate(findings(0, 1));
        list.push_advisory("Risk Level: High\nLooks suspicious.");
        assert_eq!(list.verdict().severity, Severity::Low);
        assert_eq!(list.len(), 2);
        let note = list.advisory().unwrap();
        assert_eq!(note.severity, Severity::Info);
        assert_eq!(note.rule_id, ADVISORY_RULE_ID);
        assert_eq!(list.to_flat().last().unwrap().title, ADVISORY_TITLE);
    }

    #[test]
    fn empty_list_is_minimal() {
        let list = aggregate(Vec::new());
        assert!(list.is_empty());
        assert_eq!(list.verdict().severity, Severity::Minimal);
        assert_eq!(list.to_flat().len(), 1);
    }

    proptest! {
        #[test]
        fn thresholds_match_reference(high in 0usize..10, medium in 0usize..10) {
            let expected = match (high, medium) {
                (h, _) if h >= 4 => Severity::Critical,
                (h, _) if h >= 2 => Severity::High,
                (1, _) => Severity::Medium,
                (0, m) if m >= 2 => Severity::Medium,
                (0, 1) => Severity::Low,
                _ => Severity::Minimal,
            };
            let verdict = aggregate(findings(high, medium));
            prop_assert_eq!(verdict.verdict().severity, expected);
            prop_assert_eq!(verdict.verdict().high, high);
            prop_assert_eq!(verdict.verdict().medium, medium);
        }

        #[test]
        fn verdict_is_monotonic_in_high_count(high in 0usize..10, medium in 0usize..10) {
            prop_assert!(severity_for(high + 1, medium) >= severity_for(high, medium));
        }
    }
}
