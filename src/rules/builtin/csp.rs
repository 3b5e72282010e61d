use crate::rules::tables::{UNSAFE_EVAL, WASM_UNSAFE_EVAL};
use crate::rules::{Detector, Finding, RuleMetadata, ScanTarget, Severity};

/// CRX-007: Content Security Policy risk
///
/// At most one finding. `'wasm-unsafe-eval'` anywhere in the policy takes
/// priority over `'unsafe-eval'`.
pub struct CspDetector;

const RULE_ID: &str = "CRX-007";

impl Detector for CspDetector {
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            id: RULE_ID.into(),
            name: "Content Security Policy Risk".into(),
            description: "Content Security Policy permits dynamic code or WebAssembly evaluation"
                .into(),
            default_severity: Severity::High,
        }
    }

    fn run(&self, target: &ScanTarget<'_>) -> Vec<Finding> {
        let policy = &target.manifest.content_security_policy;
        let allows = |token: &str| policy.iter().any(|directive| directive.contains(token));

        if allows(WASM_UNSAFE_EVAL) {
            return vec![Finding::new(
                RULE_ID,
                Severity::High,
                "Unsafe WebAssembly Execution",
                "This extension's Content Security Policy allows 'wasm-unsafe-eval', which permits \
                 potentially dangerous WebAssembly code execution. This could be used to hide malicious \
                 code or perform CPU-intensive operations.",
            )];
        }

        if allows(UNSAFE_EVAL) {
            return vec![Finding::new(
                RULE_ID,
                Severity::High,
                "Unsafe JavaScript Evaluation",
                "This extension's Content Security Policy allows 'unsafe-eval', which permits \
                 dynamic JavaScript code execution using eval() and similar functions. This is a \
                 significant security risk as it could allow execution of malicious code.",
            )];
        }

        Vec::new()
    }
}
