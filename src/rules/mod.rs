pub mod builtin;
pub mod finding;
pub mod policy;
pub(crate) mod tables;
pub mod verdict;

use crate::manifest::Manifest;
use crate::metadata::StoreMetadata;

pub use finding::{Finding, RuleMetadata, Severity};
pub use verdict::{aggregate, FindingList, Verdict};

/// Everything a detector may look at for one package.
#[derive(Debug, Clone, Copy)]
pub struct ScanTarget<'a> {
    pub manifest: &'a Manifest,
    /// Store-page details, when the caller has them. No built-in rule
    /// depends on them.
    pub metadata: Option<&'a StoreMetadata>,
}

impl<'a> ScanTarget<'a> {
    pub fn new(manifest: &'a Manifest) -> Self {
        Self {
            manifest,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Option<&'a StoreMetadata>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A detector checks a `ScanTarget` and produces findings.
pub trait Detector: Send + Sync {
    /// Metadata about this rule (id, name, severity).
    fn metadata(&self) -> RuleMetadata;

    /// Run the detector against a scan target.
    fn run(&self, target: &ScanTarget<'_>) -> Vec<Finding>;
}

/// The rule engine runs all registered detectors against a target, in
/// registration order.
pub struct RuleEngine {
    detectors: Vec<Box<dyn Detector>>,
}

impl RuleEngine {
    /// Create a new engine with all built-in detectors registered.
    pub fn new() -> Self {
        Self {
            detectors: builtin::all_detectors(),
        }
    }

    /// Run all detectors against a scan target.
    pub fn run(&self, target: &ScanTarget<'_>) -> Vec<Finding> {
        self.detectors.iter().flat_map(|d| d.run(target)).collect()
    }

    /// Evaluate a manifest. Never fails; missing data yields fewer findings.
    pub fn evaluate(&self, manifest: &Manifest, metadata: Option<&StoreMetadata>) -> Vec<Finding> {
        self.run(&ScanTarget::new(manifest).with_metadata(metadata))
    }

    /// List metadata for all registered rules.
    pub fn list_rules(&self) -> Vec<RuleMetadata> {
        self.detectors.iter().map(|d| d.metadata()).collect()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}
