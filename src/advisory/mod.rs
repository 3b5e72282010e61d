//! Optional advisory note from an external text-generation collaborator.
//!
//! The core only builds the prompt and folds the reply into the finding
//! list as one `Info` finding. If the reply opens with a `Risk Level: <word>`
//! line, that word is kept next to the computed verdict in
//! [`RiskAssessment`]; it may replace the verdict for display, never for
//! aggregation.

use std::borrow::Cow;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AdvisoryError;
use crate::manifest::Manifest;
use crate::metadata::StoreMetadata;
use crate::rules::{FindingList, Severity};

/// Prefix of the first line carrying the collaborator's own risk level.
pub const RISK_LEVEL_PREFIX: &str = "Risk Level:";

static URL_REDACT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());

/// Source of advisory notes.
pub trait AdvisoryProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce a note for `prompt`. Errors are logged and the note omitted.
    fn advise(&self, prompt: &str) -> Result<String, AdvisoryError>;
}

/// Serves a note written ahead of time to a file.
#[derive(Debug, Clone)]
pub struct FileAdvisor {
    path: PathBuf,
}

impl FileAdvisor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AdvisoryProvider for FileAdvisor {
    fn name(&self) -> &'static str {
        "file"
    }

    fn advise(&self, _prompt: &str) -> Result<String, AdvisoryError> {
        let text = std::fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Err(AdvisoryError::Unavailable(format!(
                "{} is empty",
                self.path.display()
            )));
        }
        Ok(text)
    }
}

/// The two independent severities of a run, side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Computed from rule findings.
    pub verdict: Severity,
    /// Word after `Risk Level:` in the advisory note, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory_level: Option<String>,
}

impl RiskAssessment {
    pub fn from_findings(list: &FindingList) -> Self {
        Self {
            verdict: list.verdict().severity,
            advisory_level: list.advisory().and_then(|f| risk_level(&f.description)),
        }
    }

    pub fn advisory_severity(&self) -> Option<Severity> {
        self.advisory_level
            .as_deref()
            .and_then(Severity::from_str_lenient)
    }

    /// Level to show: the advisory level (capitalized) when present,
    /// otherwise the verdict.
    pub fn display_level(&self) -> String {
        match &self.advisory_level {
            Some(level) => capitalize(level),
            None => self.verdict.to_string(),
        }
    }

    /// Whether both severities are known and disagree.
    pub fn disagrees(&self) -> bool {
        self.advisory_severity()
            .is_some_and(|advisory| advisory != self.verdict)
    }
}

/// Extract `<word>` from a note whose first line is `Risk Level: <word>`.
pub fn risk_level(note: &str) -> Option<String> {
    let first = note.lines().next()?;
    let level = first.strip_prefix(RISK_LEVEL_PREFIX)?.trim();
    if level.is_empty() {
        None
    } else {
        Some(level.to_string())
    }
}

/// Replace every `http(s)://...` run with `[URL]`.
pub fn redact_urls(text: &str) -> Cow<'_, str> {
    URL_REDACT_RE.replace_all(text, "[URL]")
}

/// Build the prompt handed to the collaborator: manifest summary, store
/// details, then the findings computed so far with URLs redacted.
pub fn format_prompt(
    manifest: &Manifest,
    metadata: Option<&StoreMetadata>,
    findings: &FindingList,
) -> String {
    let empty = StoreMetadata::default();
    let meta = metadata.unwrap_or(&empty);
    let field = |v: &Option<String>| v.clone().unwrap_or_default();

    let name = meta.name.as_ref().or(manifest.name.as_ref()).cloned().unwrap_or_default();
    let content_scripts = manifest
        .content_scripts
        .as_ref()
        .map(|scripts| {
            scripts
                .iter()
                .map(|s| s.matches.join(", "))
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_default();
    let background = manifest
        .background
        .as_ref()
        .map(|b| b.summary())
        .unwrap_or_default();

    let mut prompt = String::new();
    prompt.push_str("Analyze this Chrome extension:\n\n");
    prompt.push_str("Extension Details:\n");
    prompt.push_str(&format!("Name: {name}\n"));
    prompt.push_str(&format!("Version: {}\n", field(&manifest.version)));
    prompt.push_str(&format!("Description: {}\n", field(&manifest.description)));
    prompt.push_str(&format!("Manifest Version: {}\n", manifest.format_version));
    prompt.push_str(&format!("Size: {}\n", field(&meta.size)));
    prompt.push_str(&format!("Users: {}\n", field(&meta.users)));
    prompt.push_str(&format!("Last Updated: {}\n", field(&meta.last_updated)));
    prompt.push_str(&format!(
        "Rating: {} ({} reviews)\n",
        field(&meta.rating),
        field(&meta.rating_count)
    ));
    prompt.push_str(&format!("Author: {}\n", field(&meta.author)));
    prompt.push_str(&format!("Developer Info: {}\n\n", field(&meta.developer_info)));

    prompt.push_str("Technical Details:\n");
    prompt.push_str(&format!("Permissions: {}\n", manifest.permissions.join(", ")));
    prompt.push_str(&format!(
        "Host Permissions: {}\n",
        manifest.host_permissions.join(", ")
    ));
    prompt.push_str(&format!("Content Scripts: {content_scripts}\n"));
    prompt.push_str(&format!("Background Scripts: {background}\n"));
    prompt.push_str(&format!(
        "Web Accessible Resources: {}\n",
        manifest.web_accessible_resources.join(", ")
    ));
    prompt.push_str(&format!(
        "CSP: {}\n\n",
        manifest.content_security_policy.join("; ")
    ));

    prompt.push_str("Security Findings:\n");
    let rendered: Vec<String> = findings
        .to_flat()
        .iter()
        .map(|f| format!("{}: {}\n{}", f.severity, f.title, redact_urls(&f.description)))
        .collect();
    prompt.push_str(&rendered.join("\n\n"));
    prompt.push('\n');

    prompt
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
pub(crate) struct StaticAdvisor(pub Result<String, String>);

#[cfg(test)]
impl AdvisoryProvider for StaticAdvisor {
    fn name(&self) -> &'static str {
        "static"
    }

    fn advise(&self, _prompt: &str) -> Result<String, AdvisoryError> {
        self.0.clone().map_err(AdvisoryError::Failed)
    }
}
