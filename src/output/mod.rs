pub mod console;
pub mod json;
pub mod sarif;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::policy::PolicyVerdict;
use crate::AnalysisReport;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Sarif,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Some(Self::Console),
            "json" => Some(Self::Json),
            "sarif" => Some(Self::Sarif),
            _ => None,
        }
    }
}

/// Render an analysis report into the specified format.
pub fn render(
    report: &AnalysisReport,
    verdict: &PolicyVerdict,
    format: OutputFormat,
    target_name: &str,
) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(console::render(report, verdict)),
        OutputFormat::Json => json::render(report, verdict, target_name),
        OutputFormat::Sarif => sarif::render(report, target_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_format_names() {
        assert_eq!(OutputFormat::from_str_lenient("TEXT"), Some(OutputFormat::Console));
        assert_eq!(OutputFormat::from_str_lenient("sarif"), Some(OutputFormat::Sarif));
        assert_eq!(OutputFormat::from_str_lenient("html"), None);
    }
}
