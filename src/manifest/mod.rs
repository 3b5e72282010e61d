//! Manifest extraction and normalization.
//!
//! Reads the root-level `manifest.json` from an [`ArchiveView`], normalizes
//! it into a [`Manifest`] whose list fields are always present, and attaches
//! the URLs discovered by scanning every text entry of the package.

pub mod urls;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::archive::ArchiveView;
use crate::error::{ManifestError, Result};

/// Logical path of the manifest inside the package.
pub const MANIFEST_PATH: &str = "manifest.json";

/// Normalized extension manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Declared `manifest_version`; missing or non-numeric values become 0.
    #[serde(rename = "manifest_version", default)]
    pub format_version: i64,
    /// `manifest_version` as authored, for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub optional_permissions: Vec<String>,
    #[serde(default)]
    pub host_permissions: Vec<String>,
    #[serde(default)]
    pub content_scripts: Option<Vec<ContentScript>>,
    /// Directives, flattened to `"key: value"` when declared as a mapping.
    #[serde(default)]
    pub content_security_policy: Vec<String>,
    #[serde(default)]
    pub embedded_urls: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    #[serde(default)]
    pub web_accessible_resources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentScript {
    #[serde(default)]
    pub matches: Vec<String>,
    #[serde(default)]
    pub js: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_worker: Option<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
}

impl Background {
    /// Service worker if declared, else the comma-joined background scripts.
    pub fn summary(&self) -> String {
        match &self.service_worker {
            Some(worker) => worker.clone(),
            None => self.scripts.join(", "),
        }
    }
}

/// Extract the manifest and embedded URLs from an opened package.
///
/// Only a missing manifest, invalid manifest JSON, or an unreadable
/// manifest entry are fatal. Unreadable or binary entries are skipped by
/// the URL scan.
pub fn extract(view: &mut ArchiveView) -> Result<Manifest> {
    let bytes = view.read_first(MANIFEST_PATH)?.ok_or(ManifestError::NotFound)?;
    let mut manifest = parse(&bytes)?;
    manifest.embedded_urls = urls::scan_archive(view);
    Ok(manifest)
}

/// Parse and normalize raw manifest bytes. `embedded_urls` is left empty.
pub fn parse(bytes: &[u8]) -> std::result::Result<Manifest, ManifestError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| ManifestError::InvalidJson(e.to_string()))?;
    let Value::Object(root) = value else {
        return Err(ManifestError::InvalidJson(
            "manifest root is not a JSON object".into(),
        ));
    };
    Ok(normalize(&root))
}

fn normalize(root: &Map<String, Value>) -> Manifest {
    Manifest {
        format_version: root.get("manifest_version").map(loose_int).unwrap_or(0),
        declared_version: root.get("manifest_version").and_then(text),
        name: root.get("name").and_then(text),
        version: root.get("version").and_then(text),
        description: root.get("description").and_then(text),
        permissions: string_list(root.get("permissions")),
        optional_permissions: string_list(root.get("optional_permissions")),
        host_permissions: string_list(root.get("host_permissions")),
        content_scripts: root.get("content_scripts").and_then(content_scripts),
        content_security_policy: csp_directives(root.get("content_security_policy")),
        embedded_urls: BTreeSet::new(),
        background: root.get("background").and_then(background),
        web_accessible_resources: web_accessible_resources(root.get("web_accessible_resources")),
    }
}

/// Integer value of a number or of a string's leading digits; anything else is 0.
fn loose_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim_start();
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => (-1, rest),
                None => (1, s.strip_prefix('+').unwrap_or(s)),
            };
            let end = digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(digits.len());
            digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
        }
        _ => 0,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn content_scripts(value: &Value) -> Option<Vec<ContentScript>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_object)
            .map(|script| ContentScript {
                matches: string_list(script.get("matches")),
                js: string_list(script.get("js")),
            })
            .collect(),
    )
}

fn csp_directives(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Vec::new(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, v)| match v {
                Value::String(s) => format!("{key}: {s}"),
                other => format!("{key}: {other}"),
            })
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(other) => vec![other.to_string()],
    }
}

fn background(value: &Value) -> Option<Background> {
    let map = value.as_object()?;
    Some(Background {
        service_worker: map.get("service_worker").and_then(Value::as_str).map(str::to_string),
        scripts: string_list(map.get("scripts")),
    })
}

/// MV2 declares a list of paths, MV3 a list of `{resources, matches}`.
fn web_accessible_resources(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for item in items {
        match item {
            Value::String(path) => out.push(path.clone()),
            Value::Object(group) => out.extend(string_list(group.get("resources"))),
            _ => {}
        }
    }
    out
}
