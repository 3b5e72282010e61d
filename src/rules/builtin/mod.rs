mod broad_host;
mod content_scripts;
mod csp;
mod manifest_version;
mod permission_combo;
mod permissions;
mod sensitive_domains;

use super::Detector;

/// Returns all built-in detectors, in the order their findings are reported.
pub fn all_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(permissions::PermissionRiskDetector),
        Box::new(permission_combo::WebRequestBlockingDetector),
        Box::new(broad_host::BroadHostDetector),
        Box::new(sensitive_domains::SensitiveDomainDetector),
        Box::new(content_scripts::BroadContentScriptDetector),
        Box::new(manifest_version::ManifestVersionDetector),
        Box::new(csp::CspDetector),
    ]
}
