use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

/// Failures while unwrapping the package container.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    #[error("Scratch storage error: {0}")]
    Scratch(#[from] std::io::Error),
}

/// Failures while locating or parsing `manifest.json`.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("manifest.json not found in extension")]
    NotFound,

    #[error("Invalid manifest JSON: {0}")]
    InvalidJson(String),
}

/// Failures of the optional advisory collaborator. Never fatal to a run.
#[derive(Error, Debug)]
pub enum AdvisoryError {
    #[error("Advisory provider unavailable: {0}")]
    Unavailable(String),

    #[error("Advisory request failed: {0}")]
    Failed(String),

    #[error("Advisory IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Invalid extension ID '{0}': must be 32 alphanumeric characters")]
    InvalidExtensionId(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AuditError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}
