use thiserror::Error;

#[derive(Debug, Error)]
pub enum FoundryError {
    #[error("invalid id '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("invalid path '{0}': must be relative and must not contain '..'")]
    InvalidRelativePath(String),

    #[error("library not found: {0}")]
    LibraryNotFound(String),

    #[error("composition not found: {0}")]
    CompositionNotFound(String),

    #[error("unsupported composition format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),

    #[error("manifest is corrupt: {0}")]
    CorruptManifest(String),

    #[error("sidecar for '{0}' would replace the file itself; overlay.sidecar_suffix must be non-empty")]
    SidecarCollision(String),

    #[error("stage '{stage}' failed: {reason}")]
    StageFailed { stage: String, reason: String },

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FoundryError>;
