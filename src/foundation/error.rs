/// Result alias used throughout the crate.
pub type GratingResult<T> = Result<T, GratingError>;

/// Crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum GratingError {
    /// Invalid stimulus configuration (bad label, non-positive size, ...).
    #[error("configuration error: {0}")]
    Config(String),

    /// A frame could not be synthesized.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Writing frames to a video or image failed.
    #[error("export error: {0}")]
    Export(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other error, usually I/O with attached context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GratingError {
    /// Build a [`GratingError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`GratingError::Synthesis`].
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Build a [`GratingError::Export`].
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`GratingError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for configuration errors.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<serde_json::Error> for GratingError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}
