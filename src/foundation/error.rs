/// Convenience alias used by every fallible `layerfuse` API.
pub type FuseResult<T> = Result<T, FuseError>;

/// Recoverable errors raised at the crate boundary.
///
/// Compositing itself never fails: kernel contract violations panic, and stale tree lookups are
/// silent no-ops. Errors only come from building buffers out of raw data and from loading scenes.
#[derive(thiserror::Error, Debug)]
pub enum FuseError {
    /// Input data failed validation (dimensions, ranges, unknown identifiers).
    #[error("validation error: {0}")]
    Validation(String),

    /// A scene description could not be turned into a document.
    #[error("scene error: {0}")]
    Scene(String),

    /// JSON could not be parsed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, usually IO or image decoding.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FuseError {
    /// Build a [`FuseError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FuseError::Scene`].
    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }

    /// Build a [`FuseError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
