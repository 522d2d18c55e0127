/// Convenience result type used across the layout engine.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Recoverable error taxonomy for configuration and construction boundaries.
///
/// Programming-error faults (inverted dirty regions, overlapping passes on one
/// document) are not represented here; they panic at the call site.
#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    /// Invalid caller-provided data (ranges, indices, denominators).
    #[error("validation error: {0}")]
    Validation(String),

    /// A style value was missing or had the wrong type for its key.
    #[error("style error: {0}")]
    Style(String),

    /// Errors when serializing or deserializing style configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LayoutError {
    /// Build a [`LayoutError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LayoutError::Style`] value.
    pub fn style(msg: impl Into<String>) -> Self {
        Self::Style(msg.into())
    }

    /// Build a [`LayoutError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
