//! Errors raised while reading a device layout.

/// Why a layout could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The layout file could not be read.
    #[error("cannot read layout file: {0}")]
    Io(#[from] std::io::Error),

    /// The text is not a well-formed layout document.
    #[error("malformed layout: {0}")]
    Parse(String),

    /// A required value is absent or empty.
    #[error("layout is missing `{0}`")]
    Missing(String),

    /// The layout is well-formed but inconsistent.
    #[error("invalid layout: {0}")]
    Invalid(String),
}
