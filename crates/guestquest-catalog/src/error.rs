//! Error types for the character catalog.

use std::path::PathBuf;

/// Errors raised while loading or validating character sets.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A set file or directory could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A set file is not valid JSON for the expected shape.
    #[error("character set {set_id} is not valid JSON: {source}")]
    Parse {
        set_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON parsed but violates a structural rule.
    #[error("character set {set_id} is invalid: {reason}")]
    Invalid { set_id: String, reason: String },
}
