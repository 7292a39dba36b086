//! Error types for configuration generation and artifact cleanup

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MixError>;

#[derive(Debug, Error)]
pub enum MixError {
    /// A chunk name was registered twice with different sources
    #[error("entry '{chunk}' is already registered with sources {existing:?}, refusing {requested:?}")]
    DuplicateEntry {
        chunk: String,
        existing: Vec<String>,
        requested: Vec<String>,
    },

    /// Deleting an artifact failed for a reason other than it being absent
    #[error("failed to clean `{}`", .path.display())]
    CleanupIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A module matched more than one enforced chunk group
    #[error("module `{resource}` matches several chunk groups: {}", .groups.join(", "))]
    ClassificationAmbiguity { resource: String, groups: Vec<String> },

    #[error("invalid file pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}
