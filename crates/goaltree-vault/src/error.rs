//! Error types for the vault adapter
//!
//! - Frontmatter errors (note text → property bag and back)
//! - Store errors (enumerate, read, write documents)
//! - Pass errors (anything that aborts a processing pass)

use goaltree_core::{ConfigError, NodeId};
use std::path::PathBuf;

/// Errors splitting, parsing or rendering a note's frontmatter
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    /// YAML could not be parsed or rendered
    #[error("invalid frontmatter yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Frontmatter parsed to something other than a mapping
    #[error("frontmatter is not a mapping")]
    NotAMapping,
}

/// Errors from a [`DocumentStore`](crate::store::DocumentStore)
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error on a vault path
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No document with that identifier
    #[error("document not found: {0}")]
    NotFound(NodeId),

    /// Document frontmatter could not be read or written
    #[error("frontmatter of {id}: {source}")]
    Frontmatter {
        id: NodeId,
        #[source]
        source: FrontmatterError,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create frontmatter error for document
    pub fn frontmatter(id: impl Into<NodeId>, source: impl Into<FrontmatterError>) -> Self {
        Self::Frontmatter {
            id: id.into(),
            source: source.into(),
        }
    }
}

/// Errors aborting a processing pass
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    /// Persistence failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Settings could not be loaded or rendered
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for passes
pub type PassResult<T> = Result<T, PassError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::NotFound(NodeId::new("Goals/A.md"));
        assert_eq!(err.to_string(), "document not found: Goals/A.md");

        let err = StoreError::frontmatter("Goals/B.md", FrontmatterError::NotAMapping);
        assert_eq!(
            err.to_string(),
            "frontmatter of Goals/B.md: frontmatter is not a mapping"
        );
    }

    #[test]
    fn pass_error_is_transparent() {
        let err: PassError = StoreError::io_error(
            "/vault/Goals/A.md",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        )
        .into();
        assert_eq!(err.to_string(), "io error at /vault/Goals/A.md: denied");
    }
}
