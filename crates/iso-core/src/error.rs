use std::path::PathBuf;

/// Alias for `Result<T, IsoError>`.
pub type IsoResult<T> = Result<T, IsoError>;

/// Errors raised while loading tile catalogs and maps.
///
/// None of these are fatal to a running simulation: callers that need the
/// "keep going" policy use the `*_or_empty` loaders, which log the error and
/// fall back to an empty or partially populated value.
#[derive(Debug, thiserror::Error)]
pub enum IsoError {
    /// A file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The document is not valid JSON or does not have the expected shape.
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    /// A tile definition violates a catalog invariant.
    #[error("invalid tile \"{id}\": {reason}")]
    InvalidTile {
        /// The offending tile id (or a placeholder when the id itself is missing).
        id: String,
        /// Why the tile was rejected.
        reason: String,
    },

    /// A map document is structurally invalid.
    #[error("invalid map: {0}")]
    InvalidMap(String),
}

impl IsoError {
    /// Wrap an I/O error together with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
