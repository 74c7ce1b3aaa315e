//! Explorer errors.

/// Errors from querying the statistics service.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    /// The request could not be sent or the body could not be decoded.
    #[error("explorer request failed: {source}")]
    Transport {
        /// The underlying HTTP client error.
        #[from]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("explorer returned HTTP {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// The configured base URL is not a valid URL.
    #[error("invalid explorer URL: {source}")]
    InvalidUrl {
        /// The URL parse error.
        #[from]
        source: url::ParseError,
    },
}

impl ExplorerError {
    /// HTTP status associated with the failure, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ExplorerError::Status { status } => Some(*status),
            ExplorerError::Transport { source } => source.status().map(|s| s.as_u16()),
            ExplorerError::InvalidUrl { .. } => None,
        }
    }
}

/// Errors from weighted move selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SampleError {
    /// The result has no moves, or none of them has any games.
    #[error("no games to sample from")]
    NoGames,

    /// The walk over the entries ended without reaching the drawn value.
    #[error("weighted walk exhausted: drew {drawn} of {total} games")]
    Exhausted {
        /// The value drawn from the random source.
        drawn: u64,
        /// The total the draw was taken against.
        total: u64,
    },
}

/// Errors from saving or reading the preferences file.
#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    /// The file could not be read or written.
    #[error("preferences I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The preferences could not be encoded.
    #[error("preferences encoding error: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
