//! UCI session errors.

/// Errors that can occur while talking to a UCI engine.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// A position descriptor is missing the `startpos` or `fen` keyword.
    #[error("malformed position: missing startpos or fen keyword")]
    MalformedPosition,

    /// Failed to parse a FEN string.
    #[error("invalid FEN: {fen}")]
    InvalidFen {
        /// The FEN string that failed to parse.
        fen: String,
    },

    /// A move in a position descriptor is not legal in its position.
    #[error("invalid move: {uci_move}")]
    InvalidMove {
        /// The UCI move string that failed to parse or apply.
        uci_move: String,
    },

    /// The session was closed; no further calls are accepted.
    #[error("engine session is closed")]
    SessionClosed,

    /// The engine process or its driver task has gone away.
    #[error("engine channel closed")]
    ChannelClosed,

    /// The engine process could not be started.
    #[error("failed to start engine {program}: {source}")]
    Spawn {
        /// The program that was launched.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An I/O error occurred on the engine's pipes.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
