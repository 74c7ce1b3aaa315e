//! Ledger errors.

/// Errors produced while loading or mutating a [`MoveLedger`](crate::MoveLedger).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The move is not legal in the current position, or could not be read
    /// as either UCI or SAN notation. The ledger is left unchanged.
    #[error("illegal move: {notation}")]
    IllegalMove {
        /// The notation as supplied by the caller.
        notation: String,
    },

    /// A FEN string could not be parsed or describes an impossible position.
    #[error("invalid FEN: {fen}")]
    InvalidFen {
        /// The FEN string that failed to parse.
        fen: String,
    },

    /// A move in PGN movetext could not be replayed.
    #[error("invalid move text at move {index}: {token}")]
    InvalidMoveText {
        /// Zero-based index of the offending move among the parsed moves.
        index: usize,
        /// The move token as it appeared in the text.
        token: String,
    },
}
