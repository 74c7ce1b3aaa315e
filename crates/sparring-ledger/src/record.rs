//! A single applied move.

/// One entry of the ledger history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MoveRecord {
    /// Standard algebraic notation including check suffix, e.g. `Nf3` or `Qxf7#`.
    pub san: String,
    /// Long algebraic (UCI) notation, e.g. `g1f3` or `e7e8q`.
    pub lan: String,
    /// FEN of the position the move was played from.
    pub fen_before: String,
    /// FEN of the position the move produced.
    pub fen_after: String,
}
