//! Game-termination classification.

use std::fmt;

use shakmaty::{Chess, Position};

/// Halfmove clock value at which the fifty-move rule applies.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Repetition count that ends the game.
const THREEFOLD: usize = 3;

/// Why the game is over, if it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameOverStatus {
    /// The game continues.
    #[default]
    None,
    /// The side to move is in check and has no legal move.
    Checkmate,
    /// The side to move is not in check and has no legal move.
    Stalemate,
    /// Neither side has the material to deliver mate.
    InsufficientMaterial,
    /// The current position has occurred three times.
    ThreefoldRepetition,
    /// A hundred halfmoves without a capture or pawn move.
    FiftyMoveDraw,
    /// Any other terminal condition reported by the rules.
    OtherGameOver,
}

impl GameOverStatus {
    /// Classify `pos`, given how many times its position has occurred in the
    /// game so far (including the current occurrence).
    ///
    /// When several conditions hold, the first in this order wins:
    /// checkmate, stalemate, insufficient material, threefold repetition,
    /// fifty-move rule, other game over.
    pub fn classify(pos: &Chess, repetitions: usize) -> GameOverStatus {
        if pos.is_checkmate() {
            GameOverStatus::Checkmate
        } else if pos.is_stalemate() {
            GameOverStatus::Stalemate
        } else if pos.is_insufficient_material() {
            GameOverStatus::InsufficientMaterial
        } else if repetitions >= THREEFOLD {
            GameOverStatus::ThreefoldRepetition
        } else if pos.halfmoves() >= FIFTY_MOVE_HALFMOVES {
            GameOverStatus::FiftyMoveDraw
        } else if pos.is_game_over() {
            GameOverStatus::OtherGameOver
        } else {
            GameOverStatus::None
        }
    }

    /// `true` for every status except [`GameOverStatus::None`].
    pub const fn is_over(self) -> bool {
        !matches!(self, GameOverStatus::None)
    }
}

impl fmt::Display for GameOverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GameOverStatus::None => "In progress",
            GameOverStatus::Checkmate => "Checkmate",
            GameOverStatus::Stalemate => "Stalemate",
            GameOverStatus::InsufficientMaterial => "Draw by insufficient material",
            GameOverStatus::ThreefoldRepetition => "Draw by threefold repetition",
            GameOverStatus::FiftyMoveDraw => "Draw",
            GameOverStatus::OtherGameOver => "Game over",
        };
        f.write_str(text)
    }
}
