//! Response model of the statistics service.

use serde::{Deserialize, Serialize};

/// Aggregated results of the games in which one move was played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    /// The move in SAN.
    pub san: String,
    /// The move in long algebraic notation. The service calls this `uci`.
    #[serde(alias = "uci")]
    pub lan: String,
    /// Games won by White after this move.
    #[serde(rename = "white")]
    pub white_wins: u64,
    /// Drawn games after this move.
    pub draws: u64,
    /// Games won by Black after this move.
    #[serde(rename = "black")]
    pub black_wins: u64,
}

impl StatEntry {
    /// Number of games in which this move was played.
    pub fn total_games(&self) -> u64 {
        self.white_wins + self.draws + self.black_wins
    }
}

/// Opening classification of the queried position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opening {
    pub eco: String,
    pub name: String,
}

/// Statistics for a position: overall results and per-move breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerResult {
    #[serde(rename = "white")]
    pub total_white: u64,
    #[serde(rename = "draws")]
    pub total_draws: u64,
    #[serde(rename = "black")]
    pub total_black: u64,
    /// Moves in the order the service ranks them.
    #[serde(default)]
    pub moves: Vec<StatEntry>,
    #[serde(default)]
    pub opening: Option<Opening>,
}

impl ExplorerResult {
    /// Number of games that reached the queried position.
    pub fn total_games(&self) -> u64 {
        self.total_white + self.total_draws + self.total_black
    }

    /// Sum of the per-move game counts.
    pub fn move_games(&self) -> u64 {
        self.moves.iter().map(StatEntry::total_games).sum()
    }

    /// `true` when at least one move has been played from this position.
    ///
    /// A result without moves is the "no data" outcome and must not be
    /// passed to [`select_weighted_move`](crate::select_weighted_move).
    pub fn has_moves(&self) -> bool {
        self.move_games() > 0
    }

    /// Opening label such as `[C60] Ruy Lopez`.
    pub fn opening_label(&self) -> Option<String> {
        self.opening
            .as_ref()
            .map(|o| format!("[{}] {}", o.eco, o.name))
    }

    /// Human summary of the game count, or `None` when no games are known.
    pub fn games_summary(&self) -> Option<String> {
        match self.total_games() {
            0 => None,
            1 => Some("1 game in the database".to_string()),
            n => Some(format!("{n} games in the database")),
        }
    }
}
