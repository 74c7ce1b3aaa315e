//! The move ledger: ordered applied moves with incremental apply and undo.

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position};
use tracing::debug;

use crate::error::LedgerError;
use crate::pgn;
use crate::record::MoveRecord;
use crate::status::GameOverStatus;

/// The FEN string for the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Serialized form of the current game, for display and bookmarking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// FEN of the current position.
    pub fen: String,
    /// PGN text of the game. Carries `SetUp`/`FEN` headers when the game did
    /// not begin from the standard starting position.
    pub pgn: String,
}

impl Snapshot {
    /// The PGN with move-number dots tightened (`1.e4 e5 2.Nf3`).
    pub fn compact_pgn(&self) -> String {
        pgn::compact(&self.pgn)
    }
}

/// Applied moves, the positions they pass through, and the resulting status.
///
/// The side to move is never stored; it is read from the last position,
/// which is always the result of replaying `history` from the initial
/// position.
#[derive(Debug, Clone)]
pub struct MoveLedger {
    /// `positions[0]` is the initial position; `positions[i + 1]` follows
    /// `history[i]`.
    positions: Vec<Chess>,
    /// Repetition key for each entry of `positions`.
    keys: Vec<String>,
    history: Vec<MoveRecord>,
    status: GameOverStatus,
}

impl MoveLedger {
    /// Create an empty ledger at the standard starting position.
    pub fn new() -> Self {
        Self::from_position(Chess::default())
    }

    /// Create an empty ledger starting from `fen`.
    pub fn from_fen(fen: &str) -> Result<Self, LedgerError> {
        Ok(Self::from_position(parse_fen(fen)?))
    }

    /// Create a ledger by replaying PGN text.
    ///
    /// A `[FEN "..."]` header selects the initial position; otherwise the
    /// game starts from the standard position.
    pub fn from_pgn(text: &str) -> Result<Self, LedgerError> {
        let movetext = pgn::parse_movetext(text);
        let mut ledger = match movetext.fen.as_deref() {
            Some(fen) => Self::from_fen(fen)?,
            None => Self::new(),
        };
        for (index, token) in movetext.moves.iter().enumerate() {
            ledger
                .apply(token)
                .map_err(|_| LedgerError::InvalidMoveText {
                    index,
                    token: token.clone(),
                })?;
        }
        Ok(ledger)
    }

    /// Create a ledger from optional initial FEN and PGN text.
    ///
    /// Blank values are treated as absent. Non-blank PGN replaces the FEN,
    /// since the PGN carries its own setup.
    pub fn load(fen: Option<&str>, pgn: Option<&str>) -> Result<Self, LedgerError> {
        fn present(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }
        match (present(fen), present(pgn)) {
            (_, Some(pgn)) => Self::from_pgn(pgn),
            (Some(fen), None) => Self::from_fen(fen),
            (None, None) => Ok(Self::new()),
        }
    }

    fn from_position(pos: Chess) -> Self {
        let key = repetition_key(&pos);
        let status = GameOverStatus::classify(&pos, 1);
        Self {
            positions: vec![pos],
            keys: vec![key],
            history: Vec::new(),
            status,
        }
    }

    /// Try `notation` in the current position.
    ///
    /// Accepts UCI / long algebraic (`g1f3`, `e7e8q`) or SAN (`Nf3`, `O-O`,
    /// `Qxf7#`). On success the move is appended and its record returned; an
    /// illegal or unreadable move leaves the ledger unchanged.
    pub fn apply(&mut self, notation: &str) -> Result<MoveRecord, LedgerError> {
        let Some(m) = self.resolve(notation) else {
            debug!(notation, "rejected move");
            return Err(LedgerError::IllegalMove {
                notation: notation.to_string(),
            });
        };
        Ok(self.push(&m))
    }

    /// Remove the last move. Returns `None` when the history is empty.
    pub fn undo(&mut self) -> Option<MoveRecord> {
        let record = self.history.pop()?;
        self.positions.pop();
        self.keys.pop();
        self.refresh_status();
        Some(record)
    }

    /// Undo moves until `player` is to move, stopping early if the history
    /// runs out. At least one move is undone when any exist.
    pub fn undo_to_player(&mut self, player: Color) {
        while self.undo().is_some() {
            if self.turn() == player {
                break;
            }
        }
    }

    /// Return to the standard starting position with an empty history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// FEN and PGN of the current game.
    pub fn serialize(&self) -> Snapshot {
        let start = self.initial();
        let movetext = pgn::render_movetext(
            self.history.iter().map(|r| r.san.as_str()),
            start.fullmoves().get(),
            start.turn() == Color::White,
        );
        let pgn = if self.starts_from_standard() {
            movetext
        } else {
            format!("[SetUp \"1\"]\n[FEN \"{}\"]\n\n{movetext}", self.start_fen())
        };
        Snapshot {
            fen: self.fen(),
            pgn,
        }
    }

    /// Applied moves, oldest first.
    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// Applied moves in long algebraic notation.
    pub fn lan_history(&self) -> Vec<String> {
        self.history.iter().map(|r| r.lan.clone()).collect()
    }

    /// Applied moves in SAN.
    pub fn san_history(&self) -> Vec<String> {
        self.history.iter().map(|r| r.san.clone()).collect()
    }

    /// Number of applied moves.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// `true` when no moves have been applied.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Side to move in the current position.
    pub fn turn(&self) -> Color {
        self.position().turn()
    }

    /// Game-over status of the current position.
    pub fn status(&self) -> GameOverStatus {
        self.status
    }

    /// The current position.
    pub fn position(&self) -> &Chess {
        // positions is never empty: constructed with one entry, and undo
        // only pops alongside a history entry.
        &self.positions[self.positions.len() - 1]
    }

    /// FEN of the current position.
    pub fn fen(&self) -> String {
        to_fen(self.position())
    }

    /// FEN of the position the game started from.
    pub fn start_fen(&self) -> String {
        match self.history.first() {
            Some(first) => first.fen_before.clone(),
            None => to_fen(self.initial()),
        }
    }

    /// `true` if the game began from the standard starting position.
    pub fn starts_from_standard(&self) -> bool {
        self.start_fen() == STARTING_FEN
    }

    fn initial(&self) -> &Chess {
        &self.positions[0]
    }

    fn resolve(&self, notation: &str) -> Option<Move> {
        let pos = self.position();
        let text = notation.trim();
        if let Ok(uci) = text.parse::<UciMove>()
            && let Ok(m) = uci.to_move(pos)
        {
            return Some(m);
        }
        let san: SanPlus = text.parse().ok()?;
        san.san.to_move(pos).ok()
    }

    fn push(&mut self, m: &Move) -> MoveRecord {
        let before = self.position().clone();
        let san = SanPlus::from_move(before.clone(), m).to_string();
        let lan = m.to_uci(CastlingMode::Standard).to_string();
        let mut after = before.clone();
        after.play_unchecked(m);

        let record = MoveRecord {
            san,
            lan,
            fen_before: to_fen(&before),
            fen_after: to_fen(&after),
        };
        debug!(san = %record.san, lan = %record.lan, "applied move");

        self.keys.push(repetition_key(&after));
        self.positions.push(after);
        self.history.push(record.clone());
        self.refresh_status();
        record
    }

    fn refresh_status(&mut self) {
        let current = &self.keys[self.keys.len() - 1];
        let repetitions = self.keys.iter().filter(|k| *k == current).count();
        self.status = GameOverStatus::classify(self.position(), repetitions);
    }
}

impl Default for MoveLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_fen(fen: &str) -> Result<Chess, LedgerError> {
    let invalid = || LedgerError::InvalidFen {
        fen: fen.to_string(),
    };
    let parsed: Fen = fen.trim().parse().map_err(|_| invalid())?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|_| invalid())
}

fn to_fen(pos: &Chess) -> String {
    Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string()
}

/// Placement, side to move, castling and en passant: the FEN fields that
/// decide whether two positions repeat.
fn repetition_key(pos: &Chess) -> String {
    to_fen(pos)
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use shakmaty::Color;

    use super::*;

    fn ledger_with(moves: &[&str]) -> MoveLedger {
        let mut ledger = MoveLedger::new();
        for m in moves {
            ledger.apply(m).unwrap();
        }
        ledger
    }

    #[test]
    fn new_ledger_is_empty() {
        let ledger = MoveLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.turn(), Color::White);
        assert_eq!(ledger.fen(), STARTING_FEN);
        assert_eq!(ledger.status(), GameOverStatus::None);
    }

    #[test]
    fn apply_san_records_both_notations() {
        let mut ledger = MoveLedger::new();
        let record = ledger.apply("Nf3").unwrap();
        assert_eq!(record.san, "Nf3");
        assert_eq!(record.lan, "g1f3");
        assert_eq!(record.fen_before, STARTING_FEN);
        assert_eq!(record.fen_after, ledger.fen());
    }

    #[test]
    fn apply_uci() {
        let mut ledger = MoveLedger::new();
        let record = ledger.apply("e2e4").unwrap();
        assert_eq!(record.san, "e4");
        assert_eq!(ledger.turn(), Color::Black);
    }

    #[test]
    fn apply_castling_in_both_notations() {
        let mut ledger = ledger_with(&["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"]);
        let mut copy = ledger.clone();
        assert_eq!(ledger.apply("O-O").unwrap().lan, "e1g1");
        assert_eq!(copy.apply("e1g1").unwrap().san, "O-O");
    }

    #[test]
    fn apply_promotion() {
        let mut ledger = MoveLedger::from_fen("8/4P1k1/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let record = ledger.apply("e7e8q").unwrap();
        assert_eq!(record.san, "e8=Q");
        assert_eq!(record.lan, "e7e8q");
    }

    #[test]
    fn illegal_move_leaves_ledger_unchanged() {
        let mut ledger = ledger_with(&["e4"]);
        let fen = ledger.fen();
        let result = ledger.apply("e5e4");
        assert!(matches!(result, Err(LedgerError::IllegalMove { .. })));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.fen(), fen);
    }

    #[test]
    fn garbage_is_rejected() {
        let mut ledger = MoveLedger::new();
        assert!(ledger.apply("hello").is_err());
        assert!(ledger.apply("").is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn undo_on_empty_is_noop() {
        let mut ledger = MoveLedger::new();
        assert!(ledger.undo().is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn undo_restores_previous_position() {
        let mut ledger = ledger_with(&["e4", "c5"]);
        let undone = ledger.undo().unwrap();
        assert_eq!(undone.san, "c5");
        assert_eq!(ledger.fen(), undone.fen_before);
        assert_eq!(ledger.turn(), Color::Black);
    }

    #[test]
    fn undo_to_player_stops_at_players_turn() {
        let mut ledger = ledger_with(&["e4", "e5", "Nf3"]);
        ledger.undo_to_player(Color::White);
        assert_eq!(ledger.san_history(), ["e4", "e5"]);
        assert_eq!(ledger.turn(), Color::White);
    }

    #[test]
    fn undo_to_player_undoes_a_full_move() {
        let mut ledger = ledger_with(&["e4", "e5", "Nf3", "Nc6"]);
        ledger.undo_to_player(Color::White);
        assert_eq!(ledger.san_history(), ["e4", "e5"]);
    }

    #[test]
    fn undo_to_player_stops_when_history_runs_out() {
        let mut ledger = ledger_with(&["e4"]);
        ledger.undo_to_player(Color::Black);
        assert!(ledger.is_empty());
        assert_eq!(ledger.turn(), Color::White);
    }

    #[test]
    fn reset_returns_to_start() {
        let mut ledger = MoveLedger::from_fen("8/8/8/4k3/8/8/4P3/4K3 w - - 0 1").unwrap();
        ledger.apply("e4").unwrap();
        ledger.reset();
        assert!(ledger.is_empty());
        assert_eq!(ledger.fen(), STARTING_FEN);
    }

    #[test]
    fn checkmate_is_detected_after_apply() {
        let ledger = ledger_with(&["f3", "e5", "g4", "Qh4#"]);
        assert_eq!(ledger.status(), GameOverStatus::Checkmate);
        assert_eq!(ledger.history()[3].san, "Qh4#");
    }

    #[test]
    fn status_clears_after_undo() {
        let mut ledger = ledger_with(&["f3", "e5", "g4", "Qh4#"]);
        ledger.undo();
        assert_eq!(ledger.status(), GameOverStatus::None);
    }

    #[test]
    fn threefold_repetition() {
        let ledger = ledger_with(&["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8"]);
        assert_eq!(ledger.status(), GameOverStatus::ThreefoldRepetition);
    }

    #[test]
    fn twofold_is_not_a_draw() {
        let ledger = ledger_with(&["Nf3", "Nf6", "Ng1", "Ng8"]);
        assert_eq!(ledger.status(), GameOverStatus::None);
    }

    #[test]
    fn invalid_fen_is_rejected() {
        let result = MoveLedger::from_fen("not a fen");
        assert!(matches!(result, Err(LedgerError::InvalidFen { .. })));
    }

    #[test]
    fn serialize_standard_game() {
        let snapshot = ledger_with(&["e4", "e5", "Nf3"]).serialize();
        assert_eq!(snapshot.pgn, "1. e4 e5 2. Nf3");
        assert_eq!(snapshot.compact_pgn(), "1.e4 e5 2.Nf3");
    }

    #[test]
    fn serialize_custom_start_carries_headers() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let mut ledger = MoveLedger::from_fen(fen).unwrap();
        ledger.apply("e5").unwrap();
        let snapshot = ledger.serialize();
        assert_eq!(
            snapshot.pgn,
            format!("[SetUp \"1\"]\n[FEN \"{fen}\"]\n\n1... e5")
        );
        assert!(!ledger.starts_from_standard());
        assert_eq!(ledger.start_fen(), fen);
    }

    #[test]
    fn pgn_round_trip() {
        let ledger = ledger_with(&["d4", "d5", "c4", "e6", "Nc3"]);
        let reloaded = MoveLedger::from_pgn(&ledger.serialize().pgn).unwrap();
        assert_eq!(reloaded.san_history(), ledger.san_history());
        assert_eq!(reloaded.fen(), ledger.fen());
    }

    #[test]
    fn pgn_with_bad_move_reports_index() {
        let result = MoveLedger::from_pgn("1. e4 e5 2. Ke3");
        assert_eq!(
            result.unwrap_err(),
            LedgerError::InvalidMoveText {
                index: 2,
                token: "Ke3".to_string()
            }
        );
    }

    #[test]
    fn load_prefers_pgn_over_fen() {
        let ledger = MoveLedger::load(
            Some("8/8/8/4k3/8/8/4P3/4K3 w - - 0 1"),
            Some("1.e4 e5"),
        )
        .unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.starts_from_standard());
    }

    #[test]
    fn load_ignores_blank_values() {
        let ledger = MoveLedger::load(Some("  "), Some("")).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.fen(), STARTING_FEN);
    }
}
