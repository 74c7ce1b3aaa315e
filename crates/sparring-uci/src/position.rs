//! Position descriptors in `position` command form.

use std::fmt;
use std::str::FromStr;

use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, Position};

use crate::error::UciError;

/// The argument of a UCI `position` command: a starting position plus the
/// moves played from it in long algebraic notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionDescriptor {
    /// `startpos [moves ...]`
    StartPos { moves: Vec<String> },
    /// `fen <fen> [moves ...]`
    Fen { fen: String, moves: Vec<String> },
}

impl PositionDescriptor {
    /// The standard starting position with no moves.
    pub fn startpos() -> Self {
        PositionDescriptor::StartPos { moves: Vec::new() }
    }

    /// Moves from the standard starting position.
    pub fn from_moves(moves: impl IntoIterator<Item = impl Into<String>>) -> Self {
        PositionDescriptor::StartPos {
            moves: moves.into_iter().map(Into::into).collect(),
        }
    }

    pub fn moves(&self) -> &[String] {
        match self {
            PositionDescriptor::StartPos { moves } | PositionDescriptor::Fen { moves, .. } => moves,
        }
    }

    /// Parse the arguments of a `position` command.
    ///
    /// Supports:
    /// - `startpos [moves e2e4 d7d5 ...]`
    /// - `fen <fen-string> [moves e2e4 d7d5 ...]`
    ///
    /// Only the syntax is checked; see [`side_to_move`](Self::side_to_move)
    /// for legality.
    pub fn parse(text: &str) -> Result<Self, UciError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let tokens = match tokens.first() {
            Some(&"position") => &tokens[1..],
            _ => &tokens[..],
        };
        if tokens.is_empty() {
            return Err(UciError::MalformedPosition);
        }

        let split = tokens.iter().position(|t| *t == "moves");
        let (head, moves) = match split {
            Some(i) => (&tokens[..i], &tokens[i + 1..]),
            None => (tokens, &[][..]),
        };
        let moves: Vec<String> = moves.iter().map(|m| m.to_string()).collect();

        match head.first() {
            Some(&"startpos") if head.len() == 1 => Ok(PositionDescriptor::StartPos { moves }),
            Some(&"fen") => {
                if head.len() < 2 {
                    return Err(UciError::InvalidFen { fen: String::new() });
                }
                Ok(PositionDescriptor::Fen {
                    fen: head[1..].join(" "),
                    moves,
                })
            }
            _ => Err(UciError::MalformedPosition),
        }
    }

    /// Replay the descriptor and report whose turn it is.
    pub fn side_to_move(&self) -> Result<Color, UciError> {
        Ok(self.to_position()?.turn())
    }

    /// Replay the descriptor into a position.
    pub fn to_position(&self) -> Result<Chess, UciError> {
        let mut pos = match self {
            PositionDescriptor::StartPos { .. } => Chess::default(),
            PositionDescriptor::Fen { fen, .. } => {
                let invalid = || UciError::InvalidFen { fen: fen.clone() };
                let parsed: Fen = fen.parse().map_err(|_| invalid())?;
                parsed
                    .into_position(CastlingMode::Standard)
                    .map_err(|_| invalid())?
            }
        };

        for text in self.moves() {
            let invalid = || UciError::InvalidMove {
                uci_move: text.clone(),
            };
            let uci: UciMove = text.parse().map_err(|_| invalid())?;
            let m = uci.to_move(&pos).map_err(|_| invalid())?;
            pos.play_unchecked(&m);
        }

        Ok(pos)
    }
}

impl Default for PositionDescriptor {
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Display for PositionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionDescriptor::StartPos { .. } => f.write_str("startpos")?,
            PositionDescriptor::Fen { fen, .. } => write!(f, "fen {fen}")?,
        }
        let moves = self.moves();
        if !moves.is_empty() {
            write!(f, " moves {}", moves.join(" "))?;
        }
        Ok(())
    }
}

impl FromStr for PositionDescriptor {
    type Err = UciError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

    #[test]
    fn parse_startpos() {
        let pos = PositionDescriptor::parse("startpos").unwrap();
        assert_eq!(pos, PositionDescriptor::startpos());
        assert_eq!(pos.side_to_move().unwrap(), Color::White);
    }

    #[test]
    fn parse_startpos_with_moves() {
        let pos = PositionDescriptor::parse("position startpos moves e2e4 e7e5").unwrap();
        assert_eq!(pos.moves(), ["e2e4", "e7e5"]);
        assert_eq!(pos.side_to_move().unwrap(), Color::White);
    }

    #[test]
    fn parse_fen() {
        let pos = PositionDescriptor::parse(&format!("fen {AFTER_E4}")).unwrap();
        assert_eq!(
            pos,
            PositionDescriptor::Fen {
                fen: AFTER_E4.to_string(),
                moves: Vec::new()
            }
        );
        assert_eq!(pos.side_to_move().unwrap(), Color::Black);
    }

    #[test]
    fn parse_fen_with_moves() {
        let pos = PositionDescriptor::parse(&format!("fen {AFTER_E4} moves c7c5")).unwrap();
        assert_eq!(pos.moves(), ["c7c5"]);
        assert_eq!(pos.side_to_move().unwrap(), Color::White);
    }

    #[test]
    fn display_matches_command_form() {
        assert_eq!(PositionDescriptor::startpos().to_string(), "startpos");
        assert_eq!(
            PositionDescriptor::from_moves(["e2e4", "c7c5"]).to_string(),
            "startpos moves e2e4 c7c5"
        );
        let fen = PositionDescriptor::Fen {
            fen: AFTER_E4.to_string(),
            moves: vec!["e7e5".to_string()],
        };
        assert_eq!(fen.to_string(), format!("fen {AFTER_E4} moves e7e5"));
        assert_eq!(fen.to_string().parse::<PositionDescriptor>().unwrap(), fen);
    }

    #[test]
    fn parse_missing_keyword() {
        assert!(matches!(
            PositionDescriptor::parse("position"),
            Err(UciError::MalformedPosition)
        ));
        assert!(matches!(
            PositionDescriptor::parse("moves e2e4"),
            Err(UciError::MalformedPosition)
        ));
    }

    #[test]
    fn invalid_fen_is_reported_on_replay() {
        let pos = PositionDescriptor::parse("fen invalid").unwrap();
        assert!(matches!(pos.side_to_move(), Err(UciError::InvalidFen { .. })));
    }

    #[test]
    fn illegal_move_is_reported_on_replay() {
        let pos = PositionDescriptor::from_moves(["e2e5"]);
        match pos.side_to_move() {
            Err(UciError::InvalidMove { uci_move }) => assert_eq!(uci_move, "e2e5"),
            other => panic!("expected InvalidMove, got {other:?}"),
        }
    }
}
