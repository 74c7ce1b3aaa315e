//! Engine scores and evaluations.

use std::fmt;
use std::ops::Neg;

/// A search score.
///
/// Engines report scores relative to the side to move; the session stores
/// them relative to its reference side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Material-style score in hundredths of a pawn.
    Centipawns(i32),
    /// Forced mate in this many moves. Negative when being mated.
    Mate(i32),
}

impl Score {
    /// Rescale by `side_factor` (+1 or -1).
    pub fn absolute(self, side_factor: i32) -> Score {
        if side_factor < 0 { -self } else { self }
    }

    /// Score in pawns, or `None` for a mate score.
    pub fn pawns(self) -> Option<f64> {
        match self {
            Score::Centipawns(cp) => Some(f64::from(cp) / 100.0),
            Score::Mate(_) => None,
        }
    }
}

impl Neg for Score {
    type Output = Score;

    fn neg(self) -> Score {
        match self {
            Score::Centipawns(cp) => Score::Centipawns(-cp),
            Score::Mate(n) => Score::Mate(-n),
        }
    }
}

/// Evaluation-bar style: `+0.3`, `-1.2`, `+12`, `+M3`, `-M2`.
impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Score::Mate(n) if n > 0 => write!(f, "+M{n}"),
            Score::Mate(n) => write!(f, "-M{}", -n),
            Score::Centipawns(cp) => {
                let pawns = f64::from(cp) / 100.0;
                if pawns <= -10.0 {
                    write!(f, "{pawns:.0}")
                } else if pawns >= 10.0 {
                    write!(f, "+{pawns:.0}")
                } else if pawns < 0.0 {
                    write!(f, "{pawns:.1}")
                } else {
                    write!(f, "+{pawns:.1}")
                }
            }
        }
    }
}

/// Latest evaluation of a position, in absolute terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Search depth the score was reached at.
    pub depth: u32,
    pub score: Score,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (depth {})", self.score, self.depth)
    }
}
