//! Weighted selection of an opponent reply from move statistics.

use rand::Rng;
use tracing::error;

use crate::error::SampleError;
use crate::stats::{ExplorerResult, StatEntry};

/// Pick one move with probability proportional to its game count.
///
/// Draws `r` uniformly from `1..=total`, walks the entries in the order the
/// service supplied them subtracting each entry's game count, and returns
/// the first entry at which the remainder reaches zero. Entries with no
/// games are never chosen; equal counts keep input order.
///
/// Callers check [`ExplorerResult::has_moves`] first; a result without
/// games yields [`SampleError::NoGames`]. Finishing the walk without a
/// selection means the total disagreed with the entries and is reported as
/// [`SampleError::Exhausted`].
pub fn select_weighted_move<'a, R: Rng + ?Sized>(
    result: &'a ExplorerResult,
    rng: &mut R,
) -> Result<&'a StatEntry, SampleError> {
    let total = result.move_games();
    if total == 0 {
        return Err(SampleError::NoGames);
    }

    let drawn = rng.random_range(1..=total);
    let mut remainder = drawn;
    for entry in &result.moves {
        let games = entry.total_games();
        if remainder <= games {
            return Ok(entry);
        }
        remainder -= games;
    }

    error!(drawn, total, "weighted walk ended without a selection");
    Err(SampleError::Exhausted { drawn, total })
}
