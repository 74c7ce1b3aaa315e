//! Move ledger for the trainer: applied moves, side to move, and game-over
//! status, layered over the `shakmaty` rules.

mod error;
mod ledger;
mod pgn;
mod record;
mod status;

pub use error::LedgerError;
pub use ledger::{MoveLedger, STARTING_FEN, Snapshot};
pub use record::MoveRecord;
pub use shakmaty::Color;
pub use status::GameOverStatus;
