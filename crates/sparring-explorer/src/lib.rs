//! Opening explorer: real-game move statistics, weighted reply selection,
//! retry policy for the statistics service, and search preferences.

pub mod client;
pub mod error;
pub mod preferences;
pub mod query;
pub mod retry;
pub mod sampler;
pub mod stats;

pub use client::{DEFAULT_BASE_URL, ExplorerClient};
pub use error::{ExplorerError, PreferencesError, SampleError};
pub use preferences::{DateRange, Preferences, RatingRange};
pub use query::{ExplorerQuery, RATING_BUCKETS, Speed};
pub use retry::compute_retry_delay;
pub use sampler::select_weighted_move;
pub use stats::{ExplorerResult, Opening, StatEntry};
