pub mod api;
pub mod models;

pub use api::{fingerprint, Fetcher, FetcherSet};
pub use models::{GamePhase, League, ScoreboardData, Snapshot, TeamDescriptor};
