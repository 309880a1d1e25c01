pub mod config;
pub mod fetcher;
pub mod http_client;
pub mod input;
pub mod match_payload;
pub mod pacing;
pub mod row;
pub mod source;

pub use config::MinerConfig;
pub use fetcher::{FetchOutcome, MatchFetcher, ProgressReport, RunSummary, SkipReason};
pub use match_payload::{MatchId, MatchPayload, MatchRecord, PlayerEntry};
pub use row::OutputRow;
pub use source::{MatchSource, OpenDotaSource};
