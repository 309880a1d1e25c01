use std::fmt;
use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::MinerConfig;
use crate::match_payload::{MatchId, MatchPayload, PayloadError, parse_match_payload};
use crate::pacing::{Pacer, ThreadPacer};
use crate::row::OutputRow;
use crate::source::MatchSource;

const PROGRESS_EVERY: usize = 10;

/// Why a match produced no row. Every variant names the match.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("error parsing JSON at game {match_id}: {detail}")]
    Malformed { match_id: MatchId, detail: String },
    #[error("JSON is corrupted, skipping {match_id}")]
    Corrupted { match_id: MatchId },
    #[error("index error at game {match_id}: only {found} players")]
    TooFewPlayers { match_id: MatchId, found: usize },
    #[error("bad player entry at game {match_id}: {detail}")]
    InvalidPlayer { match_id: MatchId, detail: String },
    #[error("gave up on game {match_id} after {attempts} attempts")]
    RetriesExhausted { match_id: MatchId, attempts: u32 },
}

impl SkipReason {
    fn from_payload(match_id: &MatchId, err: PayloadError) -> Self {
        let match_id = match_id.clone();
        match err {
            PayloadError::Malformed(detail) => Self::Malformed { match_id, detail },
            PayloadError::Corrupted => Self::Corrupted { match_id },
            PayloadError::TooFewPlayers { found } => Self::TooFewPlayers { match_id, found },
            err @ PayloadError::InvalidPlayer { .. } => Self::InvalidPlayer {
                match_id,
                detail: err.to_string(),
            },
        }
    }

    pub fn match_id(&self) -> &MatchId {
        match self {
            Self::Malformed { match_id, .. }
            | Self::Corrupted { match_id }
            | Self::TooFewPlayers { match_id, .. }
            | Self::InvalidPlayer { match_id, .. }
            | Self::RetriesExhausted { match_id, .. } => match_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Written(OutputRow),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub processed: usize,
    pub elapsed: Duration,
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} games in {:.2} seconds.",
            self.processed,
            self.elapsed.as_secs_f64()
        )
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub processed: usize,
    pub written: usize,
    pub skipped: Vec<SkipReason>,
    pub progress: Vec<ProgressReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn retries_exhausted(&self) -> usize {
        self.skipped
            .iter()
            .filter(|reason| matches!(reason, SkipReason::RetriesExhausted { .. }))
            .count()
    }
}

/// Fetches matches one at a time and appends one CSV line per usable match
/// to `sink`. The sink is flushed after every row.
pub struct MatchFetcher<S, W, P = ThreadPacer> {
    config: MinerConfig,
    source: S,
    sink: W,
    pacer: P,
}

impl<S, W> MatchFetcher<S, W, ThreadPacer>
where
    S: MatchSource,
    W: Write,
{
    pub fn new(config: MinerConfig, source: S, sink: W) -> Self {
        Self::with_pacer(config, source, sink, ThreadPacer)
    }
}

impl<S, W, P> MatchFetcher<S, W, P>
where
    S: MatchSource,
    W: Write,
    P: Pacer,
{
    pub fn with_pacer(config: MinerConfig, source: S, sink: W, pacer: P) -> Self {
        Self {
            config,
            source,
            sink,
            pacer,
        }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    pub fn into_parts(self) -> (S, W, P) {
        (self.source, self.sink, self.pacer)
    }

    /// Processes every id in order, pausing `request_delay` after each one.
    /// Only sink write failures abort the run.
    pub fn run(&mut self, match_ids: &[MatchId]) -> Result<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut written = 0usize;
        let mut skipped = Vec::new();
        let mut progress = Vec::new();

        for (idx, match_id) in match_ids.iter().enumerate() {
            match self.fetch_and_emit(match_id)? {
                FetchOutcome::Written(_) => written += 1,
                FetchOutcome::Skipped(reason) => skipped.push(reason),
            }

            let processed = idx + 1;
            if processed % PROGRESS_EVERY == 0 {
                let report = ProgressReport {
                    processed,
                    elapsed: start.elapsed(),
                };
                info!("{report}");
                progress.push(report);
            }

            self.pacer.pause(self.config.request_delay);
        }

        Ok(RunSummary {
            started_at,
            processed: match_ids.len(),
            written,
            skipped,
            progress,
            elapsed: start.elapsed(),
        })
    }

    /// Fetches one match and appends its row. API errors and transport
    /// failures are retried up to `max_retries` times, `request_delay` apart,
    /// then dropped without a row. Bad payloads are dropped immediately.
    pub fn fetch_and_emit(&mut self, match_id: &MatchId) -> Result<FetchOutcome> {
        let mut attempt: u32 = 0;
        let record = loop {
            match self.source.fetch_match(match_id) {
                Ok(body) => match parse_match_payload(&body) {
                    Ok(MatchPayload::Record(record)) => break record,
                    Ok(MatchPayload::ApiError(message)) => {
                        warn!(%match_id, attempt, "response error at game {match_id}: {message}");
                    }
                    Err(err) => {
                        let reason = SkipReason::from_payload(match_id, err);
                        warn!(%match_id, "{reason}");
                        return Ok(FetchOutcome::Skipped(reason));
                    }
                },
                Err(err) => {
                    warn!(%match_id, attempt, "request failed at game {match_id}: {err:#}");
                }
            }

            if attempt >= self.config.max_retries {
                return Ok(FetchOutcome::Skipped(SkipReason::RetriesExhausted {
                    match_id: match_id.clone(),
                    attempts: attempt + 1,
                }));
            }
            self.pacer.pause(self.config.request_delay);
            attempt += 1;
        };

        let row = OutputRow::from_record(match_id, &record);
        self.write_row(&row)?;
        debug!(%match_id, shown = row.shown, mmr_avg = row.mmr_avg, "row written");
        Ok(FetchOutcome::Written(row))
    }

    fn write_row(&mut self, row: &OutputRow) -> Result<()> {
        let line = row.to_csv_line();
        self.sink
            .write_all(line.as_bytes())
            .with_context(|| format!("write row for game {}", row.match_id))?;
        self.sink
            .flush()
            .with_context(|| format!("flush row for game {}", row.match_id))?;
        Ok(())
    }
}
