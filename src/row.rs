use std::fmt::Write as _;

use crate::match_payload::{MatchId, MatchRecord, PLAYERS_PER_MATCH};

pub const FIELD_COUNT: usize = PLAYERS_PER_MATCH + 4;
pub const NO_RANK_SENTINEL: i64 = -1;

/// One line of the mined dataset:
/// `match_id, hero x10, shown_count, mmr_avg, radiant_win`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub match_id: MatchId,
    pub hero_ids: [i64; PLAYERS_PER_MATCH],
    pub shown: usize,
    pub mmr_avg: i64,
    pub radiant_win: bool,
}

impl OutputRow {
    pub fn from_record(match_id: &MatchId, record: &MatchRecord) -> Self {
        let hero_ids = record.players.map(|p| p.hero_id);
        let shown_ranks = record
            .players
            .iter()
            .filter_map(|p| p.solo_competitive_rank)
            .collect::<Vec<_>>();

        Self {
            match_id: match_id.clone(),
            hero_ids,
            shown: shown_ranks.len(),
            mmr_avg: average_rank(&shown_ranks),
            radiant_win: record.radiant_win,
        }
    }

    pub fn to_csv_line(&self) -> String {
        let mut line = String::with_capacity(96);
        line.push_str(self.match_id.as_str());
        for hero in &self.hero_ids {
            let _ = write!(line, ",{hero}");
        }
        let win = if self.radiant_win { 1 } else { 0 };
        let _ = writeln!(line, ",{},{},{}", self.shown, self.mmr_avg, win);
        line
    }
}

/// Floor of the mean of the shown ranks, or `-1` when nobody shows one.
pub fn average_rank(shown_ranks: &[i64]) -> i64 {
    if shown_ranks.is_empty() {
        return NO_RANK_SENTINEL;
    }
    // Summed wide so ten ranks near i64::MAX cannot overflow. The floored
    // mean lies between the smallest and largest rank, so it fits back in i64.
    let sum: i128 = shown_ranks.iter().map(|&rank| i128::from(rank)).sum();
    sum.div_euclid(shown_ranks.len() as i128) as i64
}
