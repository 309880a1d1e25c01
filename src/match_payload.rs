use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const PLAYERS_PER_MATCH: usize = 10;

/// Characters that would split or quote a field in an output row.
pub const ROW_DELIMITERS: &[char] = &[',', '"', '\r', '\n'];

/// Match identifier as read from the input list. Never parsed as a number,
/// it is only ever echoed into URLs, rows and diagnostics, so it can never
/// contain a row delimiter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchId(String);

impl MatchId {
    /// `None` for blank input or input containing one of [`ROW_DELIMITERS`].
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.contains(ROW_DELIMITERS) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PlayerEntry {
    pub hero_id: i64,
    /// `None` when the rank is hidden. A reported rank of zero is treated as
    /// hidden too.
    #[serde(default, deserialize_with = "visible_rank")]
    pub solo_competitive_rank: Option<i64>,
}

impl PlayerEntry {
    pub fn rank_shown(&self) -> bool {
        self.solo_competitive_rank.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub radiant_win: bool,
    /// The first ten entries of the `players` list, radiant slots first.
    pub players: [PlayerEntry; PLAYERS_PER_MATCH],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPayload {
    /// The body carried an `error` key: rate limited, match not parsed yet, etc.
    ApiError(String),
    Record(MatchRecord),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("invalid json: {0}")]
    Malformed(String),
    #[error("missing radiant_win")]
    Corrupted,
    #[error("expected {} players, found {found}", PLAYERS_PER_MATCH)]
    TooFewPlayers { found: usize },
    #[error("player {index}: {detail}")]
    InvalidPlayer { index: usize, detail: String },
}

pub fn parse_match_payload(raw: &str) -> Result<MatchPayload, PayloadError> {
    let root: Value =
        serde_json::from_str(raw.trim()).map_err(|err| PayloadError::Malformed(err.to_string()))?;
    let Some(fields) = root.as_object() else {
        return Err(PayloadError::Corrupted);
    };

    if let Some(error) = fields.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Ok(MatchPayload::ApiError(message));
    }

    let Some(radiant_win) = fields.get("radiant_win") else {
        return Err(PayloadError::Corrupted);
    };
    let radiant_win = is_truthy(radiant_win);

    let players = fields
        .get("players")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if players.len() < PLAYERS_PER_MATCH {
        return Err(PayloadError::TooFewPlayers {
            found: players.len(),
        });
    }

    let mut slots = [PlayerEntry {
        hero_id: 0,
        solo_competitive_rank: None,
    }; PLAYERS_PER_MATCH];
    for (index, (slot, player)) in slots.iter_mut().zip(players).enumerate() {
        *slot = PlayerEntry::deserialize(player).map_err(|err| PayloadError::InvalidPlayer {
            index,
            detail: err.to_string(),
        })?;
    }

    Ok(MatchPayload::Record(MatchRecord {
        radiant_win,
        players: slots,
    }))
}

// null, false, zero and empty values all count as false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn visible_rank<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let rank = match raw {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => Some(v),
            None => Some(float_rank(n.as_f64()).ok_or_else(|| {
                D::Error::custom(format!("solo_competitive_rank out of range: {n}"))
            })?),
        },
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.parse::<i64>().map_err(|_| {
                    D::Error::custom(format!("solo_competitive_rank is not a number: {trimmed}"))
                })?)
            }
        }
        Some(other) => {
            return Err(D::Error::custom(format!(
                "unexpected solo_competitive_rank: {other}"
            )));
        }
    };
    Ok(rank.filter(|v| *v != 0))
}

fn float_rank(value: Option<f64>) -> Option<i64> {
    let v = value?.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    (v.is_finite() && v >= i64::MIN as f64 && v < i64::MAX as f64).then_some(v as i64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn players_json(ranks: &[Value]) -> Vec<Value> {
        ranks
            .iter()
            .enumerate()
            .map(|(idx, rank)| json!({ "hero_id": idx as i64 + 1, "solo_competitive_rank": rank }))
            .collect()
    }

    fn parse(value: Value) -> Result<MatchPayload, PayloadError> {
        parse_match_payload(&value.to_string())
    }

    #[test]
    fn match_id_is_trimmed_and_rejects_blank() {
        assert_eq!(MatchId::new(" 123 ").unwrap().as_str(), "123");
        assert!(MatchId::new("   ").is_none());
    }

    #[test]
    fn match_id_rejects_row_delimiters() {
        for raw in ["12,3", "12\"3", "12\r3", "12\n3"] {
            assert!(MatchId::new(raw).is_none(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn out_of_range_float_rank_is_invalid() {
        for rank in [json!(1e300), json!(-1e300), json!(18446744073709551615u64)] {
            let mut players = players_json(&vec![Value::Null; 10]);
            players[2] = json!({ "hero_id": 3, "solo_competitive_rank": rank });
            let err = parse(json!({ "radiant_win": true, "players": players })).unwrap_err();
            assert!(
                matches!(err, PayloadError::InvalidPlayer { index: 2, .. }),
                "{err:?}"
            );
        }
    }

    #[test]
    fn largest_integer_rank_is_kept() {
        let mut ranks = vec![Value::Null; 10];
        ranks[0] = json!(i64::MAX);
        ranks[1] = json!(i64::MAX);
        let players = players_json(&ranks);
        let Ok(MatchPayload::Record(record)) =
            parse(json!({ "radiant_win": true, "players": players }))
        else {
            panic!("expected a record");
        };
        assert_eq!(record.players[0].solo_competitive_rank, Some(i64::MAX));
        assert_eq!(record.players[1].solo_competitive_rank, Some(i64::MAX));
    }

    #[test]
    fn error_key_wins_over_everything_else() {
        let payload = parse(json!({ "error": "rate limit exceeded", "radiant_win": true }));
        assert_eq!(
            payload,
            Ok(MatchPayload::ApiError("rate limit exceeded".to_string()))
        );
    }

    #[test]
    fn null_error_still_counts_as_error() {
        let payload = parse(json!({ "error": null }));
        assert_eq!(payload, Ok(MatchPayload::ApiError("null".to_string())));
    }

    #[test]
    fn garbage_body_is_malformed() {
        let err = parse_match_payload("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, PayloadError::Malformed(_)));
    }

    #[test]
    fn non_object_body_is_corrupted() {
        assert_eq!(parse(json!([1, 2, 3])), Err(PayloadError::Corrupted));
        assert_eq!(parse(json!(null)), Err(PayloadError::Corrupted));
    }

    #[test]
    fn missing_win_flag_is_corrupted() {
        let players = players_json(&vec![Value::Null; 10]);
        assert_eq!(
            parse(json!({ "players": players })),
            Err(PayloadError::Corrupted)
        );
    }

    #[test]
    fn null_win_flag_means_dire_won() {
        let players = players_json(&vec![Value::Null; 10]);
        let Ok(MatchPayload::Record(record)) =
            parse(json!({ "radiant_win": null, "players": players }))
        else {
            panic!("expected a record");
        };
        assert!(!record.radiant_win);
    }

    #[test]
    fn short_or_missing_player_list_is_rejected() {
        let players = players_json(&vec![Value::Null; 5]);
        assert_eq!(
            parse(json!({ "radiant_win": true, "players": players })),
            Err(PayloadError::TooFewPlayers { found: 5 })
        );
        assert_eq!(
            parse(json!({ "radiant_win": true })),
            Err(PayloadError::TooFewPlayers { found: 0 })
        );
    }

    #[test]
    fn only_first_ten_players_are_read() {
        let mut players = players_json(&vec![json!(2000); 10]);
        players.push(json!({ "hero_id": "broken" }));
        let Ok(MatchPayload::Record(record)) =
            parse(json!({ "radiant_win": false, "players": players }))
        else {
            panic!("expected a record");
        };
        assert_eq!(record.players.len(), PLAYERS_PER_MATCH);
        assert_eq!(record.players[9].hero_id, 10);
    }

    #[test]
    fn zero_and_null_ranks_are_hidden() {
        let players = players_json(&[
            json!(0),
            Value::Null,
            json!(""),
            json!(4100),
            json!("3900"),
            json!(2500.7),
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
        ]);
        let Ok(MatchPayload::Record(record)) =
            parse(json!({ "radiant_win": true, "players": players }))
        else {
            panic!("expected a record");
        };
        let ranks: Vec<Option<i64>> = record
            .players
            .iter()
            .map(|p| p.solo_competitive_rank)
            .collect();
        assert_eq!(
            ranks,
            vec![
                None,
                None,
                None,
                Some(4100),
                Some(3900),
                Some(2500),
                None,
                None,
                None,
                None
            ]
        );
    }

    #[test]
    fn absent_rank_field_is_hidden() {
        let players: Vec<Value> = (1..=10).map(|id| json!({ "hero_id": id })).collect();
        let Ok(MatchPayload::Record(record)) =
            parse(json!({ "radiant_win": true, "players": players }))
        else {
            panic!("expected a record");
        };
        assert!(record.players.iter().all(|p| !p.rank_shown()));
    }

    #[test]
    fn player_without_hero_is_invalid() {
        let mut players = players_json(&vec![Value::Null; 10]);
        players[3] = json!({ "solo_competitive_rank": 3000 });
        let err = parse(json!({ "radiant_win": true, "players": players })).unwrap_err();
        assert!(matches!(err, PayloadError::InvalidPlayer { index: 3, .. }));
    }
}
