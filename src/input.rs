use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::match_payload::MatchId;

pub fn open_input(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("open input file {}", path.display()))
}

/// Opens `path` for appending, creating it if needed. Existing rows are kept,
/// so mining the same ids twice yields duplicate rows.
pub fn open_output(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open output file {}", path.display()))
}

#[derive(Debug)]
pub struct RunFiles {
    pub match_ids: Vec<MatchId>,
    pub output: File,
}

/// Validates the command line inputs in order: input file, game count, the
/// ids themselves, then the output file. The output is opened last so a bad
/// input never leaves an empty file behind.
pub fn prepare_run(input: &Path, output: &Path, count: &str) -> Result<RunFiles> {
    let input = open_input(input).context("Invalid input file")?;
    let count = parse_game_count(count).context("Invalid number of games")?;
    let match_ids = load_match_ids(input, count).context("Invalid input file")?;
    let output = open_output(output).context("Invalid output file")?;
    Ok(RunFiles { match_ids, output })
}

/// Parses the requested number of games. Negative counts select nothing.
pub fn parse_game_count(raw: &str) -> Result<usize> {
    let count = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("not an integer: {raw}"))?;
    Ok(usize::try_from(count).unwrap_or(0))
}

/// Reads the first `count` match ids from a header-less CSV. Only the first
/// column is used. Blank lines are skipped. Running out of rows before
/// `count`, or an id containing a row delimiter, is an error so a run never
/// starts on a bad list.
pub fn load_match_ids<R: Read>(reader: R, count: usize) -> Result<Vec<MatchId>> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut ids = Vec::with_capacity(count);
    for (line, record) in csv.records().enumerate() {
        if ids.len() == count {
            break;
        }
        let record = record.with_context(|| format!("read input row {}", line + 1))?;
        let raw = record.get(0).unwrap_or_default();
        if raw.trim().is_empty() {
            continue;
        }
        let id = MatchId::new(raw)
            .ok_or_else(|| anyhow!("input row {}: invalid match id {raw:?}", line + 1))?;
        ids.push(id);
    }

    if ids.len() < count {
        return Err(anyhow!(
            "input has {} match ids, {} requested",
            ids.len(),
            count
        ));
    }
    Ok(ids)
}
