use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, anyhow};
use tracing::info;
use tracing_subscriber::EnvFilter;

use opendota_miner::input::{RunFiles, prepare_run};
use opendota_miner::{MatchFetcher, MinerConfig, OpenDotaSource};

struct Args {
    input: PathBuf,
    output: PathBuf,
    count: String,
}

fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run() -> Result<()> {
    let args = parse_args()?;

    // Everything that can fail on setup happens before the first request.
    let RunFiles { match_ids, output } = prepare_run(&args.input, &args.output, &args.count)?;

    let config = MinerConfig::from_env();
    let source = OpenDotaSource::new(&config)?;
    info!(
        games = match_ids.len(),
        base_url = %config.base_url,
        delay_ms = config.request_delay.as_millis() as u64,
        max_retries = config.max_retries,
        "starting run"
    );

    let mut fetcher = MatchFetcher::new(config, source, output);
    let summary = fetcher.run(&match_ids)?;

    info!(
        started_at = %summary.started_at.to_rfc3339(),
        processed = summary.processed,
        written = summary.written,
        skipped = summary.skipped.len(),
        retries_exhausted = summary.retries_exhausted(),
        "run complete in {:.2} seconds",
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}

fn parse_args() -> Result<Args> {
    let args = std::env::args().collect::<Vec<_>>();
    let prog = args
        .first()
        .map(String::as_str)
        .unwrap_or("opendota_miner");
    let [_, input, output, count] = args.as_slice() else {
        return Err(anyhow!(
            "Usage: {prog} <input_file> <output_file> <number_of_games>"
        ));
    };
    Ok(Args {
        input: PathBuf::from(input),
        output: PathBuf::from(output),
        count: count.clone(),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("opendota_miner=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
