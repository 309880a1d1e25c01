use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::debug;

use crate::config::MinerConfig;
use crate::http_client::http_client;
use crate::match_payload::MatchId;

/// Where match bodies come from. Errors returned here are transport failures;
/// API-level failures arrive as an ordinary body with an `error` key.
pub trait MatchSource {
    fn fetch_match(&mut self, match_id: &MatchId) -> Result<String>;
}

pub struct OpenDotaSource {
    client: Client,
    base_url: String,
}

impl OpenDotaSource {
    pub fn new(config: &MinerConfig) -> Result<Self> {
        let client = http_client(config)?.clone();
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &MinerConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }

    pub fn match_url(&self, match_id: &MatchId) -> String {
        format!("{}{}", self.base_url, match_id)
    }
}

impl MatchSource for OpenDotaSource {
    fn fetch_match(&mut self, match_id: &MatchId) -> Result<String> {
        let url = self.match_url(match_id);
        let resp = self.client.get(&url).send().context("request failed")?;
        let status = resp.status();
        // Non-2xx bodies still go through payload parsing: the API reports
        // rate limits and unknown matches as `{"error": ...}`.
        if !status.is_success() {
            debug!(%match_id, %status, "non-success status from match endpoint");
        }
        resp.text()
            .with_context(|| format!("failed reading body from {url}"))
    }
}
