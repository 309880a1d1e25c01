use std::env;
use std::time::Duration;

pub const OPENDOTA_BASE_URL: &str = "https://api.opendota.com/api/matches/";
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 300;
pub const DEFAULT_MAX_RETRIES: u32 = 10;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_USER_AGENT: &str = concat!("opendota_miner/", env!("CARGO_PKG_VERSION"));

/// Knobs for one mining run. The defaults mirror the public API's rate limit
/// (one request every 300ms) and give up on a match after ten retries.
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Prefix the match id is appended to, verbatim.
    pub base_url: String,
    /// Pause after every match and before every retry.
    pub request_delay: Duration,
    pub max_retries: u32,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            base_url: OPENDOTA_BASE_URL.to_string(),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl MinerConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("OPENDOTA_BASE_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.base_url);
        let request_delay_ms = lookup("OPENDOTA_REQUEST_DELAY_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_DELAY_MS)
            .min(60_000);
        let max_retries = lookup("OPENDOTA_MAX_RETRIES")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_RETRIES)
            .min(100);
        let http_timeout_secs = lookup("OPENDOTA_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            .clamp(1, 300);
        let user_agent = lookup("OPENDOTA_USER_AGENT")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.user_agent);

        Self {
            base_url,
            request_delay: Duration::from_millis(request_delay_ms),
            max_retries,
            http_timeout: Duration::from_secs(http_timeout_secs),
            user_agent,
        }
    }
}
