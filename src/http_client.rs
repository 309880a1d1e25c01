use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

use crate::config::MinerConfig;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client. Built from the first config passed in; later
/// calls reuse it as-is.
pub fn http_client(config: &MinerConfig) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .context("failed to build http client")
    })
}
