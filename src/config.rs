use std::env;
use std::time::Duration;

/// Immutable runtime configuration, built once at startup and passed
/// explicitly into constructors.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    /// Company identifier the search form posts alongside the filters.
    pub cid: String,
    /// Account identifier the search form posts alongside the filters.
    pub acc_id: String,
    /// Timeout applied to every bulk HTTP request.
    pub request_timeout: Duration,
    /// Upper bound on the whole browser login phase.
    pub navigation_timeout: Duration,
    /// Settle delay after the post-login navigation quiesces.
    pub settle_delay: Duration,
    /// Courtesy delay between result-page requests.
    pub page_delay: Duration,
    pub retry_attempts: usize,
    pub retry_delay: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            base_url: env::var("AMBI_BASE_URL")
                .unwrap_or_else(|_| "https://en-ambi.com".to_string()),
            cid: env::var("AMBI_CID")?,
            acc_id: env::var("AMBI_ACC_ID")?,
            request_timeout: Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", 30)?),
            navigation_timeout: Duration::from_secs(parse_or("NAVIGATION_TIMEOUT_SECS", 60)?),
            settle_delay: Duration::from_millis(parse_or("SETTLE_DELAY_MS", 2000)?),
            page_delay: Duration::from_millis(parse_or("PAGE_DELAY_MS", 1000)?),
            retry_attempts: parse_or("RETRY_ATTEMPTS", 2)? as usize,
            retry_delay: Duration::from_secs(parse_or("RETRY_DELAY_SECS", 3)?),
        })
    }
}

fn parse_or(key: &str, default: u64) -> anyhow::Result<u64> {
    match env::var(key) {
        Ok(v) => Ok(v.parse()?),
        Err(_) => Ok(default),
    }
}
