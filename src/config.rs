use std::{env, net::SocketAddr, time::Duration};

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Account whose public repositories are aggregated.
    pub github_username: String,
    /// Optional API token; anonymous calls work but are rate-limited hard.
    pub github_token: Option<String>,
    pub github_api_base: String,
    /// Cap on simultaneous per-repository language fetches.
    pub github_max_concurrent: usize,
    /// How long an aggregated payload is reused before refetching. Zero disables reuse.
    pub github_cache_ttl: Duration,
    /// Applied to every outbound HTTP call.
    pub outbound_timeout: Duration,
    pub geo_api_base: String,
    pub visits_db_path: String,
    pub visits_list_key: String,
    pub resend_api_base: String,
    pub resend_api_key: Option<String>,
    pub contact_from: String,
    pub contact_recipient: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_port: u16 = env::var("API_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let bind_host = env::var("BIND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let bind_addr: SocketAddr = format!("{bind_host}:{api_port}").parse()?;

        let github_username = env::var("GITHUB_USERNAME").unwrap_or_else(|_| "Eybri".to_string());
        let github_token = env::var("GITHUB_TOKEN").ok().filter(|v| !v.is_empty());
        let github_api_base =
            env::var("GITHUB_API_BASE").unwrap_or_else(|_| "https://api.github.com".to_string());
        let github_max_concurrent: usize = env::var("GITHUB_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8);
        let github_cache_ttl = Duration::from_secs(
            env::var("GITHUB_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
        );
        let outbound_timeout = Duration::from_millis(
            env::var("OUTBOUND_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        );

        let geo_api_base =
            env::var("GEO_API_BASE").unwrap_or_else(|_| "http://ip-api.com".to_string());

        let visits_db_path = env::var("VISITS_DB_PATH").unwrap_or_else(|_| "visits.db".to_string());
        let visits_list_key =
            env::var("VISITS_LIST_KEY").unwrap_or_else(|_| "portfolio_visits".to_string());

        let resend_api_base =
            env::var("RESEND_API_BASE").unwrap_or_else(|_| "https://api.resend.com".to_string());
        let resend_api_key = env::var("RESEND_API_KEY").ok().filter(|v| !v.is_empty());
        let contact_from = env::var("CONTACT_FROM")
            .unwrap_or_else(|_| "Portfolio Contact <onboarding@resend.dev>".to_string());
        let contact_recipient =
            env::var("CONTACT_RECIPIENT").unwrap_or_else(|_| "averymikasa@gmail.com".to_string());

        Ok(Self {
            bind_addr,
            github_username,
            github_token,
            github_api_base,
            github_max_concurrent,
            github_cache_ttl,
            outbound_timeout,
            geo_api_base,
            visits_db_path,
            visits_list_key,
            resend_api_base,
            resend_api_key,
            contact_from,
            contact_recipient,
        })
    }
}
