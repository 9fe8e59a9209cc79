use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::domain::stats::LanguageByteMap;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("github request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("github returned an unexpected payload: {0}")]
    UnexpectedPayload(String),
}

/// One repository as the GitHub REST API lists it. Only the fields the
/// aggregation consumes are modeled; everything else is dropped on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repo {
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub stargazers_count: u32,
    pub language: Option<String>,
    pub fork: bool,
    pub updated_at: DateTime<Utc>,
    pub languages_url: String,
}

#[async_trait]
pub trait GithubClient: Send + Sync {
    /// Repositories owned by `username`, most recently updated first,
    /// capped at 100 by the upstream page size.
    async fn list_repos(&self, username: &str) -> Result<Vec<Repo>, GithubError>;

    /// Language name to byte count for one repository.
    async fn repo_languages(&self, repo: &Repo) -> Result<LanguageByteMap, GithubError>;
}

pub type DynGithubClient = Arc<dyn GithubClient>;

pub struct HttpGithubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl HttpGithubClient {
    pub fn new(cfg: &Config) -> Result<Self, GithubError> {
        // GitHub rejects requests without a User-Agent.
        let http = reqwest::Client::builder()
            .user_agent(concat!("portfolio-api-service/", env!("CARGO_PKG_VERSION")))
            .timeout(cfg.outbound_timeout)
            .build()?;
        Ok(Self {
            http,
            api_base: cfg.github_api_base.trim_end_matches('/').to_string(),
            token: cfg.github_token.clone(),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/vnd.github.v3+json");
        if let Some(token) = &self.token {
            req = req.header(header::AUTHORIZATION, format!("token {token}"));
        }
        req
    }
}

#[async_trait]
impl GithubClient for HttpGithubClient {
    async fn list_repos(&self, username: &str) -> Result<Vec<Repo>, GithubError> {
        let url = format!(
            "{}/users/{}/repos?sort=updated&per_page=100",
            self.api_base, username
        );
        let resp = self.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GithubError::UnexpectedPayload(format!(
                "repository listing answered {status}"
            )));
        }

        // A rate-limited or misconfigured account answers with an error
        // object instead of a list.
        let body: serde_json::Value = resp.json().await?;
        if !body.is_array() {
            return Err(GithubError::UnexpectedPayload(
                "repository listing is not a JSON array".to_string(),
            ));
        }
        serde_json::from_value(body).map_err(|e| GithubError::UnexpectedPayload(e.to_string()))
    }

    async fn repo_languages(&self, repo: &Repo) -> Result<LanguageByteMap, GithubError> {
        let resp = self.get(&repo.languages_url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GithubError::UnexpectedPayload(format!(
                "languages for {} answered {status}",
                repo.name
            )));
        }
        Ok(resp.json::<LanguageByteMap>().await?)
    }
}
