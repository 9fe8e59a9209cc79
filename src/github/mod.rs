pub mod client;

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::config::Config;
use crate::domain::stats::{
    LanguageByteMap, LanguageStat, SkillLevel, language_stats, skill_levels,
};
use client::{DynGithubClient, Repo};

/// One repository with its derived language breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedRepo {
    #[serde(flatten)]
    pub repo: Repo,
    /// Language names in byte-map order (largest first as upstream reports).
    pub languages: Vec<String>,
    #[serde(rename = "languageStats")]
    pub language_stats: Vec<LanguageStat>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GithubData {
    pub repos: Vec<EnrichedRepo>,
    pub skills: Vec<SkillLevel>,
}

/// Aggregates the account's repositories into the portfolio payload.
///
/// Never fails: if the repository listing itself is unavailable the result is
/// empty, and a repository whose language fetch keeps failing contributes an
/// empty breakdown while staying in the list.
pub async fn aggregate(cfg: &Config, client: &DynGithubClient) -> GithubData {
    let repos = match client.list_repos(&cfg.github_username).await {
        Ok(repos) => repos,
        Err(err) => {
            warn!(error = %err, "repository listing failed; serving empty data");
            return GithubData::default();
        }
    };

    let mut repos: Vec<Repo> = repos.into_iter().filter(|r| !r.fork).collect();
    repos.sort_by(|a, b| {
        b.stargazers_count
            .cmp(&a.stargazers_count)
            .then_with(|| b.updated_at.cmp(&a.updated_at))
    });

    let semaphore = Arc::new(Semaphore::new(cfg.github_max_concurrent.max(1)));
    let fetches = repos.iter().map(|repo| {
        let semaphore = Arc::clone(&semaphore);
        async move {
            let Ok(_permit) = semaphore.acquire().await else {
                // Closed semaphores cannot happen here; count zero bytes.
                return LanguageByteMap::new();
            };
            fetch_languages(client, repo).await
        }
    });
    let breakdowns: Vec<LanguageByteMap> = join_all(fetches).await;

    let mut totals = LanguageByteMap::new();
    let mut enriched = Vec::with_capacity(repos.len());
    for (repo, bytes) in repos.into_iter().zip(breakdowns) {
        for (language, n) in &bytes {
            *totals.entry(language.clone()).or_insert(0) += n;
        }
        enriched.push(EnrichedRepo {
            languages: bytes.keys().cloned().collect(),
            language_stats: language_stats(&bytes),
            repo,
        });
    }

    GithubData {
        repos: enriched,
        skills: skill_levels(&totals),
    }
}

/// One retry, then give up on this repository alone.
async fn fetch_languages(client: &DynGithubClient, repo: &Repo) -> LanguageByteMap {
    let first = match client.repo_languages(repo).await {
        Ok(bytes) => return bytes,
        Err(err) => err,
    };
    match client.repo_languages(repo).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(
                repo = %repo.name,
                first = %first,
                retry = %err,
                "language fetch failed twice; counting zero bytes"
            );
            LanguageByteMap::new()
        }
    }
}
