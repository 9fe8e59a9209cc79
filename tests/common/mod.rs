// Shared across test binaries; not every binary uses every helper.
#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use axum::Router;

use portfolio_api_service::{
    AppState,
    api::github::GithubCache,
    config::Config,
    domain::stats::LanguageByteMap,
    geo::{DynGeoResolver, GeoError, GeoLocation, GeoResolver},
    github::client::{DynGithubClient, GithubClient, GithubError, Repo},
    http,
    mailer::{DynMailer, MailError, Mailer, OutgoingEmail},
    store::{DynVisitStore, SqliteVisitStore, StoreError, VisitStore},
};

pub fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        github_username: "testuser".to_string(),
        github_token: None,
        github_api_base: "https://api.github.com".to_string(),
        github_max_concurrent: 4,
        // Zero keeps every request fresh; cache tests override this.
        github_cache_ttl: Duration::ZERO,
        outbound_timeout: Duration::from_secs(5),
        geo_api_base: "http://ip-api.com".to_string(),
        visits_db_path: ":memory:".to_string(),
        visits_list_key: "portfolio_visits".to_string(),
        resend_api_base: "https://api.resend.com".to_string(),
        resend_api_key: None,
        contact_from: "Portfolio Contact <onboarding@resend.dev>".to_string(),
        contact_recipient: "owner@example.com".to_string(),
    }
}

#[derive(Clone, Default)]
pub struct MockGithub {
    /// None makes the repository listing fail.
    pub repos: Arc<std::sync::Mutex<Option<Vec<Repo>>>>,
    pub languages: Arc<std::sync::Mutex<HashMap<String, LanguageByteMap>>>,
    /// Repository names whose language fetch always errors.
    pub failing_languages: Arc<std::sync::Mutex<HashSet<String>>>,
    pub list_calls: Arc<std::sync::Mutex<usize>>,
    pub language_calls: Arc<std::sync::Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl GithubClient for MockGithub {
    async fn list_repos(&self, _username: &str) -> Result<Vec<Repo>, GithubError> {
        *self.list_calls.lock().unwrap() += 1;
        self.repos
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| GithubError::UnexpectedPayload("listing disabled".to_string()))
    }

    async fn repo_languages(&self, repo: &Repo) -> Result<LanguageByteMap, GithubError> {
        self.language_calls.lock().unwrap().push(repo.name.clone());
        if self.failing_languages.lock().unwrap().contains(&repo.name) {
            return Err(GithubError::UnexpectedPayload(format!(
                "languages unavailable for {}",
                repo.name
            )));
        }
        Ok(self
            .languages
            .lock()
            .unwrap()
            .get(&repo.name)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Clone, Default)]
pub struct MockGeo {
    pub by_ip: Arc<std::sync::Mutex<HashMap<String, GeoLocation>>>,
    pub calls: Arc<std::sync::Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl GeoResolver for MockGeo {
    async fn locate(&self, ip: &str) -> Result<GeoLocation, GeoError> {
        self.calls.lock().unwrap().push(ip.to_string());
        self.by_ip
            .lock()
            .unwrap()
            .get(ip)
            .cloned()
            .ok_or_else(|| GeoError::Rejected("fail".to_string()))
    }
}

#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<std::sync::Mutex<Vec<OutgoingEmail>>>,
    pub fail: Arc<std::sync::Mutex<bool>>,
}

#[async_trait::async_trait]
impl Mailer for MockMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        if *self.fail.lock().unwrap() {
            return Err(MailError::Upstream {
                status: 401,
                body: "invalid api key".to_string(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok("msg_0001".to_string())
    }
}

/// Store whose writes always fail, for exercising the 500 path.
pub struct FailingStore;

#[async_trait::async_trait]
impl VisitStore for FailingStore {
    async fn prepend(&self, _list_key: &str, _payload: &str) -> Result<(), StoreError> {
        Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery))
    }

    async fn recent(&self, _list_key: &str, _limit: usize) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }

    async fn len(&self, _list_key: &str) -> Result<usize, StoreError> {
        Ok(0)
    }
}

pub struct TestContext {
    pub state: AppState,
    pub github: MockGithub,
    pub geo: MockGeo,
    pub mailer: MockMailer,
    pub store: Arc<SqliteVisitStore>,
}

pub fn test_state() -> TestContext {
    test_state_with_config(test_config())
}

pub fn test_state_with_config(cfg: Config) -> TestContext {
    let github = MockGithub::default();
    let geo = MockGeo::default();
    let mailer = MockMailer::default();
    let store = Arc::new(SqliteVisitStore::open_in_memory().unwrap());

    let state = AppState {
        cfg,
        github: Arc::new(github.clone()) as DynGithubClient,
        geo: Arc::new(geo.clone()) as DynGeoResolver,
        store: store.clone() as DynVisitStore,
        mailer: Arc::new(mailer.clone()) as DynMailer,
        github_cache: GithubCache::new(),
    };

    TestContext {
        state,
        github,
        geo,
        mailer,
        store,
    }
}

pub fn app(state: AppState) -> Router {
    http::router().with_state(state)
}

pub fn repo(name: &str, stars: u32, fork: bool, updated_at: &str) -> Repo {
    Repo {
        name: name.to_string(),
        description: Some(format!("{name} description")),
        html_url: format!("https://github.com/testuser/{name}"),
        stargazers_count: stars,
        language: None,
        fork,
        updated_at: updated_at.parse().unwrap(),
        languages_url: format!("https://api.github.com/repos/testuser/{name}/languages"),
    }
}

pub fn bytes(pairs: &[(&str, u64)]) -> LanguageByteMap {
    pairs
        .iter()
        .map(|(name, n)| (name.to_string(), *n))
        .collect()
}
