pub mod api;
pub mod config;
pub mod domain;
pub mod geo;
pub mod github;
pub mod http;
pub mod mailer;
pub mod store;
pub mod telemetry;

#[derive(Clone)]
pub struct AppState {
    pub cfg: config::Config,
    pub github: github::client::DynGithubClient,
    pub geo: geo::DynGeoResolver,
    pub store: store::DynVisitStore,
    pub mailer: mailer::DynMailer,
    pub github_cache: api::github::GithubCache,
}
