use axum::Router;
use tower_http::{compression::CompressionLayer, request_id::MakeRequestUuid, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;

use portfolio_api_service::{
    AppState,
    api::github::GithubCache,
    config::Config,
    geo::{DynGeoResolver, IpApiResolver},
    github::client::{DynGithubClient, HttpGithubClient},
    http,
    mailer::{DynMailer, ResendMailer},
    store::{DynVisitStore, SqliteVisitStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Config::from_env()?;
    if cfg.github_token.is_none() {
        tracing::warn!("GITHUB_TOKEN not set; aggregation runs against anonymous rate limits");
    }
    if cfg.resend_api_key.is_none() {
        tracing::warn!("RESEND_API_KEY not set; contact mail delivery will fail upstream");
    }

    let github: DynGithubClient = Arc::new(HttpGithubClient::new(&cfg)?);
    let geo: DynGeoResolver = Arc::new(IpApiResolver::new(&cfg)?);
    let store: DynVisitStore = Arc::new(SqliteVisitStore::open(&cfg.visits_db_path)?);
    let mailer: DynMailer = Arc::new(ResendMailer::new(&cfg)?);

    let state = AppState {
        cfg: cfg.clone(),
        github,
        geo,
        store,
        mailer,
        github_cache: GithubCache::new(),
    };

    let app: Router = http::router()
        .layer(TraceLayer::new_for_http())
        .layer(tower_http::request_id::SetRequestIdLayer::x_request_id(
            MakeRequestUuid,
        ))
        .layer(CompressionLayer::new())
        // Track and contact bodies are tiny; anything larger is abuse.
        .layer(tower_http::limit::RequestBodyLimitLayer::new(64 * 1024))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    tracing::info!("portfolio-api-service listening on {}", cfg.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
