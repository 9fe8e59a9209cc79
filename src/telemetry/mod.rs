pub mod session;
pub mod transport;

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::warn;

use session::DynSessionStore;
use transport::{DynTrackingApi, TrackingError};

/// Session key under which the resolved visitor tuple is cached.
pub const SESSION_CACHE_KEY: &str = "visitor_telemetry";

/// Observable lifecycle of the once-per-session recording sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchStatus {
    Idle,
    Fetching,
    Success,
    Error,
}

/// What the session remembers about its visitor once recording succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorTelemetry {
    pub ip: String,
    pub city: String,
    pub country: String,
}

struct TrackerState {
    status: FetchStatus,
    visitor: Option<VisitorTelemetry>,
    started: bool,
}

/// Runs the visit-recording sequence at most once per session: resolve the
/// public address, submit it, cache the resulting tuple. Terminal states are
/// sticky for the lifetime of the tracker.
pub struct VisitTracker {
    session: DynSessionStore,
    api: DynTrackingApi,
    state: Mutex<TrackerState>,
}

impl VisitTracker {
    pub fn new(session: DynSessionStore, api: DynTrackingApi) -> Self {
        Self {
            session,
            api,
            state: Mutex::new(TrackerState {
                status: FetchStatus::Idle,
                visitor: None,
                started: false,
            }),
        }
    }

    pub fn status(&self) -> FetchStatus {
        self.lock().status
    }

    pub fn visitor(&self) -> Option<VisitorTelemetry> {
        self.lock().visitor.clone()
    }

    /// Idempotent entry point. The first caller runs the sequence; everyone
    /// after that gets whatever status it already reached.
    pub async fn ensure_recorded(&self) -> FetchStatus {
        {
            // Guard flips before the first await so overlapping callers
            // cannot start a second sequence.
            let mut state = self.lock();
            if state.started {
                return state.status;
            }
            state.started = true;
        }

        if let Some(cached) = self.session.get(SESSION_CACHE_KEY) {
            match serde_json::from_str::<VisitorTelemetry>(&cached) {
                Ok(visitor) => {
                    let mut state = self.lock();
                    state.visitor = Some(visitor);
                    state.status = FetchStatus::Success;
                    return FetchStatus::Success;
                }
                Err(err) => {
                    warn!(error = %err, "discarding unreadable cached visitor tuple");
                }
            }
        }

        self.set_status(FetchStatus::Fetching);
        match self.resolve_and_record().await {
            Ok(visitor) => {
                if let Ok(cached) = serde_json::to_string(&visitor) {
                    self.session.set(SESSION_CACHE_KEY, &cached);
                }
                let mut state = self.lock();
                state.visitor = Some(visitor);
                state.status = FetchStatus::Success;
                FetchStatus::Success
            }
            Err(err) => {
                warn!(error = %err, "visit recording failed; sending bodyless fallback");
                // Best effort so the visit still lands server-side; the
                // outcome no longer changes our state.
                let _ = self.api.record_visit(None).await;
                self.set_status(FetchStatus::Error);
                FetchStatus::Error
            }
        }
    }

    async fn resolve_and_record(&self) -> Result<VisitorTelemetry, TrackingError> {
        let ip = self.api.resolve_public_ip().await?;
        let outcome = self.api.record_visit(Some(&ip)).await?;
        match outcome.location {
            Some(location) if outcome.success => Ok(VisitorTelemetry {
                ip: location.ip,
                city: location.city,
                country: location.country,
            }),
            _ => Err(TrackingError::Rejected(
                outcome
                    .error
                    .unwrap_or_else(|| "no location in response".to_string()),
            )),
        }
    }

    fn set_status(&self, status: FetchStatus) {
        self.lock().status = status;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
