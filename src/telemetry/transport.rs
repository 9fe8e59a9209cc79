use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::domain::visit::VisitRecord;

pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("tracking transport failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("recording endpoint rejected the visit: {0}")]
    Rejected(String),
}

/// Decoded recording-endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordOutcome {
    pub success: bool,
    #[serde(default)]
    pub location: Option<VisitRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait]
pub trait TrackingApi: Send + Sync {
    /// Public address of this client, resolved by an external lookup service.
    async fn resolve_public_ip(&self) -> Result<String, TrackingError>;

    /// Submits one visit to the recording endpoint. `client_ip == None` sends
    /// no body at all.
    async fn record_visit(&self, client_ip: Option<&str>) -> Result<RecordOutcome, TrackingError>;
}

pub type DynTrackingApi = Arc<dyn TrackingApi>;

/// reqwest transport speaking to a live recording endpoint.
pub struct HttpTrackingApi {
    http: reqwest::Client,
    ip_lookup_url: String,
    track_url: String,
}

impl HttpTrackingApi {
    pub fn new(
        ip_lookup_url: &str,
        track_url: &str,
        timeout: Duration,
    ) -> Result<Self, TrackingError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            ip_lookup_url: ip_lookup_url.to_string(),
            track_url: track_url.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpPayload {
    ip: String,
}

#[async_trait]
impl TrackingApi for HttpTrackingApi {
    async fn resolve_public_ip(&self) -> Result<String, TrackingError> {
        let payload: IpPayload = self
            .http
            .get(&self.ip_lookup_url)
            .send()
            .await?
            .json()
            .await?;
        Ok(payload.ip)
    }

    async fn record_visit(&self, client_ip: Option<&str>) -> Result<RecordOutcome, TrackingError> {
        let mut req = self.http.post(&self.track_url);
        if let Some(ip) = client_ip {
            req = req.json(&json!({ "clientIp": ip }));
        }
        Ok(req.send().await?.json().await?)
    }
}
