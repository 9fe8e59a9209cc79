use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("geolocation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geolocation lookup rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoLocation {
    pub city: String,
    pub region: String,
    pub country: String,
}

#[async_trait]
pub trait GeoResolver: Send + Sync {
    async fn locate(&self, ip: &str) -> Result<GeoLocation, GeoError>;
}

pub type DynGeoResolver = Arc<dyn GeoResolver>;

/// ip-api.com compatible resolver: `GET {base}/json/{ip}`.
pub struct IpApiResolver {
    http: reqwest::Client,
    api_base: String,
}

impl IpApiResolver {
    pub fn new(cfg: &Config) -> Result<Self, GeoError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.outbound_timeout)
            .build()?;
        Ok(Self {
            http,
            api_base: cfg.geo_api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpApiPayload {
    status: String,
    #[serde(default)]
    city: String,
    #[serde(default, rename = "regionName")]
    region_name: String,
    #[serde(default)]
    country: String,
}

#[async_trait]
impl GeoResolver for IpApiResolver {
    async fn locate(&self, ip: &str) -> Result<GeoLocation, GeoError> {
        let url = format!("{}/json/{}", self.api_base, ip);
        let payload: IpApiPayload = self.http.get(url).send().await?.json().await?;
        if payload.status != "success" {
            return Err(GeoError::Rejected(payload.status));
        }
        Ok(GeoLocation {
            city: payload.city,
            region: payload.region_name,
            country: payload.country,
        })
    }
}

/// Addresses the public lookup service can never resolve.
pub fn is_loopback(ip: &str) -> bool {
    ip == "127.0.0.1" || ip == "::1"
}
