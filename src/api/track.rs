use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::AppState;
use crate::domain::visit::{UNKNOWN, VisitRecord};
use crate::geo;

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    #[serde(rename = "clientIp")]
    pub client_ip: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<VisitRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/track
///
/// Records one visit. Every resolution step degrades to "Unknown" rather
/// than failing the request; only a store write failure answers 500.
pub async fn record_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TrackRequest>, JsonRejection>,
) -> (StatusCode, Json<TrackResponse>) {
    // An absent or unreadable body just means no client-supplied address.
    let client_ip = payload
        .ok()
        .and_then(|Json(req)| req.client_ip)
        .filter(|ip| !ip.is_empty());

    let mut city = header_value(&headers, "x-vercel-ip-city");
    let mut region = header_value(&headers, "x-vercel-ip-country-region");
    let mut country = header_value(&headers, "x-vercel-ip-country");

    let forwarded_ip = header_value(&headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty());
    let ip = client_ip
        .or(forwarded_ip)
        .unwrap_or_else(|| UNKNOWN.to_string());

    let user_agent = header_value(&headers, "user-agent").unwrap_or_else(|| UNKNOWN.to_string());

    // Fallback for deployments without edge geo headers. Loopback and
    // unresolvable addresses are never sent to the lookup service.
    if city.is_none() && ip != UNKNOWN && !geo::is_loopback(&ip) {
        match state.geo.locate(&ip).await {
            Ok(location) => {
                city = Some(location.city);
                region = Some(location.region);
                country = Some(location.country);
            }
            Err(err) => {
                warn!(error = %err, "geolocation fallback failed");
            }
        }
    }

    let record = VisitRecord {
        ip,
        city: city.unwrap_or_else(|| UNKNOWN.to_string()),
        region: region.unwrap_or_else(|| UNKNOWN.to_string()),
        country: country.unwrap_or_else(|| UNKNOWN.to_string()),
        user_agent,
        timestamp: VisitRecord::now_timestamp(),
    };

    let serialized = match serde_json::to_string(&record) {
        Ok(serialized) => serialized,
        Err(err) => {
            error!(error = %err, "failed to serialize visit record");
            return write_failure();
        }
    };
    match state
        .store
        .prepend(&state.cfg.visits_list_key, &serialized)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(TrackResponse {
                success: true,
                location: Some(record),
                error: None,
            }),
        ),
        Err(err) => {
            error!(error = %err, "failed to persist visit record");
            write_failure()
        }
    }
}

fn write_failure() -> (StatusCode, Json<TrackResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(TrackResponse {
            success: false,
            location: None,
            error: Some("Failed to record visit".to_string()),
        }),
    )
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}
