use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for any visit field that could not be resolved.
pub const UNKNOWN: &str = "Unknown";

/// One recorded visit, exactly as it is persisted and returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub ip: String,
    pub city: String,
    pub region: String,
    pub country: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    /// UTC instant in RFC 3339 with millisecond precision, e.g.
    /// `2026-08-21T09:30:00.123Z`.
    pub timestamp: String,
}

impl VisitRecord {
    pub fn now_timestamp() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
