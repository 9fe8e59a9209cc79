use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::AppState;
use crate::mailer::OutgoingEmail;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendData {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SendData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/contact
///
/// Forwards the message to the configured inbox via the mail provider.
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> (StatusCode, Json<ContactResponse>) {
    let Ok(Json(req)) = payload else {
        return reject(StatusCode::UNPROCESSABLE_ENTITY, "invalid request body");
    };
    if req.email.trim().is_empty() {
        return reject(StatusCode::UNPROCESSABLE_ENTITY, "email must be non-empty");
    }
    if req.message.trim().is_empty() {
        return reject(
            StatusCode::UNPROCESSABLE_ENTITY,
            "message must be non-empty",
        );
    }

    let email = OutgoingEmail {
        from: state.cfg.contact_from.clone(),
        to: vec![state.cfg.contact_recipient.clone()],
        subject: format!("[Portfolio] {}", req.subject),
        reply_to: req.email.clone(),
        text: format!(
            "Name: {}\nEmail: {}\n\nMessage:\n{}",
            req.name, req.email, req.message
        ),
    };

    match state.mailer.send(&email).await {
        Ok(id) => (
            StatusCode::OK,
            Json(ContactResponse {
                success: true,
                data: Some(SendData { id }),
                error: None,
            }),
        ),
        Err(err) => {
            error!(error = %err, "contact mail delivery failed");
            reject(StatusCode::BAD_GATEWAY, "Failed to send message")
        }
    }
}

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<ContactResponse>) {
    (
        status,
        Json(ContactResponse {
            success: false,
            data: None,
            error: Some(message.to_string()),
        }),
    )
}
