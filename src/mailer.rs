use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("mail provider returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

/// One outgoing transactional message, already flattened to plain text.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub reply_to: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers the message and returns the provider-assigned id.
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError>;
}

pub type DynMailer = Arc<dyn Mailer>;

/// Resend REST client: `POST {base}/emails` with bearer auth.
pub struct ResendMailer {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl ResendMailer {
    pub fn new(cfg: &Config) -> Result<Self, MailError> {
        let http = reqwest::Client::builder()
            .timeout(cfg.outbound_timeout)
            .build()?;
        Ok(Self {
            http,
            api_base: cfg.resend_api_base.trim_end_matches('/').to_string(),
            api_key: cfg.resend_api_key.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SendReceipt {
    id: String,
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let url = format!("{}/emails", self.api_base);
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        let receipt: SendReceipt = resp.json().await?;
        Ok(receipt.id)
    }
}
