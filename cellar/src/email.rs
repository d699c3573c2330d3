//! Transactional email client.

use crate::config::EmailConfig;
use serde::Serialize;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Email request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email API returned {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Invalid email API URL: {0}")]
    InvalidUrl(String),
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[derive(Clone)]
pub struct EmailClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    from: String,
    pub notify: Vec<String>,
    pub brand: String,
}

impl EmailClient {
    pub fn new(config: &EmailConfig) -> Self {
        EmailClient {
            client: reqwest::Client::new(),
            base_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            notify: config.notify.clone(),
            brand: config.brand.clone(),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), EmailError> {
        let url = self
            .base_url
            .join("/emails")
            .map_err(|e| EmailError::InvalidUrl(e.to_string()))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&SendRequest {
                from: &self.from,
                to,
                subject,
                html,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::UnexpectedStatus {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
