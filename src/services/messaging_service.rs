// src/services/messaging_service.rs
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use crate::{
    errors::{NotifyError, NotifyResult},
    models::notification::PushMessage,
    utils::id_generator::{IdGenerator, IdType},
};

pub const EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Debug, Clone)]
pub struct ExpoConfig {
    pub push_url: String,
    /// Bearer credential. Expo accepts unauthenticated sends when the
    /// project has no access token enforcement.
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl Default for ExpoConfig {
    fn default() -> Self {
        Self {
            push_url: EXPO_PUSH_URL.to_string(),
            access_token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// The external service that performs device delivery.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Returns the provider's response body unchanged.
    async fn send(&self, message: &PushMessage) -> NotifyResult<serde_json::Value>;
}

pub struct ExpoPushGateway {
    config: ExpoConfig,
    client: reqwest::Client,
}

impl ExpoPushGateway {
    pub fn new(config: ExpoConfig) -> NotifyResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl PushGateway for ExpoPushGateway {
    async fn send(&self, message: &PushMessage) -> NotifyResult<serde_json::Value> {
        if message.to.is_empty() {
            return Err(NotifyError::PushDelivery("Empty device token".to_string()));
        }

        tracing::info!(channel = %message.channel_id, "Sending Expo push");

        let mut request = self
            .client
            .post(&self.config.push_url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .json(message);

        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(%status, "Expo push request failed: {}", error_text);
            return Err(NotifyError::PushDelivery(format!("{}: {}", status, error_text)));
        }

        let ticket: serde_json::Value = response.json().await?;

        // Expo reports per-message problems inside a 200 body
        if ticket["data"]["status"] == "error" {
            tracing::warn!(ticket = %ticket, "Expo accepted the request but rejected the message");
        } else {
            tracing::debug!(ticket = %ticket, "Expo push accepted");
        }

        Ok(ticket)
    }
}

/// Gateway for local development: logs instead of delivering.
#[derive(Debug, Default)]
pub struct LoggingPushGateway;

#[async_trait]
impl PushGateway for LoggingPushGateway {
    async fn send(&self, message: &PushMessage) -> NotifyResult<serde_json::Value> {
        tracing::info!(
            "[MOCK] Would push to {} on {}: {} - {}",
            message.to,
            message.channel_id,
            message.title,
            message.body
        );

        Ok(json!({
            "data": {
                "status": "ok",
                "id": IdGenerator::generate(IdType::PushTicket),
            }
        }))
    }
}
