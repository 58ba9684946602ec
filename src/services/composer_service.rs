// src/services/composer_service.rs
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::{
    errors::NotifyResult,
    models::notification::{
        DeliveryRequest, DispatchOutcome, NotificationCategory, NotificationEvent,
        RenderedNotification, TemplateKey,
    },
    services::{
        dispatch_service::Dispatcher, profile_service::ProfileStore,
        template_service::TemplateCatalog,
    },
};

/// Where the composer forwards rendered notifications.
#[async_trait]
pub trait DispatchClient: Send + Sync {
    async fn dispatch(&self, notification: RenderedNotification) -> DispatchOutcome;
}

#[async_trait]
impl DispatchClient for Dispatcher {
    async fn dispatch(&self, notification: RenderedNotification) -> DispatchOutcome {
        Dispatcher::dispatch(self, notification).await
    }
}

/// Calls a remote dispatcher over `POST /send-notification`.
pub struct HttpDispatchClient {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DispatchResponse {
    #[serde(default)]
    success: bool,
    result: Option<DispatchOutcome>,
    message: Option<String>,
}

impl HttpDispatchClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> NotifyResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    async fn post(&self, notification: &RenderedNotification) -> NotifyResult<DispatchOutcome> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&DeliveryRequest::from(notification))
            .send()
            .await?;

        let status = response.status();
        let body: DispatchResponse = response.json().await?;

        Ok(match body {
            DispatchResponse { result: Some(outcome), .. } => outcome,
            DispatchResponse { success: true, .. } if status.is_success() => {
                DispatchOutcome::Delivered {
                    ticket: serde_json::Value::Null,
                }
            }
            DispatchResponse { message, .. } => DispatchOutcome::failed(
                message.unwrap_or_else(|| format!("dispatcher returned {}", status)),
            ),
        })
    }
}

#[async_trait]
impl DispatchClient for HttpDispatchClient {
    async fn dispatch(&self, notification: RenderedNotification) -> DispatchOutcome {
        match self.post(&notification).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    user_id = %notification.recipient_id,
                    error = %e,
                    "Failed to reach notification dispatcher"
                );
                DispatchOutcome::failed(e.to_string())
            }
        }
    }
}

/// Per-recipient result of a fan-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientOutcome {
    pub recipient_id: String,
    pub outcome: DispatchOutcome,
}

/// Turns domain events into localized notifications and hands them to a
/// dispatcher.
pub struct NotificationComposer {
    profiles: Arc<dyn ProfileStore>,
    catalog: Arc<TemplateCatalog>,
    dispatcher: Arc<dyn DispatchClient>,
}

impl NotificationComposer {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        catalog: Arc<TemplateCatalog>,
        dispatcher: Arc<dyn DispatchClient>,
    ) -> Self {
        Self {
            profiles,
            catalog,
            dispatcher,
        }
    }

    /// The recipient's stored language, or the catalog's fallback. Store
    /// errors are logged and treated as "no language".
    pub async fn resolve_language(&self, recipient_id: &str) -> String {
        match self.profiles.language(recipient_id).await {
            Ok(Some(language)) if !language.trim().is_empty() => language,
            Ok(_) => self.catalog.fallback_language().to_string(),
            Err(e) => {
                tracing::warn!(
                    user_id = recipient_id,
                    error = %e,
                    "Language lookup failed, using fallback"
                );
                self.catalog.fallback_language().to_string()
            }
        }
    }

    pub async fn render(&self, event: &NotificationEvent) -> RenderedNotification {
        let language = self.resolve_language(&event.recipient_id).await;
        let (title, body) = self
            .catalog
            .render(&language, &event.template_key, &event.params);

        let mut payload = event.payload.clone();
        if !event.correlated_ride_id.is_empty() {
            payload.insert(
                "rideId".to_string(),
                serde_json::Value::String(event.correlated_ride_id.clone()),
            );
        }

        RenderedNotification {
            recipient_id: event.recipient_id.clone(),
            title,
            body,
            category: event.category.clone(),
            payload,
        }
    }

    pub async fn notify(&self, event: NotificationEvent) -> DispatchOutcome {
        let rendered = self.render(&event).await;
        let outcome = self.dispatcher.dispatch(rendered).await;

        if let DispatchOutcome::Failed { reason } = &outcome {
            tracing::warn!(
                user_id = %event.recipient_id,
                category = %event.category,
                reason = %reason,
                "Notification failed"
            );
        }
        outcome
    }

    /// Dispatches every event concurrently and waits for all of them.
    pub async fn notify_all(&self, events: Vec<NotificationEvent>) -> Vec<RecipientOutcome> {
        let tasks = events.into_iter().map(|event| async move {
            let recipient_id = event.recipient_id.clone();
            let outcome = self.notify(event).await;
            RecipientOutcome {
                recipient_id,
                outcome,
            }
        });

        let outcomes = join_all(tasks).await;

        let failed = outcomes.iter().filter(|o| !o.outcome.is_success()).count();
        tracing::info!(
            recipients = outcomes.len(),
            failed,
            "Fan-out complete"
        );
        outcomes
    }

    pub async fn notify_owner_of_join_request(
        &self,
        owner_id: &str,
        requester_name: &str,
        ride_id: &str,
        ride_title: &str,
    ) -> DispatchOutcome {
        let event = NotificationEvent::new(
            NotificationCategory::Request,
            owner_id,
            TemplateKey::JoinRequest,
            ride_id,
        )
        .with_param("name", requester_name)
        .with_param("ride", ride_title);

        self.notify(event).await
    }

    pub async fn notify_user_of_approval(
        &self,
        user_id: &str,
        ride_title: &str,
        ride_id: &str,
    ) -> DispatchOutcome {
        let event = NotificationEvent::new(
            NotificationCategory::Approval,
            user_id,
            TemplateKey::Approved,
            ride_id,
        )
        .with_param("ride", ride_title);

        self.notify(event).await
    }

    pub async fn notify_user_of_rejection(
        &self,
        user_id: &str,
        ride_title: &str,
        ride_id: &str,
    ) -> DispatchOutcome {
        let event = NotificationEvent::new(
            NotificationCategory::Rejection,
            user_id,
            TemplateKey::Rejected,
            ride_id,
        )
        .with_param("ride", ride_title);

        self.notify(event).await
    }

    pub async fn notify_participants_of_ride_update(
        &self,
        participant_ids: &[String],
        ride_title: &str,
        ride_id: &str,
        change_description: &str,
    ) -> Vec<RecipientOutcome> {
        let events = participant_ids
            .iter()
            .map(|user_id| {
                NotificationEvent::new(
                    NotificationCategory::RideUpdate,
                    user_id.as_str(),
                    TemplateKey::RideUpdated,
                    ride_id,
                )
                .with_param("ride", ride_title)
                .with_param("change", change_description)
            })
            .collect();

        self.notify_all(events).await
    }

    pub async fn notify_participants_of_cancellation(
        &self,
        participant_ids: &[String],
        ride_title: &str,
        ride_id: &str,
    ) -> Vec<RecipientOutcome> {
        let events = participant_ids
            .iter()
            .map(|user_id| {
                NotificationEvent::new(
                    NotificationCategory::RideUpdate,
                    user_id.as_str(),
                    TemplateKey::RideCancelled,
                    ride_id,
                )
                .with_param("ride", ride_title)
            })
            .collect();

        self.notify_all(events).await
    }
}
