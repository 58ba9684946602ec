// src/models/notification.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::{NotifyError, NotifyResult};
use crate::utils::id_generator::{IdGenerator, IdType};

/// Client-side routing data attached to a push (e.g. `rideId`).
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Notification type as it crosses the invocation boundary.
///
/// Unknown strings are kept verbatim in `Other` so the history row stores
/// exactly what the caller sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationCategory {
    RideUpdate,
    Request,
    Approval,
    Rejection,
    NewRide,
    Decision,     // alias of approval/rejection routing
    StatusUpdate, // alias of approval/rejection routing
    Cancellation,
    Other(String),
}

impl NotificationCategory {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationCategory::RideUpdate => "ride_update",
            NotificationCategory::Request => "request",
            NotificationCategory::Approval => "approval",
            NotificationCategory::Rejection => "rejection",
            NotificationCategory::NewRide => "new_ride",
            NotificationCategory::Decision => "decision",
            NotificationCategory::StatusUpdate => "status_update",
            NotificationCategory::Cancellation => "cancellation",
            NotificationCategory::Other(raw) => raw,
        }
    }

    pub fn channel_group(&self) -> ChannelGroup {
        ChannelGroup::for_category(self)
    }
}

impl From<String> for NotificationCategory {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "ride_update" => NotificationCategory::RideUpdate,
            "request" => NotificationCategory::Request,
            "approval" => NotificationCategory::Approval,
            "rejection" => NotificationCategory::Rejection,
            "new_ride" => NotificationCategory::NewRide,
            "decision" => NotificationCategory::Decision,
            "status_update" => NotificationCategory::StatusUpdate,
            "cancellation" => NotificationCategory::Cancellation,
            _ => NotificationCategory::Other(raw),
        }
    }
}

impl From<&str> for NotificationCategory {
    fn from(raw: &str) -> Self {
        NotificationCategory::from(raw.to_string())
    }
}

impl From<NotificationCategory> for String {
    fn from(category: NotificationCategory) -> Self {
        match category {
            NotificationCategory::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket used both as the preference key and as the Android channel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelGroup {
    RideUpdates,
    RequestsApprovals,
    NewRides,
}

/// Category wire name -> channel group. Anything not listed is a ride update.
const CHANNEL_TABLE: &[(&str, ChannelGroup)] = &[
    ("request", ChannelGroup::RequestsApprovals),
    ("approval", ChannelGroup::RequestsApprovals),
    ("rejection", ChannelGroup::RequestsApprovals),
    ("status_update", ChannelGroup::RequestsApprovals),
    ("decision", ChannelGroup::RequestsApprovals),
    ("new_ride", ChannelGroup::NewRides),
];

impl ChannelGroup {
    pub fn for_category(category: &NotificationCategory) -> Self {
        Self::for_type(category.as_str())
    }

    pub fn for_type(raw: &str) -> Self {
        CHANNEL_TABLE
            .iter()
            .find(|(name, _)| *name == raw)
            .map(|(_, group)| *group)
            .unwrap_or(ChannelGroup::RideUpdates)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelGroup::RideUpdates => "ride_updates",
            ChannelGroup::RequestsApprovals => "requests_approvals",
            ChannelGroup::NewRides => "new_rides",
        }
    }
}

impl fmt::Display for ChannelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys under the `notifications` namespace of a translation bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKey {
    JoinRequest,
    Approved,
    Rejected,
    RideUpdated,
    RideCancelled,
}

impl TemplateKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKey::JoinRequest => "joinRequest",
            TemplateKey::Approved => "approved",
            TemplateKey::Rejected => "rejected",
            TemplateKey::RideUpdated => "rideUpdated",
            TemplateKey::RideCancelled => "rideCancelled",
        }
    }
}

impl From<TemplateKey> for String {
    fn from(key: TemplateKey) -> Self {
        key.as_str().to_string()
    }
}

/// A domain action's request to notify one user.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub category: NotificationCategory,
    pub recipient_id: String,
    pub template_key: String,
    pub params: HashMap<String, String>,
    pub correlated_ride_id: String,
    pub payload: Payload,
}

impl NotificationEvent {
    pub fn new(
        category: NotificationCategory,
        recipient_id: impl Into<String>,
        template_key: impl Into<String>,
        correlated_ride_id: impl Into<String>,
    ) -> Self {
        Self {
            category,
            recipient_id: recipient_id.into(),
            template_key: template_key.into(),
            params: HashMap::new(),
            correlated_ride_id: correlated_ride_id.into(),
            payload: Payload::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

/// Localized, fully substituted message ready for the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNotification {
    pub recipient_id: String,
    pub title: String,
    pub body: String,
    pub category: NotificationCategory,
    pub payload: Payload,
}

/// JSON body accepted by `POST /send-notification`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRequest {
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
}

fn required(value: Option<String>, field: &str) -> NotifyResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(NotifyError::missing_field(field)),
    }
}

impl DeliveryRequest {
    /// Validates the boundary contract. Runs before any external call.
    pub fn into_rendered(self) -> NotifyResult<RenderedNotification> {
        let recipient_id = required(self.user_id, "userId")?;
        let title = required(self.title, "title")?;
        let body = required(self.body, "body")?;
        let category = NotificationCategory::from(required(self.notification_type, "type")?);

        let payload = match self.data {
            None | Some(serde_json::Value::Null) => Payload::new(),
            Some(serde_json::Value::Object(map)) => map,
            Some(_) => return Err(NotifyError::bad_request("data must be a JSON object")),
        };

        Ok(RenderedNotification {
            recipient_id,
            title,
            body,
            category,
            payload,
        })
    }
}

impl From<&RenderedNotification> for DeliveryRequest {
    fn from(rendered: &RenderedNotification) -> Self {
        Self {
            user_id: Some(rendered.recipient_id.clone()),
            title: Some(rendered.title.clone()),
            body: Some(rendered.body.clone()),
            data: Some(serde_json::Value::Object(rendered.payload.clone())),
            notification_type: Some(rendered.category.as_str().to_string()),
        }
    }
}

/// Message in the push gateway's wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub to: String,
    pub sound: String,
    pub title: String,
    pub body: String,
    pub data: Payload,
    pub channel_id: ChannelGroup,
}

impl PushMessage {
    pub fn new(token: &str, rendered: &RenderedNotification, channel: ChannelGroup) -> Self {
        Self {
            to: token.to_string(),
            sound: "default".to_string(),
            title: rendered.title.clone(),
            body: rendered.body.clone(),
            data: rendered.payload.clone(),
            channel_id: channel,
        }
    }
}

/// Result of one dispatch attempt. None of these are exceptional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Delivered { ticket: serde_json::Value },
    Suppressed { channel: ChannelGroup },
    NoDestination,
    Failed { reason: String },
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, DispatchOutcome::Failed { .. })
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        DispatchOutcome::Failed {
            reason: reason.into(),
        }
    }
}

/// Append-only inbox row, one per gateway attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationHistoryRecord {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub category: NotificationCategory,
    pub title: String,
    pub body: String,
    pub data: Payload,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationHistoryRecord {
    pub fn for_attempt(rendered: &RenderedNotification) -> Self {
        Self {
            id: IdGenerator::generate(IdType::Notification),
            user_id: rendered.recipient_id.clone(),
            category: rendered.category.clone(),
            title: rendered.title.clone(),
            body: rendered.body.clone(),
            data: rendered.payload.clone(),
            read: false,
            created_at: Utc::now(),
        }
    }
}
