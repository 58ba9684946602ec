// src/models/profile.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::notification::ChannelGroup;

/// Per-user channel-group switches, stored as a free-form JSON object.
///
/// Only a literal `false` turns a group off; missing keys and any other
/// value leave it on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryPreferences(pub HashMap<String, serde_json::Value>);

impl DeliveryPreferences {
    pub fn is_enabled(&self, group: ChannelGroup) -> bool {
        !matches!(self.0.get(group.as_str()), Some(serde_json::Value::Bool(false)))
    }

    pub fn with(mut self, group: ChannelGroup, enabled: bool) -> Self {
        self.0
            .insert(group.as_str().to_string(), serde_json::Value::Bool(enabled));
        self
    }
}

/// Profile row fields this service reads or writes. Keyed by `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub expo_push_token: Option<String>,
    #[serde(default)]
    pub notification_preferences: Option<DeliveryPreferences>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_push_token(mut self, token: impl Into<String>) -> Self {
        self.expo_push_token = Some(token.into());
        self
    }

    pub fn with_preferences(mut self, preferences: DeliveryPreferences) -> Self {
        self.notification_preferences = Some(preferences);
        self
    }

    /// The device destination, if the user has registered a non-empty token.
    pub fn push_target(&self) -> Option<PushTarget> {
        let token = self.expo_push_token.as_deref()?.trim();
        if token.is_empty() {
            return None;
        }

        Some(PushTarget {
            token: token.to_string(),
            preferences: self.notification_preferences.clone().unwrap_or_default(),
        })
    }
}

/// What the dispatcher needs from a profile, fetched in one read.
#[derive(Debug, Clone, PartialEq)]
pub struct PushTarget {
    pub token: String,
    pub preferences: DeliveryPreferences,
}
