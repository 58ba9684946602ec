// src/services/dispatch_service.rs
use std::sync::Arc;

use crate::{
    models::notification::{
        ChannelGroup, DispatchOutcome, NotificationHistoryRecord, PushMessage, RenderedNotification,
    },
    services::{
        history_service::HistoryStore, messaging_service::PushGateway,
        profile_service::ProfileStore,
    },
};

/// Gates, routes, delivers and records one rendered notification.
///
/// Every call is independent: one profile read, at most one gateway call and
/// at most one history row. Nothing is retried.
pub struct Dispatcher {
    profiles: Arc<dyn ProfileStore>,
    gateway: Arc<dyn PushGateway>,
    history: Arc<dyn HistoryStore>,
}

impl Dispatcher {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        gateway: Arc<dyn PushGateway>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            profiles,
            gateway,
            history,
        }
    }

    pub async fn dispatch(&self, notification: RenderedNotification) -> DispatchOutcome {
        let user_id = notification.recipient_id.as_str();
        tracing::info!(user_id, category = %notification.category, "Processing notification");

        let target = match self.profiles.push_target(user_id).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                tracing::info!(user_id, "No push token registered, skipping");
                return DispatchOutcome::NoDestination;
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "Profile lookup failed");
                return DispatchOutcome::failed(e.to_string());
            }
        };

        let channel = ChannelGroup::for_category(&notification.category);

        if !target.preferences.is_enabled(channel) {
            tracing::info!(user_id, %channel, "Notification suppressed by user preference");
            return DispatchOutcome::Suppressed { channel };
        }

        let message = PushMessage::new(&target.token, &notification, channel);
        let outcome = match self.gateway.send(&message).await {
            Ok(ticket) => DispatchOutcome::Delivered { ticket },
            Err(e) => {
                tracing::error!(user_id, %channel, error = %e, "Push gateway call failed");
                DispatchOutcome::failed(e.to_string())
            }
        };

        // The attempt is recorded whether or not the gateway accepted it
        let record = NotificationHistoryRecord::for_attempt(&notification);
        if let Err(e) = self.history.append(&record).await {
            tracing::error!(user_id, error = %e, "Failed to record notification history");
        }

        outcome
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    use crate::{
        errors::{NotifyError, NotifyResult},
        models::{DeliveryPreferences, NotificationCategory, Payload, PushTarget, UserProfile},
        services::{history_service::InMemoryHistoryStore, profile_service::InMemoryProfileStore},
    };

    /// Gateway fake that records every message and can be told to fail.
    #[derive(Default)]
    pub(crate) struct RecordingGateway {
        pub sent: Mutex<Vec<PushMessage>>,
        pub fail_for: Option<String>,
    }

    impl RecordingGateway {
        pub fn failing_for(token: &str) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_for: Some(token.to_string()),
            }
        }

        pub fn sent(&self) -> Vec<PushMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PushGateway for RecordingGateway {
        async fn send(&self, message: &PushMessage) -> NotifyResult<serde_json::Value> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail_for.as_deref() == Some(message.to.as_str()) {
                return Err(NotifyError::PushDelivery("503: upstream down".to_string()));
            }
            Ok(json!({ "data": { "status": "ok", "id": "ticket" } }))
        }
    }

    struct BrokenProfileStore;

    #[async_trait]
    impl ProfileStore for BrokenProfileStore {
        async fn push_target(&self, _user_id: &str) -> NotifyResult<Option<PushTarget>> {
            Err(NotifyError::RedisConnection("connection refused".to_string()))
        }

        async fn language(&self, _user_id: &str) -> NotifyResult<Option<String>> {
            Err(NotifyError::RedisConnection("connection refused".to_string()))
        }

        async fn register_push_token(&self, _user_id: &str, _token: &str) -> NotifyResult<()> {
            Err(NotifyError::RedisConnection("connection refused".to_string()))
        }
    }

    struct BrokenHistoryStore;

    #[async_trait]
    impl HistoryStore for BrokenHistoryStore {
        async fn append(&self, _record: &NotificationHistoryRecord) -> NotifyResult<()> {
            Err(NotifyError::RedisQuery("READONLY".to_string()))
        }
    }

    fn rendered(user_id: &str, category: NotificationCategory) -> RenderedNotification {
        let mut payload = Payload::new();
        payload.insert("rideId".to_string(), json!("ride-1"));
        RenderedNotification {
            recipient_id: user_id.to_string(),
            title: "Ride updated".to_string(),
            body: "Departure moved to 09:00".to_string(),
            category,
            payload,
        }
    }

    struct Harness {
        profiles: Arc<InMemoryProfileStore>,
        gateway: Arc<RecordingGateway>,
        history: Arc<InMemoryHistoryStore>,
        dispatcher: Dispatcher,
    }

    fn harness(gateway: RecordingGateway) -> Harness {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let gateway = Arc::new(gateway);
        let history = Arc::new(InMemoryHistoryStore::new());
        let dispatcher = Dispatcher::new(profiles.clone(), gateway.clone(), history.clone());
        Harness {
            profiles,
            gateway,
            history,
            dispatcher,
        }
    }

    #[tokio::test]
    async fn test_delivers_and_records() {
        let h = harness(RecordingGateway::default());
        h.profiles
            .insert(UserProfile::new("usr-1").with_push_token("tok-1"))
            .await;

        let outcome = h
            .dispatcher
            .dispatch(rendered("usr-1", NotificationCategory::Approval))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Delivered { .. }));
        let sent = h.gateway.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "tok-1");
        assert_eq!(sent[0].channel_id, ChannelGroup::RequestsApprovals);
        assert_eq!(sent[0].data["rideId"], "ride-1");

        let records = h.history.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_id, "usr-1");
        assert_eq!(records[0].category, NotificationCategory::Approval);
        assert!(!records[0].read);
    }

    #[tokio::test]
    async fn test_no_token_is_a_silent_no_op() {
        let h = harness(RecordingGateway::default());
        h.profiles.insert(UserProfile::new("usr-1").with_language("en")).await;

        for user in ["usr-1", "missing-user"] {
            let outcome = h
                .dispatcher
                .dispatch(rendered(user, NotificationCategory::RideUpdate))
                .await;
            assert_eq!(outcome, DispatchOutcome::NoDestination);
        }

        assert!(h.gateway.sent().is_empty());
        assert!(h.history.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_group_suppresses() {
        let h = harness(RecordingGateway::default());
        h.profiles
            .insert(
                UserProfile::new("usr-1")
                    .with_push_token("tok-1")
                    .with_preferences(
                        DeliveryPreferences::default().with(ChannelGroup::RequestsApprovals, false),
                    ),
            )
            .await;

        let outcome = h
            .dispatcher
            .dispatch(rendered("usr-1", NotificationCategory::Decision))
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Suppressed {
                channel: ChannelGroup::RequestsApprovals
            }
        );
        assert!(h.gateway.sent().is_empty());
        assert!(h.history.records().await.is_empty());
    }

    #[tokio::test]
    async fn test_other_preference_values_deliver() {
        let h = harness(RecordingGateway::default());
        let prefs: DeliveryPreferences = serde_json::from_value(json!({
            "requests_approvals": false,
            "new_rides": true,
            "ride_updates": null
        }))
        .unwrap();
        h.profiles
            .insert(UserProfile::new("usr-1").with_push_token("tok-1").with_preferences(prefs))
            .await;
        h.profiles
            .insert(UserProfile::new("usr-2").with_push_token("tok-2"))
            .await;

        let new_ride = h
            .dispatcher
            .dispatch(rendered("usr-1", NotificationCategory::NewRide))
            .await;
        let ride_update = h
            .dispatcher
            .dispatch(rendered("usr-1", NotificationCategory::Other("ride_chat".to_string())))
            .await;
        let no_prefs = h
            .dispatcher
            .dispatch(rendered("usr-2", NotificationCategory::Request))
            .await;

        assert!(matches!(new_ride, DispatchOutcome::Delivered { .. }));
        assert!(matches!(ride_update, DispatchOutcome::Delivered { .. }));
        assert!(matches!(no_prefs, DispatchOutcome::Delivered { .. }));
        assert_eq!(h.gateway.sent().len(), 3);
        assert_eq!(h.history.records().await.len(), 3);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_still_recorded() {
        let h = harness(RecordingGateway::failing_for("tok-1"));
        h.profiles
            .insert(UserProfile::new("usr-1").with_push_token("tok-1"))
            .await;

        let outcome = h
            .dispatcher
            .dispatch(rendered("usr-1", NotificationCategory::Cancellation))
            .await;

        match outcome {
            DispatchOutcome::Failed { reason } => assert!(reason.contains("upstream down")),
            other => panic!("Expected Failed, got {:?}", other),
        }
        assert_eq!(h.gateway.sent()[0].channel_id, ChannelGroup::RideUpdates);
        assert_eq!(h.history.records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_history_failure_keeps_delivery_result() {
        let profiles = Arc::new(InMemoryProfileStore::new());
        profiles
            .insert(UserProfile::new("usr-1").with_push_token("tok-1"))
            .await;
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = Dispatcher::new(profiles, gateway.clone(), Arc::new(BrokenHistoryStore));

        let outcome = dispatcher
            .dispatch(rendered("usr-1", NotificationCategory::RideUpdate))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Delivered { .. }));
        assert_eq!(gateway.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_profile_store_failure_fails_without_side_effects() {
        let gateway = Arc::new(RecordingGateway::default());
        let history = Arc::new(InMemoryHistoryStore::new());
        let dispatcher = Dispatcher::new(Arc::new(BrokenProfileStore), gateway.clone(), history.clone());

        let outcome = dispatcher
            .dispatch(rendered("usr-1", NotificationCategory::RideUpdate))
            .await;

        assert!(!outcome.is_success());
        assert!(gateway.sent().is_empty());
        assert!(history.records().await.is_empty());
    }
}
