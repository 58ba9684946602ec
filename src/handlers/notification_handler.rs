// src/handlers/notification_handler.rs
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use std::sync::Arc;

use crate::{
    errors::{NotifyError, NotifyResult},
    models::notification::{DeliveryRequest, DispatchOutcome},
    services::composer_service::RecipientOutcome,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub success: bool,
    pub result: DispatchOutcome,
}

/// Parses the raw body so every malformed request gets the same 400 shape.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> NotifyResult<T> {
    serde_json::from_slice(body).map_err(|e| NotifyError::JsonParsing(e.to_string()))
}

/// `POST /send-notification`
///
/// 200 for delivered, suppressed and no-destination outcomes; 500 when the
/// attempt failed. Malformed bodies are rejected with 400 before any lookup.
pub async fn send_notification(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> NotifyResult<Response> {
    let request: DeliveryRequest = parse_body(&body)?;
    let notification = request.into_rendered()?;

    let outcome = state.dispatcher.dispatch(notification).await;
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let response = DispatchResponse {
        success: outcome.is_success(),
        result: outcome,
    };
    Ok((status, Json(response)).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushTokenRegistration {
    pub user_id: Option<String>,
    pub token: Option<String>,
}

/// `POST /push-tokens`: device registration, overwrites the stored token.
pub async fn register_push_token(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> NotifyResult<Json<serde_json::Value>> {
    let registration: PushTokenRegistration = parse_body(&body)?;
    let user_id = registration
        .user_id
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| NotifyError::missing_field("userId"))?;
    let token = registration
        .token
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| NotifyError::missing_field("token"))?;

    state.profiles.register_push_token(&user_id, &token).await?;
    Ok(Json(json!({ "success": true })))
}

/// Domain actions that notify one or more users.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RideEvent {
    JoinRequest {
        owner_id: String,
        requester_name: String,
        ride_id: String,
        ride_title: String,
    },
    Approval {
        user_id: String,
        ride_id: String,
        ride_title: String,
    },
    Rejection {
        user_id: String,
        ride_id: String,
        ride_title: String,
    },
    RideUpdate {
        participant_ids: Vec<String>,
        ride_id: String,
        ride_title: String,
        change: String,
    },
    Cancellation {
        participant_ids: Vec<String>,
        ride_id: String,
        ride_title: String,
    },
}

#[derive(Debug, Serialize)]
pub struct RideEventResponse {
    pub success: bool,
    pub outcomes: Vec<RecipientOutcome>,
}

/// `POST /ride-events`: compose and dispatch for a domain action.
///
/// Always 200 once the body parses; per-recipient failures are reported in
/// `outcomes` and never fail the triggering action.
pub async fn ride_event(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> NotifyResult<Json<RideEventResponse>> {
    let event: RideEvent = parse_body(&body)?;
    let composer = &state.composer;

    let single = |recipient_id: &str, outcome: DispatchOutcome| {
        vec![RecipientOutcome {
            recipient_id: recipient_id.to_string(),
            outcome,
        }]
    };

    let outcomes = match event {
        RideEvent::JoinRequest {
            owner_id,
            requester_name,
            ride_id,
            ride_title,
        } => {
            let outcome = composer
                .notify_owner_of_join_request(&owner_id, &requester_name, &ride_id, &ride_title)
                .await;
            single(&owner_id, outcome)
        }
        RideEvent::Approval {
            user_id,
            ride_id,
            ride_title,
        } => {
            let outcome = composer
                .notify_user_of_approval(&user_id, &ride_title, &ride_id)
                .await;
            single(&user_id, outcome)
        }
        RideEvent::Rejection {
            user_id,
            ride_id,
            ride_title,
        } => {
            let outcome = composer
                .notify_user_of_rejection(&user_id, &ride_title, &ride_id)
                .await;
            single(&user_id, outcome)
        }
        RideEvent::RideUpdate {
            participant_ids,
            ride_id,
            ride_title,
            change,
        } => {
            composer
                .notify_participants_of_ride_update(&participant_ids, &ride_title, &ride_id, &change)
                .await
        }
        RideEvent::Cancellation {
            participant_ids,
            ride_id,
            ride_title,
        } => {
            composer
                .notify_participants_of_cancellation(&participant_ids, &ride_title, &ride_id)
                .await
        }
    };

    Ok(Json(RideEventResponse {
        success: true,
        outcomes,
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
