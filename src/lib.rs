pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// Re-export commonly used types
pub use errors::{NotifyError, NotifyResult};
pub use models::{DispatchOutcome, NotificationCategory, RenderedNotification};
pub use services::{composer_service::NotificationComposer, dispatch_service::Dispatcher};

use handlers::notification_handler;
use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(notification_handler::health))
        .route("/send-notification", post(notification_handler::send_notification))
        .route("/push-tokens", post(notification_handler::register_push_token))
        .route("/ride-events", post(notification_handler::ride_event))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
