// src/state.rs
use std::sync::Arc;

use crate::{
    config::{AppConfig, GatewayMode, StoreBackend},
    errors::NotifyResult,
    services::{
        composer_service::{DispatchClient, HttpDispatchClient, NotificationComposer},
        dispatch_service::Dispatcher,
        history_service::{HistoryStore, InMemoryHistoryStore, RedisHistoryStore},
        messaging_service::{ExpoPushGateway, LoggingPushGateway, PushGateway},
        profile_service::{InMemoryProfileStore, ProfileStore, RedisProfileStore},
        template_service::TemplateCatalog,
    },
};

pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub composer: Arc<NotificationComposer>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> NotifyResult<Self> {
        let (profiles, history) = match config.store_backend {
            StoreBackend::Redis => {
                let profiles: Arc<dyn ProfileStore> =
                    Arc::new(RedisProfileStore::new(&config.redis_url)?);
                let history: Arc<dyn HistoryStore> =
                    Arc::new(RedisHistoryStore::new(&config.redis_url)?);
                (profiles, history)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory stores, data is lost on restart");
                let profiles: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
                let history: Arc<dyn HistoryStore> = Arc::new(InMemoryHistoryStore::new());
                (profiles, history)
            }
        };

        let gateway: Arc<dyn PushGateway> = match config.push_gateway {
            GatewayMode::Expo => Arc::new(ExpoPushGateway::new(config.expo())?),
            GatewayMode::Log => Arc::new(LoggingPushGateway),
        };

        let catalog = Arc::new(
            TemplateCatalog::builtin(config.fallback_language.clone())?
                .with_secondary_language(config.secondary_language.clone()),
        );

        let remote: Option<Arc<dyn DispatchClient>> = match &config.dispatch_url {
            Some(url) => {
                tracing::info!(url = %url, "Composer forwards to remote dispatcher");
                let client: Arc<dyn DispatchClient> =
                    Arc::new(HttpDispatchClient::new(url.clone(), config.push_timeout())?);
                Some(client)
            }
            None => None,
        };

        let mut state = Self::from_parts(config, profiles, gateway, history, catalog.clone());
        if let Some(client) = remote {
            state.composer = Arc::new(NotificationComposer::new(
                state.profiles.clone(),
                catalog,
                client,
            ));
        }
        Ok(state)
    }

    pub fn from_parts(
        config: AppConfig,
        profiles: Arc<dyn ProfileStore>,
        gateway: Arc<dyn PushGateway>,
        history: Arc<dyn HistoryStore>,
        catalog: Arc<TemplateCatalog>,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(profiles.clone(), gateway, history));
        let composer = Arc::new(NotificationComposer::new(
            profiles.clone(),
            catalog,
            dispatcher.clone(),
        ));

        Self {
            profiles,
            dispatcher,
            composer,
            config,
        }
    }
}
