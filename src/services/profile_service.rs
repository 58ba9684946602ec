// src/services/profile_service.rs
use async_trait::async_trait;
use redis::Client;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{
    errors::{NotifyError, NotifyResult},
    models::profile::{PushTarget, UserProfile},
};

/// Read side of the user profile table, plus device registration.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Push token and preferences in a single read. `None` when the user
    /// has no profile or no usable token.
    async fn push_target(&self, user_id: &str) -> NotifyResult<Option<PushTarget>>;

    async fn language(&self, user_id: &str) -> NotifyResult<Option<String>>;

    /// Creates the profile if needed and overwrites the stored token.
    async fn register_push_token(&self, user_id: &str, token: &str) -> NotifyResult<()>;
}

pub struct ProfileKeys;

impl ProfileKeys {
    pub fn by_id(user_id: &str) -> String {
        format!("profile:id:{}", user_id)
    }
}

fn encode_profile(profile: &UserProfile) -> NotifyResult<String> {
    serde_json::to_string(profile).map_err(|e| NotifyError::RedisSerialization(e.to_string()))
}

fn decode_profile(json: &str) -> NotifyResult<UserProfile> {
    serde_json::from_str(json).map_err(|e| NotifyError::RedisSerialization(e.to_string()))
}

// Redis-backed profile store. Each profile is a JSON document.
pub struct RedisProfileStore {
    client: Client,
}

impl RedisProfileStore {
    pub fn new(redis_url: &str) -> NotifyResult<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self { client })
    }

    async fn get_connection(&self) -> NotifyResult<redis::aio::Connection> {
        self.client
            .get_async_connection()
            .await
            .map_err(|e| NotifyError::RedisConnection(e.to_string()))
    }

    async fn load(&self, user_id: &str) -> NotifyResult<Option<UserProfile>> {
        let mut conn = self.get_connection().await?;

        let data: Option<String> = redis::cmd("GET")
            .arg(ProfileKeys::by_id(user_id))
            .query_async(&mut conn)
            .await?;

        data.as_deref().map(decode_profile).transpose()
    }

    pub async fn save(&self, profile: &UserProfile) -> NotifyResult<()> {
        let json = encode_profile(profile)?;
        let mut conn = self.get_connection().await?;

        let _: () = redis::cmd("SET")
            .arg(ProfileKeys::by_id(&profile.id))
            .arg(json)
            .query_async(&mut conn)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ProfileStore for RedisProfileStore {
    async fn push_target(&self, user_id: &str) -> NotifyResult<Option<PushTarget>> {
        Ok(self.load(user_id).await?.and_then(|p| p.push_target()))
    }

    async fn language(&self, user_id: &str) -> NotifyResult<Option<String>> {
        Ok(self.load(user_id).await?.and_then(|p| p.language))
    }

    async fn register_push_token(&self, user_id: &str, token: &str) -> NotifyResult<()> {
        let profile = self
            .load(user_id)
            .await?
            .unwrap_or_else(|| UserProfile::new(user_id))
            .with_push_token(token);

        self.save(&profile).await?;
        tracing::info!(user_id, "Push token registered");
        Ok(())
    }
}

// In-memory store for development and tests
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: UserProfile) {
        self.profiles.write().await.insert(profile.id.clone(), profile);
    }

    pub async fn get(&self, user_id: &str) -> Option<UserProfile> {
        self.profiles.read().await.get(user_id).cloned()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn push_target(&self, user_id: &str) -> NotifyResult<Option<PushTarget>> {
        Ok(self
            .profiles
            .read()
            .await
            .get(user_id)
            .and_then(UserProfile::push_target))
    }

    async fn language(&self, user_id: &str) -> NotifyResult<Option<String>> {
        Ok(self
            .profiles
            .read()
            .await
            .get(user_id)
            .and_then(|p| p.language.clone()))
    }

    async fn register_push_token(&self, user_id: &str, token: &str) -> NotifyResult<()> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile::new(user_id));
        profile.expo_push_token = Some(token.to_string());
        Ok(())
    }
}
