// src/services/history_service.rs
use async_trait::async_trait;
use redis::Client;
use tokio::sync::RwLock;

use crate::{
    errors::{NotifyError, NotifyResult},
    models::notification::NotificationHistoryRecord,
};

/// Append-only notification inbox. Marking rows read belongs to the inbox UI.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, record: &NotificationHistoryRecord) -> NotifyResult<()>;
}

pub struct HistoryKeys;

impl HistoryKeys {
    pub fn for_user(user_id: &str) -> String {
        format!("notifications:user:{}", user_id)
    }
}

fn encode_record(record: &NotificationHistoryRecord) -> NotifyResult<String> {
    serde_json::to_string(record).map_err(|e| NotifyError::RedisSerialization(e.to_string()))
}

pub struct RedisHistoryStore {
    client: Client,
}

impl RedisHistoryStore {
    pub fn new(redis_url: &str) -> NotifyResult<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn append(&self, record: &NotificationHistoryRecord) -> NotifyResult<()> {
        let json = encode_record(record)?;

        let mut conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| NotifyError::RedisConnection(e.to_string()))?;

        let _: () = redis::cmd("RPUSH")
            .arg(HistoryKeys::for_user(&record.user_id))
            .arg(json)
            .query_async(&mut conn)
            .await?;

        tracing::debug!(user_id = %record.user_id, id = %record.id, "History row appended");
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: RwLock<Vec<NotificationHistoryRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<NotificationHistoryRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(&self, record: &NotificationHistoryRecord) -> NotifyResult<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }
}
