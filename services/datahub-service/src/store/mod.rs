//! Storage abstraction for projects, topics and subscriptions.
//!
//! Handlers talk to `DatahubStore`; the only backend today is the in-memory
//! store, which keeps every integrity rule (parent existence, non-empty
//! containers) inside the store so handlers stay thin.
use crate::model::{SubscriptionKey, SubscriptionPatch, SubscriptionRecord, TopicKey};
use async_trait::async_trait;
use datahub_common::{Project, Topic};
use std::fmt;
use thiserror::Error;

pub mod memory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Project,
    Topic,
    Subscription,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Project => f.write_str("project"),
            ResourceKind::Topic => f.write_str("topic"),
            ResourceKind::Subscription => f.write_str("subscription"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} {1} does not exist")]
    NotFound(ResourceKind, String),
    #[error("{0} {1} already exists")]
    Conflict(ResourceKind, String),
    #[error("{0} {1} is not empty")]
    NotEmpty(ResourceKind, String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One page of a filtered listing plus the number of matches overall.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[async_trait]
pub trait DatahubStore: Send + Sync {
    async fn list_projects(&self) -> StoreResult<Vec<String>>;
    async fn create_project(&self, project: Project) -> StoreResult<Project>;
    async fn get_project(&self, name: &str) -> StoreResult<Project>;
    async fn update_project(&self, name: &str, comment: String, now: i64)
    -> StoreResult<Project>;
    async fn delete_project(&self, name: &str) -> StoreResult<()>;

    async fn list_topics(&self, project: &str) -> StoreResult<Vec<String>>;
    async fn create_topic(&self, topic: Topic) -> StoreResult<Topic>;
    async fn get_topic(&self, key: &TopicKey) -> StoreResult<Topic>;
    async fn delete_topic(&self, key: &TopicKey) -> StoreResult<()>;

    async fn create_subscription(
        &self,
        record: SubscriptionRecord,
    ) -> StoreResult<SubscriptionRecord>;
    async fn get_subscription(&self, key: &SubscriptionKey) -> StoreResult<SubscriptionRecord>;
    async fn patch_subscription(
        &self,
        key: &SubscriptionKey,
        patch: SubscriptionPatch,
        now: i64,
    ) -> StoreResult<SubscriptionRecord>;
    async fn delete_subscription(&self, key: &SubscriptionKey) -> StoreResult<()>;
    /// Matches ordered by creation time then id; `offset`/`limit` select the page.
    async fn list_subscriptions(
        &self,
        topic: &TopicKey,
        search: &str,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Page<SubscriptionRecord>>;
}
