//! In-memory implementation of the DataHub store.
//!
//! # Purpose
//! Backs the service with `HashMap`s guarded by `tokio::sync::RwLock`. It exists for local
//! development and for test suites that need a hermetic endpoint; nothing is persisted.
//!
//! # Consistency
//! - Mutations hold write locks; reads hold read locks.
//! - Locks are always taken in the order projects, topics, subscriptions, so parent checks and
//!   the mutation they guard happen under one consistent view without risking deadlock.
//! - Deletes never cascade. A project with topics, or a topic with subscriptions, reports
//!   `StoreError::NotEmpty` and callers must clean children first.
//!
//! # Metrics
//! Resource gauges and per-operation counters are updated on every successful mutation.
use super::{DatahubStore, Page, ResourceKind, StoreError, StoreResult};
use crate::model::{SubscriptionKey, SubscriptionPatch, SubscriptionRecord, TopicKey};
use async_trait::async_trait;
use datahub_common::{Project, Topic};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type SubscriptionMap = HashMap<TopicKey, HashMap<String, SubscriptionRecord>>;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    /// Projects keyed by name.
    projects: Arc<RwLock<HashMap<String, Project>>>,
    /// Topics keyed by `(project, topic)`.
    topics: Arc<RwLock<HashMap<TopicKey, Topic>>>,
    /// Subscriptions grouped by topic, then keyed by sub id.
    subscriptions: Arc<RwLock<SubscriptionMap>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(kind: ResourceKind, name: &str) -> StoreError {
    StoreError::NotFound(kind, name.to_string())
}

fn require_project(projects: &HashMap<String, Project>, name: &str) -> StoreResult<()> {
    if projects.contains_key(name) {
        Ok(())
    } else {
        Err(not_found(ResourceKind::Project, name))
    }
}

fn require_topic(
    projects: &HashMap<String, Project>,
    topics: &HashMap<TopicKey, Topic>,
    key: &TopicKey,
) -> StoreResult<()> {
    require_project(projects, &key.project)?;
    if topics.contains_key(key) {
        Ok(())
    } else {
        Err(not_found(ResourceKind::Topic, &key.topic))
    }
}

fn subscription_count(subscriptions: &SubscriptionMap) -> usize {
    subscriptions.values().map(HashMap::len).sum()
}

#[async_trait]
impl DatahubStore for InMemoryStore {
    async fn list_projects(&self) -> StoreResult<Vec<String>> {
        let projects = self.projects.read().await;
        let mut names: Vec<String> = projects.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_project(&self, project: Project) -> StoreResult<Project> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(&project.project_name) {
            return Err(StoreError::Conflict(
                ResourceKind::Project,
                project.project_name,
            ));
        }
        projects.insert(project.project_name.clone(), project.clone());
        metrics::counter!("datahub_project_changes_total", "op" => "created").increment(1);
        metrics::gauge!("datahub_projects_total").set(projects.len() as f64);
        Ok(project)
    }

    async fn get_project(&self, name: &str) -> StoreResult<Project> {
        let projects = self.projects.read().await;
        projects
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(ResourceKind::Project, name))
    }

    async fn update_project(
        &self,
        name: &str,
        comment: String,
        now: i64,
    ) -> StoreResult<Project> {
        let mut projects = self.projects.write().await;
        let project = projects
            .get_mut(name)
            .ok_or_else(|| not_found(ResourceKind::Project, name))?;
        project.comment = comment;
        project.last_modify_time = now;
        metrics::counter!("datahub_project_changes_total", "op" => "updated").increment(1);
        Ok(project.clone())
    }

    async fn delete_project(&self, name: &str) -> StoreResult<()> {
        let mut projects = self.projects.write().await;
        require_project(&projects, name)?;
        let topics = self.topics.read().await;
        if topics.keys().any(|key| key.project == name) {
            return Err(StoreError::NotEmpty(ResourceKind::Project, name.to_string()));
        }
        projects.remove(name);
        metrics::counter!("datahub_project_changes_total", "op" => "deleted").increment(1);
        metrics::gauge!("datahub_projects_total").set(projects.len() as f64);
        Ok(())
    }

    async fn list_topics(&self, project: &str) -> StoreResult<Vec<String>> {
        let projects = self.projects.read().await;
        require_project(&projects, project)?;
        let topics = self.topics.read().await;
        let mut names: Vec<String> = topics
            .keys()
            .filter(|key| key.project == project)
            .map(|key| key.topic.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn create_topic(&self, topic: Topic) -> StoreResult<Topic> {
        let projects = self.projects.read().await;
        require_project(&projects, &topic.project_name)?;
        let mut topics = self.topics.write().await;
        let key = TopicKey::new(topic.project_name.clone(), topic.topic_name.clone());
        if topics.contains_key(&key) {
            return Err(StoreError::Conflict(ResourceKind::Topic, key.topic));
        }
        topics.insert(key, topic.clone());
        metrics::counter!("datahub_topic_changes_total", "op" => "created").increment(1);
        metrics::gauge!("datahub_topics_total").set(topics.len() as f64);
        Ok(topic)
    }

    async fn get_topic(&self, key: &TopicKey) -> StoreResult<Topic> {
        let projects = self.projects.read().await;
        require_project(&projects, &key.project)?;
        let topics = self.topics.read().await;
        topics
            .get(key)
            .cloned()
            .ok_or_else(|| not_found(ResourceKind::Topic, &key.topic))
    }

    async fn delete_topic(&self, key: &TopicKey) -> StoreResult<()> {
        let projects = self.projects.read().await;
        let mut topics = self.topics.write().await;
        require_topic(&projects, &topics, key)?;
        let subscriptions = self.subscriptions.read().await;
        if subscriptions.get(key).is_some_and(|subs| !subs.is_empty()) {
            return Err(StoreError::NotEmpty(ResourceKind::Topic, key.topic.clone()));
        }
        topics.remove(key);
        metrics::counter!("datahub_topic_changes_total", "op" => "deleted").increment(1);
        metrics::gauge!("datahub_topics_total").set(topics.len() as f64);
        Ok(())
    }

    async fn create_subscription(
        &self,
        record: SubscriptionRecord,
    ) -> StoreResult<SubscriptionRecord> {
        let projects = self.projects.read().await;
        let topics = self.topics.read().await;
        require_topic(&projects, &topics, &record.key.topic)?;
        let mut subscriptions = self.subscriptions.write().await;
        let subs = subscriptions.entry(record.key.topic.clone()).or_default();
        if subs.contains_key(&record.key.sub_id) {
            return Err(StoreError::Conflict(
                ResourceKind::Subscription,
                record.key.sub_id,
            ));
        }
        subs.insert(record.key.sub_id.clone(), record.clone());
        metrics::counter!("datahub_subscription_changes_total", "op" => "created").increment(1);
        metrics::gauge!("datahub_subscriptions_total")
            .set(subscription_count(&subscriptions) as f64);
        Ok(record)
    }

    async fn get_subscription(&self, key: &SubscriptionKey) -> StoreResult<SubscriptionRecord> {
        let projects = self.projects.read().await;
        let topics = self.topics.read().await;
        require_topic(&projects, &topics, &key.topic)?;
        let subscriptions = self.subscriptions.read().await;
        subscriptions
            .get(&key.topic)
            .and_then(|subs| subs.get(&key.sub_id))
            .cloned()
            .ok_or_else(|| not_found(ResourceKind::Subscription, &key.sub_id))
    }

    async fn patch_subscription(
        &self,
        key: &SubscriptionKey,
        patch: SubscriptionPatch,
        now: i64,
    ) -> StoreResult<SubscriptionRecord> {
        let projects = self.projects.read().await;
        let topics = self.topics.read().await;
        require_topic(&projects, &topics, &key.topic)?;
        let mut subscriptions = self.subscriptions.write().await;
        let record = subscriptions
            .get_mut(&key.topic)
            .and_then(|subs| subs.get_mut(&key.sub_id))
            .ok_or_else(|| not_found(ResourceKind::Subscription, &key.sub_id))?;
        if let Some(comment) = patch.comment {
            record.comment = comment;
        }
        if let Some(state) = patch.state {
            record.state = state;
        }
        record.last_modify_time = now;
        metrics::counter!("datahub_subscription_changes_total", "op" => "updated").increment(1);
        Ok(record.clone())
    }

    async fn delete_subscription(&self, key: &SubscriptionKey) -> StoreResult<()> {
        let projects = self.projects.read().await;
        let topics = self.topics.read().await;
        require_topic(&projects, &topics, &key.topic)?;
        let mut subscriptions = self.subscriptions.write().await;
        let subs = subscriptions
            .get_mut(&key.topic)
            .ok_or_else(|| not_found(ResourceKind::Subscription, &key.sub_id))?;
        if subs.remove(&key.sub_id).is_none() {
            return Err(not_found(ResourceKind::Subscription, &key.sub_id));
        }
        if subs.is_empty() {
            subscriptions.remove(&key.topic);
        }
        metrics::counter!("datahub_subscription_changes_total", "op" => "deleted").increment(1);
        metrics::gauge!("datahub_subscriptions_total")
            .set(subscription_count(&subscriptions) as f64);
        Ok(())
    }

    async fn list_subscriptions(
        &self,
        topic: &TopicKey,
        search: &str,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Page<SubscriptionRecord>> {
        let projects = self.projects.read().await;
        let topics = self.topics.read().await;
        require_topic(&projects, &topics, topic)?;
        let subscriptions = self.subscriptions.read().await;
        let mut matches: Vec<&SubscriptionRecord> = subscriptions
            .get(topic)
            .map(|subs| subs.values().filter(|record| record.matches(search)).collect())
            .unwrap_or_default();
        matches.sort_by(|a, b| {
            a.create_time
                .cmp(&b.create_time)
                .then_with(|| a.key.sub_id.cmp(&b.key.sub_id))
        });
        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(Page { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datahub_common::{RecordType, SubscriptionState};

    fn project(name: &str) -> Project {
        Project {
            project_name: name.to_string(),
            comment: "test project".to_string(),
            create_time: 100,
            last_modify_time: 100,
        }
    }

    fn topic(project: &str, name: &str) -> Topic {
        Topic {
            project_name: project.to_string(),
            topic_name: name.to_string(),
            shard_count: 3,
            lifecycle: 7,
            record_type: RecordType::Blob,
            record_schema: None,
            comment: String::new(),
            create_time: 100,
            last_modify_time: 100,
        }
    }

    fn record(key: &TopicKey, sub_id: &str, comment: &str, at: i64) -> SubscriptionRecord {
        SubscriptionRecord::new(
            SubscriptionKey::new(key.clone(), sub_id),
            comment.to_string(),
            "owner".to_string(),
            at,
        )
    }

    async fn store_with_topic() -> (InMemoryStore, TopicKey) {
        let store = InMemoryStore::new();
        store.create_project(project("proj")).await.expect("project");
        store.create_topic(topic("proj", "t1")).await.expect("topic");
        (store, TopicKey::new("proj", "t1"))
    }

    #[tokio::test]
    async fn project_conflict_update_and_listing() {
        let store = InMemoryStore::new();
        store.create_project(project("beta")).await.expect("beta");
        store.create_project(project("alpha")).await.expect("alpha");
        let err = store
            .create_project(project("alpha"))
            .await
            .expect_err("conflict");
        assert!(matches!(err, StoreError::Conflict(ResourceKind::Project, _)));

        let updated = store
            .update_project("alpha", "renamed".to_string(), 200)
            .await
            .expect("update");
        assert_eq!(updated.comment, "renamed");
        assert_eq!(updated.create_time, 100);
        assert_eq!(updated.last_modify_time, 200);

        assert_eq!(
            store.list_projects().await.expect("list"),
            vec!["alpha".to_string(), "beta".to_string()]
        );
    }

    #[tokio::test]
    async fn deletes_do_not_cascade() {
        let (store, key) = store_with_topic().await;
        store
            .create_subscription(record(&key, "s1", "", 1))
            .await
            .expect("sub");

        let err = store.delete_project("proj").await.expect_err("has topics");
        assert!(matches!(err, StoreError::NotEmpty(ResourceKind::Project, _)));
        let err = store.delete_topic(&key).await.expect_err("has subs");
        assert!(matches!(err, StoreError::NotEmpty(ResourceKind::Topic, _)));

        store
            .delete_subscription(&SubscriptionKey::new(key.clone(), "s1"))
            .await
            .expect("delete sub");
        store.delete_topic(&key).await.expect("delete topic");
        store.delete_project("proj").await.expect("delete project");
        assert!(store.list_projects().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn missing_parents_are_reported_first() {
        let store = InMemoryStore::new();
        let key = TopicKey::new("nope", "t1");
        let err = store
            .create_subscription(record(&key, "s1", "", 1))
            .await
            .expect_err("no project");
        assert!(matches!(err, StoreError::NotFound(ResourceKind::Project, _)));

        store.create_project(project("nope")).await.expect("project");
        let err = store
            .get_subscription(&SubscriptionKey::new(key.clone(), "s1"))
            .await
            .expect_err("no topic");
        assert!(matches!(err, StoreError::NotFound(ResourceKind::Topic, _)));

        store.create_topic(topic("nope", "t1")).await.expect("topic");
        let err = store
            .delete_subscription(&SubscriptionKey::new(key, "s1"))
            .await
            .expect_err("no sub");
        assert!(matches!(
            err,
            StoreError::NotFound(ResourceKind::Subscription, _)
        ));
    }

    #[tokio::test]
    async fn patch_touches_only_requested_fields() {
        let (store, key) = store_with_topic().await;
        let sub_key = SubscriptionKey::new(key.clone(), "s1");
        store
            .create_subscription(record(&key, "s1", "before", 10))
            .await
            .expect("sub");

        let patched = store
            .patch_subscription(
                &sub_key,
                SubscriptionPatch {
                    state: Some(SubscriptionState::Inactive),
                    ..Default::default()
                },
                20,
            )
            .await
            .expect("patch");
        assert_eq!(patched.comment, "before");
        assert_eq!(patched.state, SubscriptionState::Inactive);
        assert_eq!(patched.create_time, 10);
        assert_eq!(patched.last_modify_time, 20);
    }

    #[tokio::test]
    async fn listing_filters_orders_and_pages() {
        let (store, key) = store_with_topic().await;
        for (id, comment, at) in [
            ("s3", "keep", 5),
            ("s1", "keep", 5),
            ("s2", "drop", 1),
            ("s4", "keep", 9),
        ] {
            store
                .create_subscription(record(&key, id, comment, at))
                .await
                .expect("sub");
        }

        let all = store
            .list_subscriptions(&key, "", 0, 10)
            .await
            .expect("all");
        let ids: Vec<&str> = all.items.iter().map(|r| r.key.sub_id.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s1", "s3", "s4"]);
        assert_eq!(all.total, 4);

        let page = store
            .list_subscriptions(&key, "keep", 1, 1)
            .await
            .expect("page");
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].key.sub_id, "s3");

        let past_end = store
            .list_subscriptions(&key, "keep", 10, 5)
            .await
            .expect("past end");
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 3);
    }
}
