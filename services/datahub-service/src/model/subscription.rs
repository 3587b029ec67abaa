//! Stored subscription records and the projection returned to callers.
use super::TopicKey;
use datahub_common::{Subscription, SubscriptionState, USER_SUBSCRIPTION_TYPE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    pub topic: TopicKey,
    pub sub_id: String,
}

impl SubscriptionKey {
    pub fn new(topic: TopicKey, sub_id: impl Into<String>) -> Self {
        Self {
            topic,
            sub_id: sub_id.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub key: SubscriptionKey,
    pub comment: String,
    pub owner: String,
    pub state: SubscriptionState,
    pub sub_type: i32,
    pub create_time: i64,
    pub last_modify_time: i64,
}

impl SubscriptionRecord {
    pub fn new(key: SubscriptionKey, comment: String, owner: String, now: i64) -> Self {
        Self {
            key,
            comment,
            owner,
            state: SubscriptionState::Active,
            sub_type: USER_SUBSCRIPTION_TYPE,
            create_time: now,
            last_modify_time: now,
        }
    }

    /// Render the record as seen by `caller`; `IsOwner` depends on who asks.
    pub fn view_for(&self, caller: &str) -> Subscription {
        Subscription {
            sub_id: self.key.sub_id.clone(),
            topic_name: self.key.topic.topic.clone(),
            comment: self.comment.clone(),
            create_time: self.create_time,
            last_modify_time: self.last_modify_time,
            is_owner: self.owner == caller,
            state: self.state,
            sub_type: self.sub_type,
        }
    }

    /// Case-sensitive substring match on the id or the comment.
    pub fn matches(&self, search: &str) -> bool {
        search.is_empty() || self.key.sub_id.contains(search) || self.comment.contains(search)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubscriptionPatch {
    pub comment: Option<String>,
    pub state: Option<SubscriptionState>,
}

/// Ids are the creation time in milliseconds followed by six random hex digits.
pub fn new_sub_id(now_millis: i64) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{now_millis}{}", &suffix[..6])
}
