//! Service-side data model.
//!
//! # Purpose
//! Keys and stored records for topics and subscriptions. Wire payloads live in
//! `datahub_common`; the records here carry what the wire types derive from
//! (such as the subscription's owning access id).
mod subscription;
mod topic;

pub use subscription::{SubscriptionKey, SubscriptionPatch, SubscriptionRecord, new_sub_id};
pub use topic::TopicKey;
