//! Async client SDK for DataHub projects, topics and subscriptions.
//!
//! ```rust,no_run
//! use datahub_client::{ClientConfig, DatahubClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("access_id", "access_key", "http://127.0.0.1:8080");
//! let client = DatahubClient::new(&config)?;
//! let created = client.create_subscription("project", "topic", "comment").await?;
//! let subscription = client
//!     .get_subscription("project", "topic", &created.sub_id)
//!     .await?;
//! assert_eq!(subscription.comment, "comment");
//! # Ok(())
//! # }
//! ```
pub mod client;
pub mod config;
pub mod error;

pub use client::DatahubClient;
pub use config::ClientConfig;
pub use datahub_common::{
    CreateSubscriptionResult, Field, FieldType, ListProjectResult, ListSubscriptionResult,
    ListTopicResult, Project, RecordSchema, RecordType, Subscription, SubscriptionState, Topic,
};
pub use error::{DatahubError, Result, ServiceError};
