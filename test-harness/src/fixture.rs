//! Per-scenario project and topic with guaranteed teardown.
use crate::cleanup::drop_project;
use crate::naming;
use anyhow::{Context, Result};
use datahub_client::{DatahubClient, FieldType, RecordSchema};
use std::future::Future;

pub const SHARD_COUNT: u32 = 3;
pub const LIFE_CYCLE: u32 = 7;
pub const PROJECT_COMMENT: &str = "subscription suite project";
pub const TOPIC_COMMENT: &str = "subscription suite topic";

/// The five-field schema every suite topic is created with.
pub fn default_schema() -> Result<RecordSchema> {
    RecordSchema::from_lists(
        &[
            "bigint_field",
            "string_field",
            "double_field",
            "bool_field",
            "event_time1",
        ],
        &[
            FieldType::Bigint,
            FieldType::String,
            FieldType::Double,
            FieldType::Boolean,
            FieldType::Timestamp,
        ],
    )
    .context("build default schema")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFixture {
    pub project: String,
    pub topic: String,
}

impl TopicFixture {
    pub fn new(case: u32) -> Result<Self> {
        Ok(Self {
            project: naming::project_name(case)?,
            topic: naming::topic_name(case),
        })
    }
}

/// Create the project, tolerating one that already exists.
pub async fn ensure_project(client: &DatahubClient, project: &str) -> Result<()> {
    match client.create_project(project, PROJECT_COMMENT).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_resource_exist() => {
            tracing::debug!(%project, "project already exists");
            Ok(())
        }
        Err(err) => Err(err).with_context(|| format!("create project {project}")),
    }
}

/// Create the fixture topic with the default schema, tolerating one that already exists.
pub async fn ensure_topic(client: &DatahubClient, fixture: &TopicFixture) -> Result<()> {
    let schema = default_schema()?;
    match client
        .create_tuple_topic(
            &fixture.project,
            &fixture.topic,
            SHARD_COUNT,
            LIFE_CYCLE,
            &schema,
            TOPIC_COMMENT,
        )
        .await
    {
        Ok(()) => Ok(()),
        Err(err) if err.is_resource_exist() => {
            tracing::debug!(project = %fixture.project, topic = %fixture.topic, "topic already exists");
            Ok(())
        }
        Err(err) => Err(err).with_context(|| {
            format!("create topic {}/{}", fixture.project, fixture.topic)
        }),
    }
}

/// Run `body` against a fresh project and topic, then always tear both down.
///
/// Project creation happens before the guarded region. Once it succeeds,
/// teardown runs whatever the topic creation or the body returned. A body error
/// wins over a teardown error; a teardown error alone fails the call.
pub async fn with_topic<F, Fut, T>(client: &DatahubClient, case: u32, body: F) -> Result<T>
where
    F: FnOnce(DatahubClient, TopicFixture) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let fixture = TopicFixture::new(case)?;
    ensure_project(client, &fixture.project).await?;

    let outcome = async {
        ensure_topic(client, &fixture).await?;
        body(client.clone(), fixture.clone()).await
    }
    .await;
    let teardown = drop_project(client, &fixture.project).await;

    match (outcome, teardown) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err.context(format!("teardown of {}", fixture.project))),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(teardown_err)) => {
            tracing::warn!(
                project = %fixture.project,
                error = %teardown_err,
                "teardown failed after scenario error"
            );
            Err(err)
        }
    }
}
