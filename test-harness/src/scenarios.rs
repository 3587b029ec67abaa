//! The subscription scenarios.
//!
//! Each scenario owns one case index, runs inside [`with_topic`] and deletes the
//! subscription it created before the fixture tears the project down.
use crate::fixture::{TopicFixture, with_topic};
use anyhow::{Context, Result, bail, ensure};
use datahub_client::{DatahubClient, Subscription, SubscriptionState};
use datahub_common::USER_SUBSCRIPTION_TYPE;
use std::fmt;

pub const COMMENT: &str = "comment";
pub const NEW_COMMENT: &str = "new comment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    CreateAndDelete,
    Get,
    Update,
    UpdateState,
    List,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::CreateAndDelete,
        Scenario::Get,
        Scenario::Update,
        Scenario::UpdateState,
        Scenario::List,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::CreateAndDelete => "create_and_delete_subscription",
            Scenario::Get => "get_subscription",
            Scenario::Update => "update_subscription",
            Scenario::UpdateState => "update_subscription_state",
            Scenario::List => "list_subscription",
        }
    }

    /// Case index embedded in the scenario's resource names.
    pub fn case(&self) -> u32 {
        match self {
            Scenario::CreateAndDelete => 1,
            Scenario::Get => 2,
            Scenario::Update => 3,
            Scenario::UpdateState => 4,
            Scenario::List => 5,
        }
    }

    pub async fn run(&self, client: &DatahubClient) -> Result<()> {
        match self {
            Scenario::CreateAndDelete => create_and_delete_subscription(client).await,
            Scenario::Get => get_subscription(client).await,
            Scenario::Update => update_subscription(client).await,
            Scenario::UpdateState => update_subscription_state(client).await,
            Scenario::List => list_subscription(client).await,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

async fn create(client: &DatahubClient, fx: &TopicFixture) -> Result<String> {
    let created = client
        .create_subscription(&fx.project, &fx.topic, COMMENT)
        .await
        .context("create subscription")?;
    ensure!(!created.sub_id.is_empty(), "create returned an empty sub id");
    Ok(created.sub_id)
}

async fn fetch(client: &DatahubClient, fx: &TopicFixture, sub_id: &str) -> Result<Subscription> {
    client
        .get_subscription(&fx.project, &fx.topic, sub_id)
        .await
        .with_context(|| format!("get subscription {sub_id}"))
}

async fn delete(client: &DatahubClient, fx: &TopicFixture, sub_id: &str) -> Result<()> {
    client
        .delete_subscription(&fx.project, &fx.topic, sub_id)
        .await
        .with_context(|| format!("delete subscription {sub_id}"))
}

/// Field checks shared by the get and list scenarios.
fn check_fresh(sub: &Subscription, sub_id: &str, topic: &str) -> Result<()> {
    ensure!(sub.comment == COMMENT, "unexpected comment {:?}", sub.comment);
    ensure!(sub.create_time > 0, "create time {} not positive", sub.create_time);
    ensure!(
        sub.last_modify_time > 0,
        "last modify time {} not positive",
        sub.last_modify_time
    );
    ensure!(sub.is_owner, "caller is not reported as owner");
    ensure!(
        sub.state == SubscriptionState::Active,
        "state is {}, expected ACTIVE",
        sub.state
    );
    ensure!(sub.sub_id == sub_id, "sub id {} != {sub_id}", sub.sub_id);
    ensure!(sub.topic_name == topic, "topic {} != {topic}", sub.topic_name);
    ensure!(
        sub.sub_type == USER_SUBSCRIPTION_TYPE,
        "type {} != {USER_SUBSCRIPTION_TYPE}",
        sub.sub_type
    );
    Ok(())
}

pub async fn create_and_delete_subscription(client: &DatahubClient) -> Result<()> {
    with_topic(client, Scenario::CreateAndDelete.case(), |client, fx| async move {
        let sub_id = create(&client, &fx).await?;
        delete(&client, &fx, &sub_id).await
    })
    .await
}

pub async fn get_subscription(client: &DatahubClient) -> Result<()> {
    with_topic(client, Scenario::Get.case(), |client, fx| async move {
        let sub_id = create(&client, &fx).await?;
        let sub = fetch(&client, &fx, &sub_id).await?;
        check_fresh(&sub, &sub_id, &fx.topic)?;
        delete(&client, &fx, &sub_id).await
    })
    .await
}

pub async fn update_subscription(client: &DatahubClient) -> Result<()> {
    with_topic(client, Scenario::Update.case(), |client, fx| async move {
        let sub_id = create(&client, &fx).await?;
        let before = fetch(&client, &fx, &sub_id).await?;
        client
            .update_subscription(&fx.project, &fx.topic, &sub_id, NEW_COMMENT)
            .await
            .context("update subscription")?;
        let after = fetch(&client, &fx, &sub_id).await?;
        ensure!(
            after.comment == NEW_COMMENT,
            "comment not updated: {:?}",
            after.comment
        );
        ensure!(
            after.sub_id == before.sub_id
                && after.topic_name == before.topic_name
                && after.create_time == before.create_time
                && after.state == before.state
                && after.is_owner == before.is_owner
                && after.sub_type == before.sub_type,
            "update changed more than the comment: {before:?} -> {after:?}"
        );
        delete(&client, &fx, &sub_id).await
    })
    .await
}

pub async fn update_subscription_state(client: &DatahubClient) -> Result<()> {
    with_topic(client, Scenario::UpdateState.case(), |client, fx| async move {
        let sub_id = create(&client, &fx).await?;
        for state in [SubscriptionState::Inactive, SubscriptionState::Active] {
            client
                .update_subscription_state(&fx.project, &fx.topic, &sub_id, state)
                .await
                .with_context(|| format!("set state {state}"))?;
            let observed = fetch(&client, &fx, &sub_id).await?.state;
            ensure!(observed == state, "state is {observed}, expected {state}");
        }
        delete(&client, &fx, &sub_id).await
    })
    .await
}

pub async fn list_subscription(client: &DatahubClient) -> Result<()> {
    with_topic(client, Scenario::List.case(), |client, fx| async move {
        let sub_id = create(&client, &fx).await?;
        let listed = client
            .list_subscription(&fx.project, &fx.topic, "", 1, 10)
            .await
            .context("list subscriptions")?;
        ensure!(
            listed.total_count == 1,
            "total count {} != 1",
            listed.total_count
        );
        let Some(sub) = listed.subscriptions.first() else {
            bail!("listing returned no subscriptions");
        };
        check_fresh(sub, &sub_id, &fx.topic)?;

        match client.list_subscription(&fx.project, &fx.topic, "", 0, 1).await {
            Err(err) if err.is_invalid_parameter() => {}
            Err(err) => return Err(err).context("list with page index 0"),
            Ok(_) => bail!("query subscription success with invalid page index"),
        }
        match client.list_subscription(&fx.project, &fx.topic, "", 1, -1).await {
            Err(err) if err.is_invalid_parameter() => {}
            Err(err) => return Err(err).context("list with page size -1"),
            Ok(_) => bail!("query subscription success with invalid page size"),
        }

        delete(&client, &fx, &sub_id).await
    })
    .await
}

/// Outcome of one scenario in a suite run.
#[derive(Debug)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub error: Option<anyhow::Error>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Run every scenario in order, continuing past failures.
pub async fn run_all(client: &DatahubClient) -> Vec<ScenarioReport> {
    let mut reports = Vec::with_capacity(Scenario::ALL.len());
    for scenario in Scenario::ALL {
        let error = scenario.run(client).await.err();
        match &error {
            None => tracing::info!(scenario = %scenario, "scenario passed"),
            Some(err) => tracing::error!(scenario = %scenario, error = ?err, "scenario failed"),
        }
        reports.push(ScenarioReport { scenario, error });
    }
    reports
}
