//! Best-effort removal of suite resources.
//!
//! Deletes never cascade on the service, so every helper works bottom-up:
//! subscriptions, then topics, then projects. Resources that vanish in the
//! meantime (`ResourceNotFound`) are treated as already cleaned.
use anyhow::{Context, Result, bail};
use datahub_client::{DatahubClient, DatahubError};

// Small enough for any service cap in practice; halved when a service rejects it.
const CLEANUP_PAGE_SIZE: i64 = 10;

fn tolerate_not_found(result: datahub_client::Result<()>) -> datahub_client::Result<()> {
    match result {
        Err(err) if err.is_not_found() => Ok(()),
        other => other,
    }
}

/// Delete every subscription of a topic, paging until the listing is empty.
pub async fn clean_subscription(client: &DatahubClient, project: &str, topic: &str) -> Result<()> {
    let mut remaining = u64::MAX;
    let mut page_size = CLEANUP_PAGE_SIZE;
    loop {
        let page = match client
            .list_subscription(project, topic, "", 1, page_size)
            .await
        {
            Ok(page) => page,
            Err(err) if err.is_invalid_parameter() && page_size > 1 => {
                tracing::debug!(%project, %topic, page_size, "page size rejected, retrying smaller");
                page_size /= 2;
                continue;
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("list subscriptions of {project}/{topic}"));
            }
        };
        if page.subscriptions.is_empty() {
            return Ok(());
        }
        if page.total_count >= remaining {
            bail!("subscriptions of {project}/{topic} are not being removed");
        }
        remaining = page.total_count;
        for sub in &page.subscriptions {
            tolerate_not_found(client.delete_subscription(project, topic, &sub.sub_id).await)
                .with_context(|| format!("delete subscription {}", sub.sub_id))?;
            tracing::debug!(%project, %topic, sub_id = %sub.sub_id, "subscription removed");
        }
    }
}

/// Delete every topic of a project; with `force`, empty each topic first.
pub async fn clean_topic(client: &DatahubClient, project: &str, force: bool) -> Result<()> {
    let topics = match client.list_topic(project).await {
        Ok(result) => result.topic_names,
        Err(err) if err.is_not_found() => return Ok(()),
        Err(err) => return Err(err).with_context(|| format!("list topics of {project}")),
    };
    for topic in topics {
        if force {
            clean_subscription(client, project, &topic).await?;
        }
        tolerate_not_found(client.delete_topic(project, &topic).await)
            .with_context(|| format!("delete topic {project}/{topic}"))?;
        tracing::debug!(%project, %topic, "topic removed");
    }
    Ok(())
}

/// Delete one project after clearing its topics and subscriptions.
///
/// A project that still holds resources (`InvalidOperation`) is left in place.
pub async fn drop_project(client: &DatahubClient, project: &str) -> Result<()> {
    clean_topic(client, project, true).await?;
    match client.delete_project(project).await {
        Ok(()) => {
            tracing::debug!(%project, "project removed");
            Ok(())
        }
        Err(err) if err.is_not_found() => Ok(()),
        Err(err @ DatahubError::InvalidOperation(_)) => {
            tracing::warn!(%project, error = %err, "project left behind");
            Ok(())
        }
        Err(err) => Err(err).with_context(|| format!("delete project {project}")),
    }
}

/// Delete every project whose name starts with `prefix`.
///
/// With `force`, topics and subscriptions are removed first; without it,
/// projects that still hold topics are skipped.
pub async fn clean_project(client: &DatahubClient, prefix: &str, force: bool) -> Result<()> {
    let projects = client
        .list_project()
        .await
        .context("list projects")?
        .project_names;
    for project in projects.iter().filter(|name| name.starts_with(prefix)) {
        if force {
            drop_project(client, project).await?;
            continue;
        }
        match client.delete_project(project).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() || err.is_invalid_operation() => {
                tracing::debug!(%project, error = %err, "project skipped");
            }
            Err(err) => return Err(err).with_context(|| format!("delete project {project}")),
        }
    }
    Ok(())
}
