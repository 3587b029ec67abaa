//! DataHub service entry point.
//!
//! # Purpose
//! Loads configuration, installs tracing and metrics, and serves the API until
//! Ctrl-C.
use anyhow::Context;
use datahub_service::app::{self, AppState};
use datahub_service::config::ServiceConfig;
use datahub_service::observability;
use std::future::Future;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env_or_yaml().context("datahub service config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: ServiceConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability()?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let state = AppState::in_memory(&config);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, accounts = state.accounts.len(), "datahub service listening");
    app::serve(listener, state, shutdown).await?;

    metrics_task.abort();
    let _ = metrics_task.await;
    tracing::info!("datahub service stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn run_with_shutdown_starts_and_stops() {
        let config = ServiceConfig::local("id", "key");
        run_with_shutdown(config, async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        })
        .await
        .expect("run should stop cleanly");
    }

    #[tokio::test]
    #[serial]
    async fn bind_failure_is_reported() {
        let occupied = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let mut config = ServiceConfig::local("id", "key");
        config.bind_addr = occupied.local_addr().expect("addr");
        let err = run_with_shutdown(config, async {})
            .await
            .expect_err("address in use");
        assert!(err.to_string().contains("bind"));
    }
}
