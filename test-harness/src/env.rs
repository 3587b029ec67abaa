//! Where the suite runs: a configured remote endpoint or an in-process service.
//!
//! Configuration comes from `ClientConfig::from_env_or_yaml`, with the settings
//! file taken from the explicit path, then `DATAHUB_TEST_CONFIG`, then
//! `test-harness/datahub.yaml` when that file exists. Without a complete
//! configuration the tests fall back to a local service bound to `127.0.0.1:0`.
use anyhow::{Context, Result};
use datahub_client::config::CONFIG_PATH_ENV;
use datahub_client::{ClientConfig, DatahubClient};
use datahub_service::app::{self, AppState};
use datahub_service::config::{DEFAULT_ACCESS_ID, DEFAULT_ACCESS_KEY, ServiceConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const DEFAULT_CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/datahub.yaml");

/// Resolve the settings file and load the client configuration.
pub fn load_client_config(path: Option<&str>) -> Result<ClientConfig> {
    let path = path
        .map(str::to_string)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .or_else(|| {
            Path::new(DEFAULT_CONFIG_PATH)
                .exists()
                .then(|| DEFAULT_CONFIG_PATH.to_string())
        });
    ClientConfig::from_env_or_yaml(path.as_deref())
}

/// An in-process DataHub service serving until dropped or shut down.
pub struct LocalService {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl LocalService {
    pub async fn start(access_id: &str, access_key: &str) -> Result<Self> {
        Self::start_with_config(ServiceConfig::local(access_id, access_key)).await
    }

    pub async fn start_with_config(config: ServiceConfig) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .context("bind local datahub service")?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(app::serve(
            listener,
            AppState::in_memory(&config),
            async move {
                let _ = shutdown_rx.await;
            },
        ));
        wait_for_listen(addr).await?;
        tracing::debug!(%addr, "local datahub service started");
        Ok(Self {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .context("local service shutdown timed out")?
                .context("local service task panicked")?
                .context("local service failed")?;
        }
        Ok(())
    }
}

impl Drop for LocalService {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn wait_for_listen(addr: SocketAddr) -> Result<()> {
    let deadline = Instant::now() + Duration::from_secs(1);
    loop {
        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(err) => {
                if Instant::now() >= deadline {
                    return Err(anyhow::anyhow!("server not ready at {addr}: {err}"));
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}

/// A client plus, when running locally, the service it talks to.
pub struct TestEnv {
    client: DatahubClient,
    config: ClientConfig,
    local: Option<LocalService>,
}

impl TestEnv {
    pub fn remote(config: ClientConfig) -> Result<Self> {
        let client = DatahubClient::new(&config).context("build datahub client")?;
        Ok(Self {
            client,
            config,
            local: None,
        })
    }

    pub async fn local() -> Result<Self> {
        let service = LocalService::start(DEFAULT_ACCESS_ID, DEFAULT_ACCESS_KEY).await?;
        let config = ClientConfig::new(DEFAULT_ACCESS_ID, DEFAULT_ACCESS_KEY, service.endpoint());
        let client = DatahubClient::new(&config).context("build datahub client")?;
        Ok(Self {
            client,
            config,
            local: Some(service),
        })
    }

    /// Remote when the resolved configuration is complete, local otherwise.
    pub async fn from_config_or_local(path: Option<&str>) -> Result<Self> {
        let config = load_client_config(path)?;
        if config.is_complete() {
            tracing::info!(endpoint = %config.endpoint, "running against configured endpoint");
            Self::remote(config)
        } else {
            tracing::info!("datahub settings incomplete, starting local service");
            Self::local().await
        }
    }

    pub fn client(&self) -> &DatahubClient {
        &self.client
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_local(&self) -> bool {
        self.local.is_some()
    }

    pub async fn shutdown(self) -> Result<()> {
        let TestEnv { client, local, .. } = self;
        // Release pooled connections before waiting on graceful shutdown.
        drop(client);
        match local {
            Some(service) => service.shutdown().await,
            None => Ok(()),
        }
    }
}
