use anyhow::{Context, Result, ensure};
use datahub_common::MAX_PAGE_SIZE;
use datahub_common::auth::Credentials;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

pub const DEFAULT_ACCESS_ID: &str = "datahub_local_id";
pub const DEFAULT_ACCESS_KEY: &str = "datahub_local_key";
pub const DEFAULT_MAX_PAGE_SIZE: i64 = MAX_PAGE_SIZE;

// Service configuration sourced from environment variables, optionally
// overridden by a YAML file named in DATAHUB_SERVICE_CONFIG.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub accounts: Vec<Credentials>,
    pub max_page_size: i64,
}

#[derive(Debug, Deserialize)]
struct ServiceConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    max_page_size: Option<i64>,
    #[serde(default)]
    accounts: Vec<AccountEntry>,
}

#[derive(Debug, Deserialize)]
struct AccountEntry {
    access_id: String,
    access_key: String,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("DATAHUB_SERVICE_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse DATAHUB_SERVICE_BIND")?;
        let metrics_bind = std::env::var("DATAHUB_SERVICE_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:9090".to_string())
            .parse()
            .with_context(|| "parse DATAHUB_SERVICE_METRICS_BIND")?;
        let access_id = std::env::var("DATAHUB_SERVICE_ACCESS_ID")
            .unwrap_or_else(|_| DEFAULT_ACCESS_ID.to_string());
        let access_key = std::env::var("DATAHUB_SERVICE_ACCESS_KEY")
            .unwrap_or_else(|_| DEFAULT_ACCESS_KEY.to_string());
        let max_page_size = match std::env::var("DATAHUB_SERVICE_MAX_PAGE_SIZE") {
            Ok(value) => value
                .parse()
                .with_context(|| "parse DATAHUB_SERVICE_MAX_PAGE_SIZE")?,
            Err(_) => DEFAULT_MAX_PAGE_SIZE,
        };
        let config = Self {
            bind_addr,
            metrics_bind,
            accounts: vec![Credentials::new(access_id, access_key)],
            max_page_size,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("DATAHUB_SERVICE_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read DATAHUB_SERVICE_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    /// Apply a YAML override; listed accounts are added to the existing ones.
    pub fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: ServiceConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse service config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.max_page_size {
            self.max_page_size = value;
        }
        for account in override_cfg.accounts {
            self.accounts
                .retain(|existing| existing.access_id != account.access_id);
            self.accounts
                .push(Credentials::new(account.access_id, account.access_key));
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            (1..=MAX_PAGE_SIZE).contains(&self.max_page_size),
            "max_page_size must be between 1 and {MAX_PAGE_SIZE}"
        );
        ensure!(
            self.accounts
                .iter()
                .all(|account| !account.access_id.is_empty() && !account.access_key.is_empty()),
            "accounts need a non-empty access_id and access_key"
        );
        Ok(())
    }

    /// Loopback configuration with a single account, used by tests and harnesses.
    pub fn local(access_id: &str, access_key: &str) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            metrics_bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            accounts: vec![Credentials::new(access_id, access_key)],
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}
