// Client credentials and endpoint configuration.
use anyhow::{Context, Result};
use datahub_common::auth::Credentials;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::error::DatahubError;

pub const CONFIG_PATH_ENV: &str = "DATAHUB_TEST_CONFIG";
pub const ACCESS_ID_ENV: &str = "DATAHUB_ACCESS_ID";
pub const ACCESS_KEY_ENV: &str = "DATAHUB_ACCESS_KEY";
pub const ENDPOINT_ENV: &str = "DATAHUB_ENDPOINT";
pub const REQUEST_TIMEOUT_ENV: &str = "DATAHUB_REQUEST_TIMEOUT_MS";
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

pub const MISSING_SETTINGS_MESSAGE: &str = "[access_id, access_key, endpoint] must be set";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub access_id: String,
    pub access_key: String,
    pub endpoint: String,
    pub request_timeout: Duration,
}

// The settings file keeps everything under a `datahub:` section.
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    datahub: ClientConfigOverride,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
struct ClientConfigOverride {
    access_id: Option<String>,
    access_key: Option<String>,
    endpoint: Option<String>,
    request_timeout_ms: Option<u64>,
}

impl ClientConfigOverride {
    fn apply(self, config: &mut ClientConfig) {
        if let Some(value) = self.access_id {
            config.access_id = value;
        }
        if let Some(value) = self.access_key {
            config.access_key = value;
        }
        if let Some(value) = self.endpoint {
            config.endpoint = value;
        }
        if let Some(value) = self.request_timeout_ms {
            config.request_timeout = Duration::from_millis(value);
        }
    }
}

impl ClientConfig {
    pub fn new(
        access_id: impl Into<String>,
        access_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            access_id: access_id.into(),
            access_key: access_key.into(),
            endpoint: endpoint.into(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }

    pub fn from_env() -> Result<Self> {
        let request_timeout_ms = match std::env::var(REQUEST_TIMEOUT_ENV) {
            Ok(value) => value
                .parse::<u64>()
                .with_context(|| format!("parse {REQUEST_TIMEOUT_ENV}"))?,
            Err(_) => DEFAULT_REQUEST_TIMEOUT_MS,
        };
        Ok(Self {
            access_id: std::env::var(ACCESS_ID_ENV).unwrap_or_default(),
            access_key: std::env::var(ACCESS_KEY_ENV).unwrap_or_default(),
            endpoint: std::env::var(ENDPOINT_ENV).unwrap_or_default(),
            request_timeout: Duration::from_millis(request_timeout_ms),
        })
    }

    /// Environment values, overridden by the settings file when one is named.
    ///
    /// The file comes from `config_path` or, failing that, `DATAHUB_TEST_CONFIG`.
    pub fn from_env_or_yaml(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::from_env()?;
        let override_path = config_path
            .map(|value| value.to_string())
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok());
        if let Some(path) = override_path.as_deref() {
            let contents =
                fs::read_to_string(path).with_context(|| format!("read client config: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    pub fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let file: ConfigFile =
            serde_yaml::from_str(contents).context("parse client config yaml")?;
        file.datahub.apply(self);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        !self.access_id.trim().is_empty()
            && !self.access_key.trim().is_empty()
            && !self.endpoint.trim().is_empty()
    }

    pub fn validate(&self) -> std::result::Result<(), DatahubError> {
        if !self.is_complete() {
            return Err(DatahubError::Config(MISSING_SETTINGS_MESSAGE.to_string()));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.access_id.clone(), self.access_key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::set_var(key, value);
            }
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::remove_var(key);
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(value) => unsafe {
                    std::env::set_var(self.key, value);
                },
                None => unsafe {
                    std::env::remove_var(self.key);
                },
            }
        }
    }

    #[test]
    fn yaml_section_overrides_fields() {
        let mut config = ClientConfig::new("", "", "");
        config
            .apply_yaml(
                "datahub:\n  access_id: id\n  access_key: key\n  endpoint: http://127.0.0.1:8080\n  request_timeout_ms: 500\n",
            )
            .expect("apply");
        assert_eq!(config.access_id, "id");
        assert_eq!(config.access_key, "key");
        assert_eq!(config.endpoint, "http://127.0.0.1:8080");
        assert_eq!(config.request_timeout, Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_values_fail_validation() {
        let config = ClientConfig::new("id", "", "http://localhost");
        let err = config.validate().expect_err("incomplete");
        assert!(err.to_string().contains(MISSING_SETTINGS_MESSAGE));
    }

    #[test]
    fn bad_yaml_is_reported() {
        let mut config = ClientConfig::new("", "", "");
        let err = config.apply_yaml("datahub: [").expect_err("bad yaml");
        assert!(err.to_string().contains("parse client config yaml"));
    }

    #[test]
    #[serial]
    fn env_values_are_overridden_by_file() {
        let _g1 = EnvGuard::set(ACCESS_ID_ENV, "env-id");
        let _g2 = EnvGuard::set(ACCESS_KEY_ENV, "env-key");
        let _g3 = EnvGuard::set(ENDPOINT_ENV, "http://env:1");
        let _g4 = EnvGuard::unset(REQUEST_TIMEOUT_ENV);
        let _g5 = EnvGuard::unset(CONFIG_PATH_ENV);

        let config = ClientConfig::from_env_or_yaml(None).expect("env only");
        assert_eq!(config.access_id, "env-id");
        assert_eq!(
            config.request_timeout,
            Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)
        );

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "datahub:\n  endpoint: http://file:2").expect("write");
        let path = file.path().to_string_lossy().to_string();
        let config = ClientConfig::from_env_or_yaml(Some(&path)).expect("with file");
        assert_eq!(config.access_id, "env-id");
        assert_eq!(config.endpoint, "http://file:2");
    }

    #[test]
    #[serial]
    fn unreadable_file_is_an_error() {
        let _g = EnvGuard::set(CONFIG_PATH_ENV, "/nonexistent/datahub.yaml");
        let err = ClientConfig::from_env_or_yaml(None).expect_err("missing file");
        assert!(err.to_string().contains("read client config"));
    }

    #[test]
    #[serial]
    fn bad_timeout_is_rejected() {
        let _g = EnvGuard::set(REQUEST_TIMEOUT_ENV, "soon");
        let err = ClientConfig::from_env().expect_err("bad timeout");
        assert!(err.to_string().contains(REQUEST_TIMEOUT_ENV));
    }
}
