use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collector::FanOutOptions;

pub mod profile;
pub mod settings;

pub use profile::Profile;
pub use settings::Settings;

/// Главная конфигурация приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Профиль сети
    #[serde(flatten)]
    pub profile: Profile,
    /// Базовые настройки
    #[serde(default)]
    pub settings: Settings,
}

impl AppConfig {
    /// Загружает конфигурацию из YAML файла
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yml::from_str(content).context("Failed to parse YAML")?;
        config.profile.validate()?;
        Ok(config)
    }

    /// Получает URL шлюза из переменной окружения или из профиля
    pub fn get_rpc_url(&self) -> String {
        env::var("MINIPOOL_RPC_URL").unwrap_or_else(|_| self.profile.rpc_url.clone())
    }

    /// Получает timeout из переменной окружения или из настроек
    pub fn get_timeout(&self) -> u64 {
        env::var("MINIPOOL_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.settings.connection.timeout)
    }

    pub fn get_max_in_flight(&self) -> usize {
        env::var("MINIPOOL_MAX_IN_FLIGHT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.settings.fan_out.max_in_flight)
    }

    pub fn fan_out_options(&self) -> FanOutOptions {
        FanOutOptions {
            max_in_flight: self.get_max_in_flight(),
            call_timeout: Duration::from_secs(self.get_timeout()),
            max_entities: self.settings.fan_out.max_entities,
        }
    }

    pub fn debug_config(&self) {
        info!(
            profile = %self.profile.name,
            rpc_url = %self.get_rpc_url(),
            timeout_secs = self.get_timeout(),
            max_in_flight = self.get_max_in_flight(),
            max_entities = self.settings.fan_out.max_entities,
            contracts = self.profile.contracts.len(),
            "configuration loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PROFILE: &str = r#"
name: local
rpc_url: http://127.0.0.1:8545/call
contracts:
  rocketPool: "0x1111111111111111111111111111111111111111"
  rocketPoolToken: "0x2222222222222222222222222222222222222222"
settings:
  fan_out:
    max_entities: 250
"#;

    #[test]
    fn loads_profile_with_partial_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PROFILE.as_bytes()).unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.profile.name, "local");
        assert_eq!(config.settings.fan_out.max_entities, 250);
        assert_eq!(config.settings.fan_out.max_in_flight, 32);
        assert_eq!(config.settings.connection.timeout, 10);
        assert_eq!(config.settings.logging.level, "info");

        let addresses = config.profile.contract_addresses().unwrap();
        assert_eq!(addresses.len(), 2);
        assert_eq!(addresses[0].0, "rocketPool");
    }

    #[test]
    fn missing_required_contract_is_rejected() {
        let yaml = r#"
name: broken
rpc_url: http://127.0.0.1:8545/call
contracts:
  rocketPool: "0x1111111111111111111111111111111111111111"
"#;
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("rocketPoolToken"));
    }

    #[test]
    fn invalid_address_is_rejected() {
        let yaml = PROFILE.replace("0x2222222222222222222222222222222222222222", "0xnope");
        let err = AppConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("rocketPoolToken"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = AppConfig::load("/nonexistent/minipool.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/minipool.yaml"));
    }
}
