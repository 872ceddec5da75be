use serde::{Deserialize, Serialize};

/// Базовые настройки приложения
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Настройки подключения
    pub connection: ConnectionSettings,
    /// Ограничения параллельного сбора
    pub fan_out: FanOutSettings,
    /// Настройки логирования
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Крайний срок одного удалённого вызова (секунды)
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FanOutSettings {
    /// Максимум одновременно выполняемых вызовов
    pub max_in_flight: usize,
    /// Максимум миньпулов, которые разрешено обойти за один запрос
    pub max_entities: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Уровень по умолчанию, если не задан RUST_LOG
    pub level: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self { timeout: 10 }
    }
}

impl Default for FanOutSettings {
    fn default() -> Self {
        Self {
            max_in_flight: 32,
            max_entities: 10_000,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
