use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// 应用配置
///
/// 加载顺序: 内置默认值 -> 可选的 `bill-split.toml` -> `BILL_SPLIT__*` 环境变量
/// (例如 `BILL_SPLIT__SERVER__PORT=9000`)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub split: SplitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 启动时预置账单的 JSON 文件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// none | total_over_subtotal | charges | 数字系数
    pub default_adjustment: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            default_adjustment: "none".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            seed: SeedConfig::default(),
            split: SplitConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从配置文件与环境变量加载
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("bill-split")
    }

    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("split.default_adjustment", defaults.split.default_adjustment)?
            .add_source(File::with_name(file).required(false))
            .add_source(Environment::with_prefix("BILL_SPLIT").separator("__"))
            .build()?
            .try_deserialize()
    }
}
