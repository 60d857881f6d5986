use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub export: ExportConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// CSV 导出目录
    pub dir: String,
}

/// 首次启动播种的操作员账号 (可选)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub seed_email: Option<String>,
    pub seed_password: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://kitoko_packer.db".to_string(),
            },
            export: ExportConfig {
                dir: "exports".to_string(),
            },
            auth: AuthConfig::default(),
        }
    }
}

impl AppConfig {
    /// 加载配置: 默认值 < 可选 config.toml < KITOKO_* 环境变量
    ///
    /// 环境变量用双下划线分段, 如 KITOKO_SERVER__PORT=9090。
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&AppConfig::default())?;
        config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("KITOKO").separator("__"))
            .build()?
            .try_deserialize()
    }
}
