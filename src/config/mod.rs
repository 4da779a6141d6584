//! # 配置管理模块
//!
//! 处理应用配置加载和验证

mod app_config;
mod database;

pub use app_config::{AppConfig, LoggingConfig, SslConfig};
pub use database::DatabaseConfig;

use crate::error::{Result, SslError};
use std::env;
use std::path::Path;

/// 按 `RUST_ENV` 加载 `config/config.{env}.toml`
pub fn load_config() -> Result<AppConfig> {
    let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
    let config_file = format!("config/config.{env}.toml");
    load_config_from(&config_file)
}

/// 从指定路径加载配置文件
pub fn load_config_from(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SslError::config(format!(
            "配置文件不存在: {}",
            path.display()
        )));
    }

    let config_content = std::fs::read_to_string(path).map_err(|e| {
        SslError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
    })?;

    parse_config(&config_content)
}

/// 解析并验证 TOML 配置内容
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(content)?;

    config.validate().map_err(SslError::config)?;

    Ok(config)
}
