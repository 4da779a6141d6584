//! # 应用配置结构定义

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 数据库配置
    #[serde(default)]
    pub database: super::DatabaseConfig,
    /// SSL 证书子系统配置
    #[serde(default)]
    pub ssl: SslConfig,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// SSL 证书子系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    /// 发行版 CA 证书包路径（证书链校验的信任锚）
    pub distro_ca_bundle: PathBuf,
    /// 面板基础虚拟主机名，用于自签名证书的第三个 SAN 条目
    pub base_server_vhost: String,
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            distro_ca_bundle: PathBuf::from("/etc/ssl/certs/ca-certificates.crt"),
            base_server_vhost: "panel.localhost".to_string(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 默认日志级别，`RUST_LOG` 优先
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.ssl.distro_ca_bundle.as_os_str().is_empty() {
            return Err("ssl.distro_ca_bundle cannot be empty".to_string());
        }
        if self.ssl.base_server_vhost.trim().is_empty() {
            return Err("ssl.base_server_vhost cannot be empty".to_string());
        }

        Ok(())
    }
}
