//! # 日志配置模块
//!
//! 提供日志初始化以及带统一字段（`request_id`/`stage`/`component`/`operation`）的日志宏

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志所处的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    /// 启动阶段
    Startup,
    /// 请求前置检查
    Precondition,
    /// 证书校验
    Validation,
    /// 自签名证书生成
    Generation,
    /// 数据库读写
    Db,
    /// 预配通知
    Notification,
    /// 关闭阶段
    Shutdown,
}

impl LogStage {
    /// 转换为字符串
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Precondition => "precondition",
            Self::Validation => "validation",
            Self::Generation => "generation",
            Self::Db => "db",
            Self::Notification => "notification",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    /// 命令行入口
    Main,
    /// 配置加载
    Config,
    /// 数据库连接与迁移
    Database,
    /// 私钥/证书编解码
    Codec,
    /// 证书链校验
    ChainValidator,
    /// 自签名证书生成器
    SelfSigned,
    /// 证书记录存储
    CertStore,
    /// 证书生命周期编排
    Lifecycle,
    /// 预配通知
    Notifier,
}

impl LogComponent {
    /// 转换为字符串
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Config => "config",
            Self::Database => "database",
            Self::Codec => "codec",
            Self::ChainValidator => "chain_validator",
            Self::SelfSigned => "self_signed",
            Self::CertStore => "cert_store",
            Self::Lifecycle => "lifecycle",
            Self::Notifier => "notifier",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// info 级别结构化日志
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr $(, $($fields:tt)*)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)*,)?
            "{}",
            $description
        )
    };
}

/// warn 级别结构化日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr $(, $($fields:tt)*)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)*,)?
            "{}",
            $description
        )
    };
}

/// error 级别结构化日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr $(, $($fields:tt)*)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)*,)?
            "{}",
            $description
        )
    };
}

/// debug 级别结构化日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $description:expr $(, $($fields:tt)*)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)*,)?
            "{}",
            $description
        )
    };
}

/// 初始化日志系统
///
/// `RUST_LOG` 优先于配置中的级别；默认关闭 SQL 语句日志
pub fn init_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");

    let default_filter = format!("{level},hosting_ssl=debug,sqlx::query=off,sea_orm::query=warn,sqlx=warn");

    let log_filter = env::var("RUST_LOG").unwrap_or(default_filter);

    let initialised = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    if initialised.is_err() {
        tracing::debug!("tracing subscriber already installed, keeping the existing one");
    }
}
