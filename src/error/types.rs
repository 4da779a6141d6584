//! # 错误类型定义

use thiserror::Error;

use super::ErrorCategory;

/// 前置条件失败的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreconditionKind {
    /// 域名实体不存在或不属于当前客户
    NotFound,
    /// 提交的数据缺少必需字段或格式错误
    MalformedRequest,
    /// 客户未开通 SSL 功能
    FeatureDisabled,
}

/// 证书校验失败的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    /// 私钥无法解析或口令错误
    InvalidKey,
    /// 证书无法解析
    InvalidCertificate,
    /// 私钥与证书不匹配
    KeyCertMismatch,
    /// 证书链校验失败
    ChainInvalid,
}

/// 存储失败的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// 记录与现有数据冲突（唯一索引或记录已不匹配）
    Conflict,
    /// 记录不存在
    NotFound,
    /// 事务无法提交
    Failure,
}

/// 证书子系统主要错误类型
#[derive(Debug, Error)]
pub enum SslError {
    /// 请求前置条件错误，发生在任何副作用之前
    #[error("前置条件错误: {message}")]
    Precondition {
        kind: PreconditionKind,
        message: String,
    },

    /// 私钥/证书/证书链校验错误
    #[error("证书校验错误: {message}")]
    Validation {
        kind: ValidationKind,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 自签名证书生成错误
    #[error("证书生成错误: {message}")]
    GenerationFailed {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库存储错误
    #[error("存储错误: {message}")]
    Storage {
        kind: StorageKind,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 附加上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<SslError>,
    },
}

impl SslError {
    /// 创建前置条件错误
    pub fn precondition<T: Into<String>>(kind: PreconditionKind, message: T) -> Self {
        Self::Precondition {
            kind,
            message: message.into(),
        }
    }

    /// 创建校验错误
    pub fn validation<T: Into<String>>(kind: ValidationKind, message: T) -> Self {
        Self::Validation {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的校验错误
    pub fn validation_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        kind: ValidationKind,
        message: T,
        source: E,
    ) -> Self {
        Self::Validation {
            kind,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建证书生成错误
    pub fn generation<T: Into<String>>(message: T) -> Self {
        Self::GenerationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的证书生成错误
    pub fn generation_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::GenerationFailed {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建存储错误
    pub fn storage<T: Into<String>>(kind: StorageKind, message: T) -> Self {
        Self::Storage {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的存储错误
    pub fn storage_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        kind: StorageKind,
        message: T,
        source: E,
    ) -> Self {
        Self::Storage {
            kind,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 去掉上下文包装，返回最内层错误
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// 校验错误种类
    #[must_use]
    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self.root() {
            Self::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// 前置条件错误种类
    #[must_use]
    pub fn precondition_kind(&self) -> Option<PreconditionKind> {
        match self.root() {
            Self::Precondition { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// 存储错误种类
    #[must_use]
    pub fn storage_kind(&self) -> Option<StorageKind> {
        match self.root() {
            Self::Storage { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// 是否为证书生成错误
    #[must_use]
    pub fn is_generation_failure(&self) -> bool {
        matches!(self.root(), Self::GenerationFailed { .. })
    }

    /// 错误归属：客户端输入问题还是服务端问题
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            Self::Precondition { .. } | Self::Validation { .. } => ErrorCategory::Client,
            Self::Storage {
                kind: StorageKind::Conflict,
                ..
            } => ErrorCategory::Client,
            _ => ErrorCategory::Server,
        }
    }

    /// 面向最终用户的提示信息，不包含任何底层库的诊断内容
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self.root() {
            Self::Precondition { .. } => "Bad request.",
            Self::Validation { kind, .. } => match kind {
                ValidationKind::InvalidKey => "Invalid private key or passphrase.",
                ValidationKind::InvalidCertificate => "Invalid SSL certificate.",
                ValidationKind::KeyCertMismatch => {
                    "The private key doesn't belong to the provided SSL certificate."
                }
                ValidationKind::ChainInvalid => {
                    "At least one intermediate certificate is invalid or missing."
                }
            },
            Self::GenerationFailed { .. } => {
                "Could not generate SSL certificate. An unexpected error occurred."
            }
            Self::Storage { .. }
            | Self::Internal { .. }
            | Self::Config { .. }
            | Self::Io { .. }
            | Self::Context { .. } => {
                "An unexpected error occurred. Please contact your reseller."
            }
        }
    }

    /// 删除操作的用户提示，存储失败时使用删除专用文案
    #[must_use]
    pub fn delete_user_message(&self) -> &'static str {
        match self.root() {
            Self::Storage { .. } => "Could not delete SSL certificate. An unexpected error occurred.",
            _ => self.user_message(),
        }
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for SslError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for SslError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<sea_orm::DbErr> for SslError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::storage_with_source(StorageKind::Failure, "数据库操作失败", err)
    }
}
