//! # 证书记录相关类型

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PreconditionKind, SslError};

/// 证书所属域名实体的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainType {
    /// 主域名
    #[serde(rename = "dmn")]
    Primary,
    /// 域名别名
    #[serde(rename = "als")]
    Alias,
    /// 子域名
    #[serde(rename = "sub")]
    Subdomain,
    /// 别名的子域名
    #[serde(rename = "alssub")]
    AliasSubdomain,
}

impl DomainType {
    /// 存储与传输中使用的类型代码
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Primary => "dmn",
            Self::Alias => "als",
            Self::Subdomain => "sub",
            Self::AliasSubdomain => "alssub",
        }
    }

    /// 从类型代码解析
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "dmn" => Some(Self::Primary),
            "als" => Some(Self::Alias),
            "sub" => Some(Self::Subdomain),
            "alssub" => Some(Self::AliasSubdomain),
            _ => None,
        }
    }
}

impl fmt::Display for DomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DomainType {
    type Err = SslError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| {
            SslError::precondition(
                PreconditionKind::MalformedRequest,
                format!("未知的域名类型: {s}"),
            )
        })
    }
}

/// 证书所属的域名实体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainRef {
    /// 域名实体 ID
    pub domain_id: i32,
    /// 域名实体类型
    pub domain_type: DomainType,
}

impl DomainRef {
    /// 构造域名实体引用
    #[must_use]
    pub const fn new(domain_id: i32, domain_type: DomainType) -> Self {
        Self {
            domain_id,
            domain_type,
        }
    }
}

impl fmt::Display for DomainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.domain_type, self.domain_id)
    }
}

/// 证书记录状态，由外部预配程序消费
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CertStatus {
    /// 待新增
    ToAdd,
    /// 待更新
    ToChange,
    /// 待删除
    ToDelete,
    /// 已生效
    Ok,
    /// 存储中出现的其它状态值，原样保留
    Unexpected(String),
}

/// 状态的展示形式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusDisplay {
    /// 已知状态的显示文案
    Known(&'static str),
    /// 无法识别的原始状态值
    Unrecognized(String),
}

impl CertStatus {
    /// 从存储值解析，未知值保留为 `Unexpected`
    #[must_use]
    pub fn from_db(raw: &str) -> Self {
        match raw {
            "toadd" => Self::ToAdd,
            "tochange" => Self::ToChange,
            "todelete" => Self::ToDelete,
            "ok" => Self::Ok,
            other => Self::Unexpected(other.to_string()),
        }
    }

    /// 存储值
    #[must_use]
    pub fn as_db(&self) -> &str {
        match self {
            Self::ToAdd => "toadd",
            Self::ToChange => "tochange",
            Self::ToDelete => "todelete",
            Self::Ok => "ok",
            Self::Unexpected(raw) => raw,
        }
    }

    /// 是否有等待预配程序处理的变更
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::ToAdd | Self::ToChange | Self::ToDelete)
    }

    #[must_use]
    pub fn display(&self) -> StatusDisplay {
        match self {
            Self::Ok => StatusDisplay::Known("Ok"),
            Self::ToAdd => StatusDisplay::Known("Addition in progress"),
            Self::ToChange => StatusDisplay::Known("Modification in progress"),
            Self::ToDelete => StatusDisplay::Known("Deletion in progress"),
            Self::Unexpected(raw) => StatusDisplay::Unrecognized(raw.clone()),
        }
    }
}

impl fmt::Display for CertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_db())
    }
}

/// HSTS 设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HstsSettings {
    pub allow_hsts: bool,
    pub max_age: i32,
    pub include_subdomains: bool,
}

impl HstsSettings {
    /// 默认 max-age：一年
    pub const DEFAULT_MAX_AGE: i32 = 31_536_000;
}

impl Default for HstsSettings {
    fn default() -> Self {
        Self {
            allow_hsts: false,
            max_age: Self::DEFAULT_MAX_AGE,
            include_subdomains: false,
        }
    }
}

/// 证书记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    /// 0 表示尚未创建
    pub cert_id: i32,
    pub domain: DomainRef,
    pub private_key: String,
    pub certificate: String,
    pub ca_bundle: String,
    pub hsts: HstsSettings,
    pub status: CertStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CertificateRecord {
    /// 尚未持久化的新记录
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.cert_id == 0
    }
}

impl TryFrom<entity::ssl_certs::Model> for CertificateRecord {
    type Error = SslError;

    fn try_from(model: entity::ssl_certs::Model) -> Result<Self, Self::Error> {
        let domain_type = DomainType::from_code(&model.domain_type).ok_or_else(|| {
            SslError::internal_with_source(
                "证书记录包含未知的域名类型",
                anyhow::anyhow!("cert_id={} domain_type={}", model.cert_id, model.domain_type),
            )
        })?;

        Ok(Self {
            cert_id: model.cert_id,
            domain: DomainRef::new(model.domain_id, domain_type),
            private_key: model.private_key,
            certificate: model.certificate,
            ca_bundle: model.ca_bundle,
            hsts: HstsSettings {
                allow_hsts: model.allow_hsts,
                max_age: model.hsts_max_age,
                include_subdomains: model.hsts_include_subdomains,
            },
            status: CertStatus::from_db(&model.status),
            created_at: Some(model.created_at.and_utc()),
            updated_at: Some(model.updated_at.and_utc()),
        })
    }
}
