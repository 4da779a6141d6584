//! # 外部协作者
//!
//! 域名解析、域名状态标记、账户资料和预配通知。每个协作者都是一个 trait，
//! 并提供基于数据库的默认实现。

use std::sync::Arc;

use async_trait::async_trait;
use entity::{
    Accounts, DomainAliases, Domains, SubdomainAliases, Subdomains, domain_aliases, domains,
    subdomain_aliases, subdomains,
};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter};
use tokio::sync::mpsc;

use super::types::{DomainRef, DomainType};
use crate::error::{Result, SslError, StorageKind};
use crate::logging::{LogComponent, LogStage};
use crate::tls::SubjectInfo;
use crate::{linfo, lwarn, storage_error};

/// 域名实体的 "待变更" 状态值
const PENDING_CHANGE: &str = "tochange";

/// 将域名实体解析为规范域名
#[async_trait]
pub trait DomainResolver: Send + Sync {
    /// 实体不存在或不属于该账户时返回 `None`
    async fn resolve(&self, domain: DomainRef, owner_id: i32) -> Result<Option<String>>;
}

/// 在证书记录所在的事务中标记域名实体待变更
#[async_trait]
pub trait DomainStatusFlag: Send + Sync {
    async fn mark_pending(&self, txn: &DatabaseTransaction, domain: DomainRef) -> Result<()>;
}

/// 读取自签名证书主题使用的账户资料
#[async_trait]
pub trait OwnerProfileSource: Send + Sync {
    /// 账户不存在时返回 `None`
    async fn subject_info(&self, owner_id: i32) -> Result<Option<SubjectInfo>>;
}

/// 通知预配程序重新处理待变更的域名
#[async_trait]
pub trait ProvisioningNotifier: Send + Sync {
    async fn notify(&self) -> Result<()>;
}

/// 基于数据库的域名解析
#[derive(Clone)]
pub struct DbDomainResolver {
    db: Arc<DatabaseConnection>,
}

impl DbDomainResolver {
    /// 创建数据库域名解析器
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn owned_domain(&self, domain_id: i32, owner_id: i32) -> Result<Option<domains::Model>> {
        Ok(Domains::find_by_id(domain_id)
            .filter(domains::Column::OwnerId.eq(owner_id))
            .one(self.db.as_ref())
            .await?)
    }
}

#[async_trait]
impl DomainResolver for DbDomainResolver {
    async fn resolve(&self, domain: DomainRef, owner_id: i32) -> Result<Option<String>> {
        let db = self.db.as_ref();

        let name = match domain.domain_type {
            DomainType::Primary => self
                .owned_domain(domain.domain_id, owner_id)
                .await?
                .map(|parent| parent.domain_name),
            DomainType::Alias => {
                let found = DomainAliases::find_by_id(domain.domain_id)
                    .find_also_related(Domains)
                    .one(db)
                    .await?;
                match found {
                    Some((alias, Some(parent))) if parent.owner_id == owner_id => {
                        Some(alias.alias_name)
                    }
                    _ => None,
                }
            }
            DomainType::Subdomain => {
                let found = Subdomains::find_by_id(domain.domain_id)
                    .find_also_related(Domains)
                    .one(db)
                    .await?;
                match found {
                    Some((sub, Some(parent))) if parent.owner_id == owner_id => {
                        Some(format!("{}.{}", sub.subdomain_name, parent.domain_name))
                    }
                    _ => None,
                }
            }
            DomainType::AliasSubdomain => {
                let found = SubdomainAliases::find_by_id(domain.domain_id)
                    .find_also_related(DomainAliases)
                    .one(db)
                    .await?;
                match found {
                    Some((sub, Some(alias))) => self
                        .owned_domain(alias.domain_id, owner_id)
                        .await?
                        .map(|_| format!("{}.{}", sub.subdomain_alias_name, alias.alias_name)),
                    _ => None,
                }
            }
        };

        Ok(name)
    }
}

/// 基于数据库的域名状态标记
#[derive(Debug, Clone, Copy, Default)]
pub struct DbDomainStatusFlag;

#[async_trait]
impl DomainStatusFlag for DbDomainStatusFlag {
    async fn mark_pending(&self, txn: &DatabaseTransaction, domain: DomainRef) -> Result<()> {
        let id = domain.domain_id;
        let result = match domain.domain_type {
            DomainType::Primary => {
                Domains::update_many()
                    .col_expr(domains::Column::DomainStatus, Expr::value(PENDING_CHANGE))
                    .filter(domains::Column::Id.eq(id))
                    .exec(txn)
                    .await?
            }
            DomainType::Alias => {
                DomainAliases::update_many()
                    .col_expr(domain_aliases::Column::AliasStatus, Expr::value(PENDING_CHANGE))
                    .filter(domain_aliases::Column::Id.eq(id))
                    .exec(txn)
                    .await?
            }
            DomainType::Subdomain => {
                Subdomains::update_many()
                    .col_expr(subdomains::Column::SubdomainStatus, Expr::value(PENDING_CHANGE))
                    .filter(subdomains::Column::Id.eq(id))
                    .exec(txn)
                    .await?
            }
            DomainType::AliasSubdomain => {
                SubdomainAliases::update_many()
                    .col_expr(
                        subdomain_aliases::Column::SubdomainAliasStatus,
                        Expr::value(PENDING_CHANGE),
                    )
                    .filter(subdomain_aliases::Column::Id.eq(id))
                    .exec(txn)
                    .await?
            }
        };

        if result.rows_affected == 0 {
            return Err(storage_error!(
                StorageKind::NotFound,
                "域名实体 {domain} 不存在，无法标记待变更"
            ));
        }

        Ok(())
    }
}

/// 基于账户表的主题资料
#[derive(Clone)]
pub struct DbOwnerProfileSource {
    db: Arc<DatabaseConnection>,
}

impl DbOwnerProfileSource {
    /// 创建账户资料来源
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OwnerProfileSource for DbOwnerProfileSource {
    async fn subject_info(&self, owner_id: i32) -> Result<Option<SubjectInfo>> {
        let account = Accounts::find_by_id(owner_id).one(self.db.as_ref()).await?;

        Ok(account.map(|account| SubjectInfo {
            firm: account.firm,
            city: account.city,
            state: account.state,
            country: account.country,
            email: account.email,
        }))
    }
}

/// 只记录日志的通知器
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl ProvisioningNotifier for LogNotifier {
    async fn notify(&self) -> Result<()> {
        linfo!(
            "system",
            LogStage::Notification,
            LogComponent::Notifier,
            "provisioning_signal",
            "已发出预配信号"
        );
        Ok(())
    }
}

/// 通过 mpsc 通道向进程内消费者发送信号
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<()>,
}

impl ChannelNotifier {
    /// 使用有界通道的发送端创建通知器
    pub fn new(sender: mpsc::Sender<()>) -> Self {
        Self { sender }
    }

    /// 创建通知器和接收端
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<()>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }
}

#[async_trait]
impl ProvisioningNotifier for ChannelNotifier {
    async fn notify(&self) -> Result<()> {
        match self.sender.try_send(()) {
            Ok(()) => Ok(()),
            // 已有未消费的信号，消费者会一并处理
            Err(mpsc::error::TrySendError::Full(())) => {
                lwarn!(
                    "system",
                    LogStage::Notification,
                    LogComponent::Notifier,
                    "provisioning_signal_coalesced",
                    "预配信号队列已满，合并到未处理的信号"
                );
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(())) => Err(SslError::internal_with_source(
                "预配信号接收端已关闭",
                anyhow::anyhow!("provisioning channel closed"),
            )),
        }
    }
}
