//! # 测试替身
//!
//! 协作者 trait 的计数与故障注入实现

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sea_orm::DatabaseTransaction;

use crate::error::{Result, SslError, StorageKind};
use crate::ssl_certs::{DomainRef, DomainStatusFlag, ProvisioningNotifier};

/// 记录调用次数的通知器
#[derive(Debug, Clone, Default)]
pub struct CountingNotifier {
    count: Arc<AtomicUsize>,
}

impl CountingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProvisioningNotifier for CountingNotifier {
    async fn notify(&self) -> Result<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 总是失败的通知器
#[derive(Debug, Clone, Default)]
pub struct FailingNotifier {
    attempts: Arc<AtomicUsize>,
}

impl FailingNotifier {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProvisioningNotifier for FailingNotifier {
    async fn notify(&self) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SslError::internal_with_source(
            "通知失败",
            anyhow::anyhow!("provisioning daemon unreachable"),
        ))
    }
}

/// 总是失败的域名状态标记
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStatusFlag;

#[async_trait]
impl DomainStatusFlag for FailingStatusFlag {
    async fn mark_pending(&self, _txn: &DatabaseTransaction, domain: DomainRef) -> Result<()> {
        Err(SslError::storage(
            StorageKind::Failure,
            format!("无法标记域名实体 {domain}"),
        ))
    }
}
