//! # 证书记录存储
//!
//! 证书记录的写入与域名实体的待变更标记在同一个事务内完成，任一失败则整体回滚

use std::sync::Arc;

use chrono::Utc;
use entity::{SslCerts, ssl_certs};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    NotSet, QueryFilter, Set, SqlErr, TransactionTrait,
};

use super::collaborators::DomainStatusFlag;
use super::types::{CertStatus, CertificateRecord, DomainRef};
use crate::error::{Context, Result, SslError, StorageKind};
use crate::{lerror, storage_error};
use crate::logging::{LogComponent, LogStage};

/// 证书记录存储
#[derive(Clone)]
pub struct SslCertStore {
    db: Arc<DatabaseConnection>,
    flag: Arc<dyn DomainStatusFlag>,
}

impl SslCertStore {
    /// 创建证书记录存储
    pub fn new(db: Arc<DatabaseConnection>, flag: Arc<dyn DomainStatusFlag>) -> Self {
        Self { db, flag }
    }

    /// 新建（`cert_id == 0`，状态 `toadd`）或更新（状态 `tochange`）证书记录，返回记录 ID
    pub async fn upsert(&self, record: &CertificateRecord) -> Result<i32> {
        let txn = self.db.begin().await?;

        let written = if record.is_new() {
            insert_record(&txn, record).await
        } else {
            update_record(&txn, record).await
        };

        let cert_id = match written {
            Ok(cert_id) => cert_id,
            Err(e) => return Err(rollback(txn, e).await),
        };

        if let Err(e) = self.flag.mark_pending(&txn, record.domain).await {
            return Err(rollback(txn, e).await);
        }

        txn.commit().await.context("提交证书记录事务失败")?;
        Ok(cert_id)
    }

    /// 将证书记录标记为待删除
    pub async fn mark_deleted(&self, cert_id: i32, domain: DomainRef) -> Result<()> {
        let txn = self.db.begin().await?;

        if let Err(e) = set_deleted(&txn, cert_id, domain).await {
            return Err(rollback(txn, e).await);
        }

        if let Err(e) = self.flag.mark_pending(&txn, domain).await {
            return Err(rollback(txn, e).await);
        }

        txn.commit().await.context("提交证书删除事务失败")?;
        Ok(())
    }

    /// 读取域名实体的证书记录
    pub async fn fetch(&self, domain: DomainRef) -> Result<Option<CertificateRecord>> {
        let model = SslCerts::find()
            .filter(ssl_certs::Column::DomainId.eq(domain.domain_id))
            .filter(ssl_certs::Column::DomainType.eq(domain.domain_type.code()))
            .one(self.db.as_ref())
            .await?;

        model.map(CertificateRecord::try_from).transpose()
    }
}

async fn insert_record(txn: &DatabaseTransaction, record: &CertificateRecord) -> Result<i32> {
    let now = Utc::now().naive_utc();
    let model = ssl_certs::ActiveModel {
        cert_id: NotSet,
        domain_id: Set(record.domain.domain_id),
        domain_type: Set(record.domain.domain_type.code().to_string()),
        private_key: Set(record.private_key.clone()),
        certificate: Set(record.certificate.clone()),
        ca_bundle: Set(record.ca_bundle.clone()),
        allow_hsts: Set(record.hsts.allow_hsts),
        hsts_max_age: Set(record.hsts.max_age),
        hsts_include_subdomains: Set(record.hsts.include_subdomains),
        status: Set(CertStatus::ToAdd.as_db().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let inserted = model.insert(txn).await.map_err(|e| insert_error(record.domain, e))?;
    Ok(inserted.cert_id)
}

async fn update_record(txn: &DatabaseTransaction, record: &CertificateRecord) -> Result<i32> {
    let existing = find_record(txn, record.cert_id, record.domain)
        .await?
        .ok_or_else(|| {
            storage_error!(
                StorageKind::Conflict,
                "证书记录 {} 与域名实体 {} 不匹配",
                record.cert_id,
                record.domain
            )
        })?;

    let mut model: ssl_certs::ActiveModel = existing.into();
    model.private_key = Set(record.private_key.clone());
    model.certificate = Set(record.certificate.clone());
    model.ca_bundle = Set(record.ca_bundle.clone());
    model.allow_hsts = Set(record.hsts.allow_hsts);
    model.hsts_max_age = Set(record.hsts.max_age);
    model.hsts_include_subdomains = Set(record.hsts.include_subdomains);
    model.status = Set(CertStatus::ToChange.as_db().to_string());
    model.updated_at = Set(Utc::now().naive_utc());

    let updated = model.update(txn).await?;
    Ok(updated.cert_id)
}

async fn set_deleted(txn: &DatabaseTransaction, cert_id: i32, domain: DomainRef) -> Result<()> {
    let existing = find_record(txn, cert_id, domain).await?.ok_or_else(|| {
        storage_error!(
            StorageKind::NotFound,
            "域名实体 {domain} 没有 ID 为 {cert_id} 的证书记录"
        )
    })?;

    let mut model: ssl_certs::ActiveModel = existing.into();
    model.status = Set(CertStatus::ToDelete.as_db().to_string());
    model.updated_at = Set(Utc::now().naive_utc());
    model.update(txn).await?;
    Ok(())
}

async fn find_record(
    txn: &DatabaseTransaction,
    cert_id: i32,
    domain: DomainRef,
) -> Result<Option<ssl_certs::Model>> {
    Ok(SslCerts::find_by_id(cert_id)
        .filter(ssl_certs::Column::DomainId.eq(domain.domain_id))
        .filter(ssl_certs::Column::DomainType.eq(domain.domain_type.code()))
        .one(txn)
        .await?)
}

fn insert_error(domain: DomainRef, err: DbErr) -> SslError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => SslError::storage_with_source(
            StorageKind::Conflict,
            format!("域名实体 {domain} 已存在证书记录"),
            err,
        ),
        _ => SslError::from(err),
    }
}

/// 回滚事务并返回原始错误
async fn rollback(txn: DatabaseTransaction, err: SslError) -> SslError {
    if let Err(rollback_err) = txn.rollback().await {
        lerror!(
            "system",
            LogStage::Db,
            LogComponent::CertStore,
            "rollback_failed",
            &format!("事务回滚失败: {rollback_err}"),
            cause = %err
        );
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssl_certs::collaborators::DbDomainStatusFlag;
    use crate::ssl_certs::types::{DomainType, HstsSettings};
    use crate::testing::{TestFixtures, create_test_db};
    use entity::{Domains, Subdomains};
    use pretty_assertions::assert_eq;
    use sea_orm::PaginatorTrait;

    fn record(cert_id: i32, domain: DomainRef) -> CertificateRecord {
        CertificateRecord {
            cert_id,
            domain,
            private_key: "KEY".to_string(),
            certificate: "CERT".to_string(),
            ca_bundle: String::new(),
            hsts: HstsSettings::default(),
            status: CertStatus::Ok,
            created_at: None,
            updated_at: None,
        }
    }

    async fn setup() -> (Arc<DatabaseConnection>, TestFixtures, SslCertStore) {
        let db = Arc::new(create_test_db().await.unwrap());
        let fixtures = TestFixtures::seed(&db).await.unwrap();
        let store = SslCertStore::new(db.clone(), Arc::new(DbDomainStatusFlag));
        (db, fixtures, store)
    }

    #[tokio::test]
    async fn insert_then_update_then_delete() {
        let (db, fixtures, store) = setup().await;
        let domain = fixtures.domain_ref();

        let cert_id = store.upsert(&record(0, domain)).await.unwrap();
        assert!(cert_id > 0);
        let stored = store.fetch(domain).await.unwrap().unwrap();
        assert_eq!(stored.status, CertStatus::ToAdd);
        assert_eq!(stored.cert_id, cert_id);

        let mut changed = record(cert_id, domain);
        changed.certificate = "CERT2".to_string();
        changed.hsts = HstsSettings {
            allow_hsts: true,
            max_age: 600,
            include_subdomains: true,
        };
        assert_eq!(store.upsert(&changed).await.unwrap(), cert_id);
        let stored = store.fetch(domain).await.unwrap().unwrap();
        assert_eq!(stored.status, CertStatus::ToChange);
        assert_eq!(stored.certificate, "CERT2");
        assert_eq!(stored.hsts.max_age, 600);

        store.mark_deleted(cert_id, domain).await.unwrap();
        let stored = store.fetch(domain).await.unwrap().unwrap();
        assert_eq!(stored.status, CertStatus::ToDelete);

        let parent = Domains::find_by_id(fixtures.domain.id)
            .one(db.as_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(parent.domain_status, "tochange");
    }

    #[tokio::test]
    async fn second_insert_for_same_domain_conflicts() {
        let (db, fixtures, store) = setup().await;
        let domain = fixtures.alias_ref();

        store.upsert(&record(0, domain)).await.unwrap();
        let err = store.upsert(&record(0, domain)).await.unwrap_err();
        assert_eq!(err.storage_kind(), Some(StorageKind::Conflict));
        assert_eq!(SslCerts::find().count(db.as_ref()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_with_mismatched_domain_conflicts() {
        let (_db, fixtures, store) = setup().await;
        let cert_id = store.upsert(&record(0, fixtures.domain_ref())).await.unwrap();

        let err = store
            .upsert(&record(cert_id, fixtures.subdomain_ref()))
            .await
            .unwrap_err();
        assert_eq!(err.storage_kind(), Some(StorageKind::Conflict));
    }

    #[tokio::test]
    async fn missing_domain_entity_rolls_back_record() {
        let (db, _fixtures, store) = setup().await;
        let ghost = DomainRef::new(9999, DomainType::Subdomain);

        let err = store.upsert(&record(0, ghost)).await.unwrap_err();
        assert_eq!(err.storage_kind(), Some(StorageKind::NotFound));
        assert_eq!(SslCerts::find().count(db.as_ref()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_of_unknown_record_is_not_found_and_flag_untouched() {
        let (db, fixtures, store) = setup().await;

        let err = store
            .mark_deleted(12345, fixtures.subdomain_ref())
            .await
            .unwrap_err();
        assert_eq!(err.storage_kind(), Some(StorageKind::NotFound));

        let sub = Subdomains::find_by_id(fixtures.subdomain.id)
            .one(db.as_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sub.subdomain_status, "ok");
    }
}
