//! # 证书生命周期服务
//!
//! 处理一次证书请求：解析域名、生成或校验证书材料、持久化并通知预配程序

use std::sync::Arc;

use chrono::Utc;
use sea_orm::DatabaseConnection;

use super::collaborators::{
    DbDomainResolver, DbDomainStatusFlag, DbOwnerProfileSource, DomainResolver,
    OwnerProfileSource, ProvisioningNotifier,
};
use super::hsts::derive_hsts;
use super::store::SslCertStore;
use super::types::{CertStatus, CertificateRecord, DomainRef, StatusDisplay};
use crate::config::SslConfig;
use crate::error::{PreconditionKind, Result, SslError, ValidationKind};
use crate::logging::{LogComponent, LogStage};
use crate::tls::{
    CertificateInfo, CertificateParser, ChainValidator, PemMaterial, SelfSignedGenerator,
    SelfSignedRequest,
};
use crate::{ensure_precondition, ldebug, lerror, linfo, lwarn};

/// 已认证的请求方
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub owner_id: i32,
    pub username: String,
    /// 账户是否开通 SSL 功能
    pub ssl_feature_enabled: bool,
}

impl RequestContext {
    pub fn new(owner_id: i32, username: impl Into<String>, ssl_feature_enabled: bool) -> Self {
        Self {
            request_id: format!("ssl-{owner_id}-{}", Utc::now().timestamp_micros()),
            owner_id,
            username: username.into(),
            ssl_feature_enabled,
        }
    }
}

/// 提交的原始表单字段，`None` 表示字段缺失
#[derive(Debug, Clone, Default)]
pub struct SslCertForm {
    pub cert_id: Option<String>,
    pub private_key: Option<String>,
    pub certificate: Option<String>,
    pub ca_bundle: Option<String>,
    pub passphrase: Option<String>,
    pub allow_hsts: Option<String>,
    pub hsts_max_age: Option<String>,
    pub hsts_include_subdomains: Option<String>,
    pub selfsigned: Option<String>,
}

impl SslCertForm {
    fn field(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim)
    }

    fn cert_id(&self) -> Result<i32> {
        let raw = Self::field(&self.cert_id).ok_or_else(|| {
            SslError::precondition(PreconditionKind::MalformedRequest, "缺少 cert_id")
        })?;

        raw.parse::<i32>()
            .ok()
            .filter(|id| *id >= 0)
            .ok_or_else(|| {
                SslError::precondition(
                    PreconditionKind::MalformedRequest,
                    format!("cert_id 不是非负整数: {raw}"),
                )
            })
    }

    fn is_self_signed(&self) -> bool {
        Self::field(&self.selfsigned) == Some("on")
    }
}

/// 成功结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertOutcome {
    /// 新增记录已提交
    Added { cert_id: i32 },
    /// 更新已提交
    Updated { cert_id: i32 },
    /// 删除已提交
    Deleted { cert_id: i32 },
}

impl CertOutcome {
    /// 受影响的证书记录 ID
    #[must_use]
    pub const fn cert_id(&self) -> i32 {
        match self {
            Self::Added { cert_id } | Self::Updated { cert_id } | Self::Deleted { cert_id } => {
                *cert_id
            }
        }
    }

    /// 面向用户的成功提示
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Added { .. } => "SSL certificate successfully scheduled for addition.",
            Self::Updated { .. } => "SSL certificate successfully scheduled for update.",
            Self::Deleted { .. } => "SSL certificate successfully scheduled for deletion.",
        }
    }
}

/// 证书页面标题
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTitle {
    /// 尚无证书
    Add,
    /// 可编辑已有证书
    Edit,
    /// 只读查看
    Show,
}

/// 证书页面数据
#[derive(Debug, Clone)]
pub struct CertificateView {
    pub domain: DomainRef,
    pub domain_name: String,
    pub record: Option<CertificateRecord>,
    pub title: ViewTitle,
    pub status: Option<StatusDisplay>,
    /// 是否允许新增/修改/删除
    pub actions_allowed: bool,
    pub certificate_info: Option<CertificateInfo>,
}

/// 证书生命周期服务
pub struct SslCertService {
    store: SslCertStore,
    resolver: Arc<dyn DomainResolver>,
    profiles: Arc<dyn OwnerProfileSource>,
    notifier: Arc<dyn ProvisioningNotifier>,
    validator: ChainValidator,
    generator: SelfSignedGenerator,
    base_server_vhost: String,
}

impl SslCertService {
    /// 使用数据库协作者创建服务
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &SslConfig,
        notifier: Arc<dyn ProvisioningNotifier>,
    ) -> Self {
        Self::from_parts(
            SslCertStore::new(db.clone(), Arc::new(DbDomainStatusFlag)),
            Arc::new(DbDomainResolver::new(db.clone())),
            Arc::new(DbOwnerProfileSource::new(db)),
            notifier,
            config,
        )
    }

    /// 使用自定义协作者创建服务
    pub fn from_parts(
        store: SslCertStore,
        resolver: Arc<dyn DomainResolver>,
        profiles: Arc<dyn OwnerProfileSource>,
        notifier: Arc<dyn ProvisioningNotifier>,
        config: &SslConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            profiles,
            notifier,
            validator: ChainValidator::new(config.distro_ca_bundle.clone()),
            generator: SelfSignedGenerator,
            base_server_vhost: config.base_server_vhost.clone(),
        }
    }

    /// 新增或更新证书
    pub async fn submit(
        &self,
        ctx: &RequestContext,
        domain: DomainRef,
        form: &SslCertForm,
    ) -> Result<CertOutcome> {
        let result = self.try_submit(ctx, domain, form).await;
        if let Err(e) = &result {
            log_failure(ctx, domain, "submit_failed", e);
        }
        result
    }

    async fn try_submit(
        &self,
        ctx: &RequestContext,
        domain: DomainRef,
        form: &SslCertForm,
    ) -> Result<CertOutcome> {
        ensure_feature(ctx)?;
        let domain_name = self.resolve(ctx, domain).await?;
        let cert_id = form.cert_id()?;

        let material = if form.is_self_signed() {
            self.generate(ctx, domain, domain_name.clone()).await?
        } else {
            validate_material(&self.validator, form)?
        };

        let hsts = derive_hsts(
            SslCertForm::field(&form.allow_hsts),
            SslCertForm::field(&form.hsts_max_age),
            SslCertForm::field(&form.hsts_include_subdomains),
        );

        let record = CertificateRecord {
            cert_id,
            domain,
            private_key: material.private_key,
            certificate: material.certificate,
            ca_bundle: material.ca_bundle,
            hsts,
            status: if cert_id == 0 {
                CertStatus::ToAdd
            } else {
                CertStatus::ToChange
            },
            created_at: None,
            updated_at: None,
        };

        let stored_id = self.store.upsert(&record).await?;
        let outcome = if record.is_new() {
            CertOutcome::Added { cert_id: stored_id }
        } else {
            CertOutcome::Updated { cert_id: stored_id }
        };

        linfo!(
            ctx.request_id,
            LogStage::Db,
            LogComponent::Lifecycle,
            "certificate_scheduled",
            &format!(
                "{} 为域名 {domain_name} 提交了 SSL 证书，等待预配",
                ctx.username
            ),
            cert_id = stored_id,
            domain = %domain,
            status = %record.status
        );

        self.notify(ctx).await;
        Ok(outcome)
    }

    /// 将证书标记为待删除
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        domain: DomainRef,
        form: &SslCertForm,
    ) -> Result<CertOutcome> {
        let result = self.try_delete(ctx, domain, form).await;
        if let Err(e) = &result {
            log_failure(ctx, domain, "delete_failed", e);
        }
        result
    }

    async fn try_delete(
        &self,
        ctx: &RequestContext,
        domain: DomainRef,
        form: &SslCertForm,
    ) -> Result<CertOutcome> {
        ensure_feature(ctx)?;
        let domain_name = self.resolve(ctx, domain).await?;
        let cert_id = form.cert_id()?;

        self.store.mark_deleted(cert_id, domain).await?;

        linfo!(
            ctx.request_id,
            LogStage::Db,
            LogComponent::Lifecycle,
            "certificate_delete_scheduled",
            &format!("{} 删除了域名 {domain_name} 的 SSL 证书，等待预配", ctx.username),
            cert_id = cert_id,
            domain = %domain
        );

        self.notify(ctx).await;
        Ok(CertOutcome::Deleted { cert_id })
    }

    /// 查看证书，未开通 SSL 功能时只读
    pub async fn view(&self, ctx: &RequestContext, domain: DomainRef) -> Result<CertificateView> {
        let domain_name = self.resolve(ctx, domain).await?;
        let record = self.store.fetch(domain).await?;

        let pending = record
            .as_ref()
            .is_some_and(|record| record.status.is_pending());
        let actions_allowed = ctx.ssl_feature_enabled && !pending;

        let title = match (&record, actions_allowed) {
            (None, true) => ViewTitle::Add,
            (Some(_), true) => ViewTitle::Edit,
            (_, false) => ViewTitle::Show,
        };

        let certificate_info = record
            .as_ref()
            .and_then(|record| inspect_stored(ctx, domain, &record.certificate));

        Ok(CertificateView {
            domain,
            domain_name,
            status: record.as_ref().map(|record| record.status.display()),
            record,
            title,
            actions_allowed,
            certificate_info,
        })
    }

    async fn resolve(&self, ctx: &RequestContext, domain: DomainRef) -> Result<String> {
        self.resolver
            .resolve(domain, ctx.owner_id)
            .await?
            .ok_or_else(|| {
                SslError::precondition(
                    PreconditionKind::NotFound,
                    format!("域名实体 {domain} 不存在或不属于账户 {}", ctx.owner_id),
                )
            })
    }

    async fn generate(
        &self,
        ctx: &RequestContext,
        domain: DomainRef,
        domain_name: String,
    ) -> Result<PemMaterial> {
        let subject = self
            .profiles
            .subject_info(ctx.owner_id)
            .await
            .map_err(|e| SslError::generation_with_source("无法读取账户资料", e))?
            .ok_or_else(|| {
                SslError::generation(format!("账户 {} 不存在，无法生成证书主题", ctx.owner_id))
            })?;

        ldebug!(
            ctx.request_id,
            LogStage::Generation,
            LogComponent::SelfSigned,
            "self_signed_generate",
            &format!("为 {domain_name} 生成自签名证书"),
            domain = %domain
        );

        self.generator
            .generate(SelfSignedRequest {
                domain_name,
                subject,
                base_server_vhost: self.base_server_vhost.clone(),
                domain,
                owner_id: ctx.owner_id,
            })
            .await
    }

    async fn notify(&self, ctx: &RequestContext) {
        if let Err(e) = self.notifier.notify().await {
            lwarn!(
                ctx.request_id,
                LogStage::Notification,
                LogComponent::Lifecycle,
                "notify_failed",
                &format!("预配通知发送失败: {e}")
            );
        }
    }
}

fn ensure_feature(ctx: &RequestContext) -> Result<()> {
    ensure_precondition!(
        ctx.ssl_feature_enabled,
        PreconditionKind::FeatureDisabled,
        "账户 {} 未开通 SSL 功能",
        ctx.username
    );
    Ok(())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    SslCertForm::field(value).ok_or_else(|| {
        SslError::precondition(PreconditionKind::MalformedRequest, format!("缺少字段 {name}"))
    })
}

/// 校验用户提交的私钥、证书和中间证书，返回规范化后的 PEM
fn validate_material(validator: &ChainValidator, form: &SslCertForm) -> Result<PemMaterial> {
    let private_key = required(&form.private_key, "private_key")?;
    let certificate = required(&form.certificate, "certificate")?;
    let ca_bundle = required(&form.ca_bundle, "ca_bundle")?;
    let passphrase = required(&form.passphrase, "passphrase")?;

    let key = CertificateParser::parse_private_key(private_key, passphrase)?;
    let cert = CertificateParser::parse_certificate(certificate)?;

    if !CertificateParser::key_matches_certificate(&key, &cert) {
        return Err(SslError::validation(
            ValidationKind::KeyCertMismatch,
            "私钥与证书不匹配",
        ));
    }

    let ca_bundle = CertificateParser::normalize_ca_bundle(ca_bundle);
    let intermediates = CertificateParser::parse_ca_bundle(&ca_bundle)?;
    validator.validate_server_chain(&cert, &intermediates)?;

    Ok(PemMaterial {
        private_key: CertificateParser::export_private_key(&key)?,
        certificate: CertificateParser::export_certificate(&cert)?,
        ca_bundle,
    })
}

fn inspect_stored(ctx: &RequestContext, domain: DomainRef, pem: &str) -> Option<CertificateInfo> {
    let inspected =
        CertificateParser::parse_certificate(pem).and_then(|cert| CertificateParser::inspect(&cert));

    match inspected {
        Ok(info) => Some(info),
        Err(e) => {
            ldebug!(
                ctx.request_id,
                LogStage::Validation,
                LogComponent::Codec,
                "stored_certificate_unreadable",
                &format!("已保存的证书无法解析: {e}"),
                domain = %domain
            );
            None
        }
    }
}

fn log_failure(ctx: &RequestContext, domain: DomainRef, operation: &'static str, err: &SslError) {
    let detail = format!("{err:?}");
    match err.root() {
        SslError::Precondition { .. } => lwarn!(
            ctx.request_id,
            LogStage::Precondition,
            LogComponent::Lifecycle,
            operation,
            &format!("请求被拒绝: {err}"),
            domain = %domain,
            account = %ctx.username
        ),
        SslError::Validation { .. } => lwarn!(
            ctx.request_id,
            LogStage::Validation,
            LogComponent::Lifecycle,
            operation,
            &format!("证书校验失败: {err}"),
            domain = %domain,
            account = %ctx.username,
            detail = %detail
        ),
        SslError::GenerationFailed { .. } => lerror!(
            ctx.request_id,
            LogStage::Generation,
            LogComponent::SelfSigned,
            operation,
            &format!("自签名证书生成失败: {err}"),
            domain = %domain,
            detail = %detail
        ),
        _ => lerror!(
            ctx.request_id,
            LogStage::Db,
            LogComponent::Lifecycle,
            operation,
            &format!("证书记录写入失败: {err}"),
            domain = %domain,
            detail = %detail
        ),
    }
}
