//! # 命令行接口
//!
//! `hosting-ssl` 的子命令定义与执行

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use crate::config::{self, AppConfig};
use crate::database::{init_database, run_migrations};
use crate::logging::{LogComponent, LogStage, init_logging};
use crate::ssl_certs::{
    CertificateView, DomainRef, DomainType, LogNotifier, RequestContext, SslCertForm,
    SslCertService, StatusDisplay,
};
use crate::{lerror, linfo};

/// SSL 证书管理命令行
#[derive(Debug, Parser)]
#[command(name = "hosting-ssl", version, about = "Manage SSL certificates of hosted domains")]
pub struct Cli {
    /// 配置文件路径，默认按 RUST_ENV 读取 config/config.{env}.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// 证书所属域名实体及请求账户
#[derive(Debug, Clone, Args)]
pub struct Target {
    #[arg(long)]
    pub domain_id: i32,
    /// dmn | als | sub | alssub
    #[arg(long)]
    pub domain_type: DomainType,
    /// 账户 ID
    #[arg(long)]
    pub owner: i32,
    #[arg(long, default_value = "cli")]
    pub username: String,
    /// 以未开通 SSL 功能的身份执行
    #[arg(long)]
    pub ssl_disabled: bool,
}

impl Target {
    fn domain(&self) -> DomainRef {
        DomainRef::new(self.domain_id, self.domain_type)
    }

    fn context(&self) -> RequestContext {
        RequestContext::new(self.owner, self.username.clone(), !self.ssl_disabled)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 运行数据库迁移
    Migrate,
    /// 查看证书
    Show {
        #[command(flatten)]
        target: Target,
    },
    /// 新增或更新证书
    Submit {
        #[command(flatten)]
        target: Target,
        /// 0 表示新增
        #[arg(long, default_value_t = 0)]
        cert_id: i32,
        /// 生成自签名证书
        #[arg(long)]
        self_signed: bool,
        #[arg(long)]
        key: Option<PathBuf>,
        #[arg(long)]
        cert: Option<PathBuf>,
        #[arg(long)]
        ca_bundle: Option<PathBuf>,
        #[arg(long)]
        passphrase: Option<String>,
        /// on | off
        #[arg(long)]
        allow_hsts: Option<String>,
        #[arg(long)]
        hsts_max_age: Option<String>,
        /// on | off
        #[arg(long)]
        hsts_include_subdomains: Option<String>,
    },
    /// 删除证书
    Delete {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        cert_id: i32,
    },
}

/// 执行命令；业务错误输出用户提示并以非零状态退出
pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let app_config = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .context("配置加载失败")?;

    init_logging(Some(&app_config.logging.level));

    let db = init_database(&app_config.database)
        .await
        .context("数据库连接失败")?;

    if matches!(cli.command, Command::Migrate) {
        run_migrations(&db).await.context("数据库迁移失败")?;
        println!("Database migrations applied.");
        return Ok(ExitCode::SUCCESS);
    }

    let service = SslCertService::new(Arc::new(db), &app_config.ssl, Arc::new(LogNotifier));
    execute(&service, &app_config, cli.command).await
}

async fn execute(
    service: &SslCertService,
    app_config: &AppConfig,
    command: Command,
) -> anyhow::Result<ExitCode> {
    let mut deleting = false;
    let (ctx, result) = match command {
        Command::Migrate => return Ok(ExitCode::SUCCESS),
        Command::Show { target } => {
            let ctx = target.context();
            let view = service.view(&ctx, target.domain()).await;
            match view {
                Ok(view) => {
                    print_view(&view);
                    return Ok(ExitCode::SUCCESS);
                }
                Err(e) => (ctx, Err(e)),
            }
        }
        Command::Submit {
            target,
            cert_id,
            self_signed,
            key,
            cert,
            ca_bundle,
            passphrase,
            allow_hsts,
            hsts_max_age,
            hsts_include_subdomains,
        } => {
            let form = SslCertForm {
                cert_id: Some(cert_id.to_string()),
                private_key: read_optional(key.as_deref())?,
                certificate: read_optional(cert.as_deref())?,
                ca_bundle: Some(read_optional(ca_bundle.as_deref())?.unwrap_or_default()),
                passphrase: Some(passphrase.unwrap_or_default()),
                allow_hsts,
                hsts_max_age,
                hsts_include_subdomains,
                selfsigned: self_signed.then(|| "on".to_string()),
            };
            let ctx = target.context();
            let result = service.submit(&ctx, target.domain(), &form).await;
            (ctx, result.map(|outcome| outcome.user_message()))
        }
        Command::Delete { target, cert_id } => {
            let form = SslCertForm {
                cert_id: Some(cert_id.to_string()),
                ..Default::default()
            };
            let ctx = target.context();
            let result = service.delete(&ctx, target.domain(), &form).await;
            deleting = true;
            (ctx, result.map(|outcome| outcome.user_message()))
        }
    };

    match result {
        Ok(message) => {
            linfo!(
                ctx.request_id,
                LogStage::Shutdown,
                LogComponent::Main,
                "command_done",
                message,
                vhost = %app_config.ssl.base_server_vhost
            );
            println!("{message}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            lerror!(
                ctx.request_id,
                LogStage::Shutdown,
                LogComponent::Main,
                "command_failed",
                &format!("{e}")
            );
            let message = if deleting {
                e.delete_user_message()
            } else {
                e.user_message()
            };
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn read_optional(path: Option<&Path>) -> anyhow::Result<Option<String>> {
    path.map(|path| {
        std::fs::read_to_string(path).with_context(|| format!("无法读取文件 {}", path.display()))
    })
    .transpose()
}

fn print_view(view: &CertificateView) {
    println!("Domain:  {} ({})", view.domain_name, view.domain);
    println!("Title:   {:?}", view.title);
    match &view.status {
        Some(StatusDisplay::Known(label)) => println!("Status:  {label}"),
        Some(StatusDisplay::Unrecognized(raw)) => println!("Status:  unexpected status '{raw}'"),
        None => println!("Status:  no certificate"),
    }
    println!("Actions: {}", if view.actions_allowed { "allowed" } else { "read-only" });

    if let Some(record) = &view.record {
        println!("Cert ID: {}", record.cert_id);
        println!(
            "HSTS:    {} (max-age {}, include subdomains {})",
            record.hsts.allow_hsts, record.hsts.max_age, record.hsts.include_subdomains
        );
    }
    if let Some(info) = &view.certificate_info {
        println!("Subject: {}", info.common_name.as_deref().unwrap_or("-"));
        println!("SANs:    {}", info.subject_alt_names.join(", "));
        println!("Valid:   {} .. {}", info.not_before, info.not_after);
        println!("SHA-256: {}", info.fingerprint_sha256);
        if info.is_expired() {
            println!("Warning: certificate has expired");
        } else if info.is_expiring_soon() {
            println!(
                "Warning: certificate expires in {} days",
                info.remaining_validity().num_days()
            );
        }
    }
}
