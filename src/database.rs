//! # 数据库模块
//!
//! 数据库连接和迁移管理

use crate::config::DatabaseConfig;
use crate::{
    lerror, linfo, lwarn,
    logging::{LogComponent, LogStage},
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

/// 初始化数据库连接
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    config
        .ensure_database_path()
        .map_err(|e| DbErr::Custom(e.to_string()))?;

    let display_url = display_url(config);
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "db_connect",
        &format!("正在连接数据库: {display_url}")
    );

    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "db_connected",
        "数据库连接成功"
    );
    Ok(db)
}

/// 日志中展示的连接地址，SQLite 路径按字符截断到 50 个
fn display_url(config: &DatabaseConfig) -> String {
    if config.is_sqlite() {
        config.url.chars().take(50).collect()
    } else {
        config.url.clone()
    }
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "migrations_start",
        "开始运行数据库迁移..."
    );

    match ::migration::Migrator::up(db, None).await {
        Ok(()) => {
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Database,
                "migrations_done",
                "数据库迁移完成"
            );
            Ok(())
        }
        Err(e) => {
            lerror!(
                "system",
                LogStage::Startup,
                LogComponent::Database,
                "migrations_failed",
                &format!("数据库迁移失败: {e}")
            );
            Err(e)
        }
    }
}

/// 检查是否存在未应用的迁移
pub async fn check_database_status(db: &DatabaseConnection) -> Result<usize, DbErr> {
    let pending = ::migration::Migrator::get_pending_migrations(db).await?;

    if pending.is_empty() {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Database,
            "migrations_current",
            "所有迁移都已应用"
        );
    } else {
        lwarn!(
            "system",
            LogStage::Startup,
            LogComponent::Database,
            "migrations_pending",
            &format!("有 {} 个待应用的迁移", pending.len())
        );
    }

    Ok(pending.len())
}
