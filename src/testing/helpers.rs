//! # 测试辅助函数
//!
//! 提供通用的测试工具和辅助函数

use std::sync::Once;

use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tempfile::TempDir;
use tracing::Level;

static INIT: Once = Once::new();

/// 初始化测试日志
pub fn init_test_env() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 创建内存数据库连接并运行迁移
pub async fn create_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;

    migration::Migrator::up(&db, None).await?;

    Ok(db)
}

/// 创建临时数据库文件
pub async fn create_temp_db() -> Result<(DatabaseConnection, TempDir), DbErr> {
    let temp_dir = tempfile::tempdir()
        .map_err(|e| DbErr::Custom(format!("创建临时目录失败: {e}")))?;

    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;

    Ok((db, temp_dir))
}

/// 断言包含文本
#[macro_export]
macro_rules! assert_contains {
    ($text:expr, $substring:expr) => {
        assert!(
            $text.contains($substring),
            "Text '{}' does not contain '{}'",
            $text,
            $substring
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity::SslCerts;
    use sea_orm::{EntityTrait, PaginatorTrait};

    #[tokio::test]
    async fn temp_database_survives_reconnect() {
        init_test_env();
        let (db, dir) = create_temp_db().await.unwrap();
        assert_eq!(SslCerts::find().count(&db).await.unwrap(), 0);
        drop(db);

        let url = format!("sqlite://{}", dir.path().join("test.db").display());
        let reopened = Database::connect(&url).await.unwrap();
        assert_eq!(
            migration::Migrator::get_pending_migrations(&reopened)
                .await
                .unwrap()
                .len(),
            0
        );
    }
}
