pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_accounts_table;
mod m20240101_000002_create_domain_tables;
mod m20240101_000003_create_ssl_certs_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_accounts_table::Migration),
            Box::new(m20240101_000002_create_domain_tables::Migration),
            Box::new(m20240101_000003_create_ssl_certs_table::Migration),
        ]
    }
}
