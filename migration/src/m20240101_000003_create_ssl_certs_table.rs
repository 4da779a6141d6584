use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SslCerts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SslCerts::CertId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SslCerts::DomainId).integer().not_null())
                    .col(
                        ColumnDef::new(SslCerts::DomainType)
                            .string_len(15)
                            .not_null()
                            .default("dmn"),
                    )
                    .col(ColumnDef::new(SslCerts::PrivateKey).text().not_null())
                    .col(ColumnDef::new(SslCerts::Certificate).text().not_null())
                    .col(ColumnDef::new(SslCerts::CaBundle).text().not_null())
                    .col(
                        ColumnDef::new(SslCerts::AllowHsts)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(SslCerts::HstsMaxAge)
                            .integer()
                            .not_null()
                            .default(31_536_000),
                    )
                    .col(
                        ColumnDef::new(SslCerts::HstsIncludeSubdomains)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(SslCerts::Status).text().not_null())
                    .col(
                        ColumnDef::new(SslCerts::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SslCerts::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 一个域名实体只允许一条证书记录
        manager
            .create_index(
                Index::create()
                    .name("idx_ssl_certs_domain_unique")
                    .table(SslCerts::Table)
                    .col(SslCerts::DomainId)
                    .col(SslCerts::DomainType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ssl_certs_status")
                    .table(SslCerts::Table)
                    .col(SslCerts::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SslCerts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SslCerts {
    Table,
    CertId,
    DomainId,
    DomainType,
    PrivateKey,
    Certificate,
    CaBundle,
    AllowHsts,
    HstsMaxAge,
    HstsIncludeSubdomains,
    Status,
    CreatedAt,
    UpdatedAt,
}
