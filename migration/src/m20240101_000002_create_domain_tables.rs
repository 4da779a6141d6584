use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Domains::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Domains::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Domains::OwnerId).integer().not_null())
                    .col(
                        ColumnDef::new(Domains::DomainName)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Domains::DomainStatus)
                            .string_len(255)
                            .not_null()
                            .default("ok"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_domains_owner_id")
                            .from(Domains::Table, Domains::OwnerId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_domains_owner_id")
                    .table(Domains::Table)
                    .col(Domains::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DomainAliases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DomainAliases::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DomainAliases::DomainId).integer().not_null())
                    .col(
                        ColumnDef::new(DomainAliases::AliasName)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(DomainAliases::AliasStatus)
                            .string_len(255)
                            .not_null()
                            .default("ok"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_domain_aliases_domain_id")
                            .from(DomainAliases::Table, DomainAliases::DomainId)
                            .to(Domains::Table, Domains::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subdomains::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subdomains::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subdomains::DomainId).integer().not_null())
                    .col(
                        ColumnDef::new(Subdomains::SubdomainName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Subdomains::SubdomainStatus)
                            .string_len(255)
                            .not_null()
                            .default("ok"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subdomains_domain_id")
                            .from(Subdomains::Table, Subdomains::DomainId)
                            .to(Domains::Table, Domains::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubdomainAliases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubdomainAliases::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SubdomainAliases::AliasId).integer().not_null())
                    .col(
                        ColumnDef::new(SubdomainAliases::SubdomainAliasName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubdomainAliases::SubdomainAliasStatus)
                            .string_len(255)
                            .not_null()
                            .default("ok"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subdomain_aliases_alias_id")
                            .from(SubdomainAliases::Table, SubdomainAliases::AliasId)
                            .to(DomainAliases::Table, DomainAliases::Id)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SubdomainAliases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subdomains::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DomainAliases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Domains::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Domains {
    Table,
    Id,
    OwnerId,
    DomainName,
    DomainStatus,
}

#[derive(DeriveIden)]
enum DomainAliases {
    Table,
    Id,
    DomainId,
    AliasName,
    AliasStatus,
}

#[derive(DeriveIden)]
enum Subdomains {
    Table,
    Id,
    DomainId,
    SubdomainName,
    SubdomainStatus,
}

#[derive(DeriveIden)]
enum SubdomainAliases {
    Table,
    Id,
    AliasId,
    SubdomainAliasName,
    SubdomainAliasStatus,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
}
