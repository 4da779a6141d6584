//! # 主域名实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 主域名
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "domains")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: i32,
    #[sea_orm(unique)]
    pub domain_name: String,
    pub domain_status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::OwnerId",
        to = "super::accounts::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Account,
    #[sea_orm(has_many = "super::domain_aliases::Entity")]
    DomainAliases,
    #[sea_orm(has_many = "super::subdomains::Entity")]
    Subdomains,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::domain_aliases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DomainAliases.def()
    }
}

impl Related<super::subdomains::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subdomains.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
