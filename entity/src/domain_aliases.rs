//! # 域名别名实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 域名别名
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "domain_aliases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub domain_id: i32,
    #[sea_orm(unique)]
    pub alias_name: String,
    pub alias_status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::domains::Entity",
        from = "Column::DomainId",
        to = "super::domains::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Domain,
    #[sea_orm(has_many = "super::subdomain_aliases::Entity")]
    SubdomainAliases,
}

impl Related<super::domains::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Domain.def()
    }
}

impl Related<super::subdomain_aliases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubdomainAliases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
