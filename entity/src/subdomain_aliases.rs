//! # 别名子域名实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 域名别名下的子域名
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subdomain_aliases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub alias_id: i32,
    pub subdomain_alias_name: String,
    pub subdomain_alias_status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::domain_aliases::Entity",
        from = "Column::AliasId",
        to = "super::domain_aliases::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    DomainAlias,
}

impl Related<super::domain_aliases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DomainAlias.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
