//! # SSL 证书实体定义
//!
//! 每个 (domain_id, domain_type) 至多一条证书记录，由唯一索引保证

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SSL 证书记录
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ssl_certs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub cert_id: i32,
    pub domain_id: i32,
    /// 域名实体类型代码（dmn|als|sub|alssub）
    pub domain_type: String,
    #[serde(skip_serializing)]
    #[sea_orm(column_type = "Text")]
    pub private_key: String,
    #[sea_orm(column_type = "Text")]
    pub certificate: String,
    #[sea_orm(column_type = "Text")]
    pub ca_bundle: String,
    pub allow_hsts: bool,
    pub hsts_max_age: i32,
    pub hsts_include_subdomains: bool,
    /// 证书状态（toadd|tochange|todelete|ok，或预配代理写入的其他值）
    pub status: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
