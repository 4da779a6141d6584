//! # Entity 模块
//!
//! 包含证书子系统读写的所有 Sea-ORM 实体定义

pub mod accounts;
pub mod domain_aliases;
pub mod domains;
pub mod ssl_certs;
pub mod subdomain_aliases;
pub mod subdomains;

pub use accounts::Entity as Accounts;
pub use domain_aliases::Entity as DomainAliases;
pub use domains::Entity as Domains;
pub use ssl_certs::Entity as SslCerts;
pub use subdomain_aliases::Entity as SubdomainAliases;
pub use subdomains::Entity as Subdomains;
