//! # SSL 证书记录模块
//!
//! 证书记录的状态机、持久化以及面向请求的生命周期服务

pub mod collaborators;
pub mod hsts;
pub mod service;
pub mod store;
pub mod types;

pub use collaborators::{
    ChannelNotifier, DbDomainResolver, DbDomainStatusFlag, DbOwnerProfileSource, DomainResolver,
    DomainStatusFlag, LogNotifier, OwnerProfileSource, ProvisioningNotifier,
};
pub use hsts::derive_hsts;
pub use service::{
    CertOutcome, CertificateView, RequestContext, SslCertForm, SslCertService, ViewTitle,
};
pub use store::SslCertStore;
pub use types::{CertStatus, CertificateRecord, DomainRef, DomainType, HstsSettings, StatusDisplay};
