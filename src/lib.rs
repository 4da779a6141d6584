//! # Hosting SSL
//!
//! 托管域名的 SSL 证书生命周期：证书校验、自签名证书生成以及以状态驱动的持久化

pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod ssl_certs;
pub mod testing;
pub mod tls;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Result, SslError};
pub use ssl_certs::{CertOutcome, DomainRef, DomainType, RequestContext, SslCertForm, SslCertService};
