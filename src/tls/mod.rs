//! # TLS 模块
//!
//! 私钥/证书解析与导出、证书链校验和自签名证书生成

pub mod certificate;
pub mod chain;
pub mod self_signed;

pub use certificate::{CertificateInfo, CertificateParser};
pub use chain::ChainValidator;
pub use self_signed::{SelfSignedGenerator, SelfSignedRequest, SubjectInfo};

/// 规范化后的 PEM 证书材料，可直接写入证书记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PemMaterial {
    /// PKCS#8 PEM 私钥（未加密）
    pub private_key: String,
    /// PEM 证书
    pub certificate: String,
    /// 中间证书包，可为空
    pub ca_bundle: String,
}
