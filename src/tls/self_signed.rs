//! # 自签名证书生成
//!
//! 为域名生成一次性的自签名服务器证书。所有材料只保存在内存中，
//! OpenSSL 句柄在离开作用域时释放，不会产生临时文件。

use chrono::Utc;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, KeyUsage, SubjectAlternativeName,
    SubjectKeyIdentifier,
};
use openssl::x509::{X509Builder, X509Name, X509NameBuilder};

use super::{CertificateParser, PemMaterial};
use crate::error::{Result, SslError};
use crate::ssl_certs::DomainRef;

/// 缺失主题字段的占位值
const NOT_AVAILABLE: &str = "N/A";
/// 国家代码固定为 US
const COUNTRY: &str = "US";
const KEY_BITS: u32 = 2048;
const VALIDITY_DAYS: u32 = 365;

/// 证书主题资料，来自客户账户
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectInfo {
    /// 公司名称
    pub firm: Option<String>,
    /// 城市
    pub city: Option<String>,
    /// 州或省
    pub state: Option<String>,
    /// 账户所在国家，证书主题中不使用
    pub country: Option<String>,
    /// 联系邮箱
    pub email: Option<String>,
}

/// 自签名证书生成请求
#[derive(Debug, Clone)]
pub struct SelfSignedRequest {
    /// 证书通用名
    pub domain_name: String,
    /// 主题资料
    pub subject: SubjectInfo,
    /// 面板主机名，用于第三个 subjectAltName
    pub base_server_vhost: String,
    /// 证书所属域名实体
    pub domain: DomainRef,
    /// 账户 ID，参与序列号生成
    pub owner_id: i32,
}

impl SelfSignedRequest {
    /// subjectAltName 列表，顺序固定
    #[must_use]
    pub fn alt_names(&self) -> Vec<String> {
        vec![
            self.domain_name.clone(),
            format!("www.{}", self.domain_name),
            format!(
                "{}{}.{}",
                self.domain.domain_type.code(),
                self.domain.domain_id,
                self.base_server_vhost
            ),
        ]
    }

    /// 序列号：账户 ID 与当前微秒时间戳拼接
    fn serial(&self) -> String {
        format!("{}{}", self.owner_id, Utc::now().timestamp_micros())
    }
}

/// 自签名证书生成器
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfSignedGenerator;

impl SelfSignedGenerator {
    /// 在阻塞线程池中生成，避免 RSA 密钥生成占用异步工作线程
    pub async fn generate(&self, request: SelfSignedRequest) -> Result<PemMaterial> {
        tokio::task::spawn_blocking(move || Self::generate_blocking(&request))
            .await
            .map_err(|e| SslError::generation_with_source("证书生成任务异常终止", e))?
    }

    /// 同步生成私钥和自签名证书
    pub fn generate_blocking(request: &SelfSignedRequest) -> Result<PemMaterial> {
        Self::build(request).map_err(|e| match e {
            err @ SslError::GenerationFailed { .. } => err,
            other => SslError::generation_with_source("自签名证书生成失败", other),
        })
    }

    fn build(request: &SelfSignedRequest) -> Result<PemMaterial> {
        let rsa = Rsa::generate(KEY_BITS).map_err(generation_error)?;
        let key = PKey::from_rsa(rsa).map_err(generation_error)?;
        let name = subject_name(request)?;

        let serial = BigNum::from_dec_str(&request.serial())
            .and_then(|serial| serial.to_asn1_integer())
            .map_err(generation_error)?;
        let not_before = Asn1Time::days_from_now(0).map_err(generation_error)?;
        let not_after = Asn1Time::days_from_now(VALIDITY_DAYS).map_err(generation_error)?;

        let mut builder = X509Builder::new().map_err(generation_error)?;
        builder.set_version(2).map_err(generation_error)?;
        builder
            .set_serial_number(&serial)
            .map_err(generation_error)?;
        builder.set_subject_name(&name).map_err(generation_error)?;
        builder.set_issuer_name(&name).map_err(generation_error)?;
        builder.set_pubkey(&key).map_err(generation_error)?;
        builder
            .set_not_before(&not_before)
            .map_err(generation_error)?;
        builder.set_not_after(&not_after).map_err(generation_error)?;

        let ski = SubjectKeyIdentifier::new()
            .build(&builder.x509v3_context(None, None))
            .map_err(generation_error)?;
        builder.append_extension(ski).map_err(generation_error)?;

        let aki = AuthorityKeyIdentifier::new()
            .keyid(true)
            .issuer(true)
            .build(&builder.x509v3_context(None, None))
            .map_err(generation_error)?;
        builder.append_extension(aki).map_err(generation_error)?;

        let constraints = BasicConstraints::new()
            .critical()
            .build()
            .map_err(generation_error)?;
        builder
            .append_extension(constraints)
            .map_err(generation_error)?;

        let usage = KeyUsage::new()
            .key_cert_sign()
            .non_repudiation()
            .digital_signature()
            .key_encipherment()
            .build()
            .map_err(generation_error)?;
        builder.append_extension(usage).map_err(generation_error)?;

        let mut alt_names = SubjectAlternativeName::new();
        for alt_name in request.alt_names() {
            alt_names.dns(&alt_name);
        }
        let san = alt_names
            .build(&builder.x509v3_context(None, None))
            .map_err(generation_error)?;
        builder.append_extension(san).map_err(generation_error)?;

        builder
            .sign(&key, MessageDigest::sha256())
            .map_err(generation_error)?;
        let certificate = builder.build();

        Ok(PemMaterial {
            private_key: CertificateParser::export_private_key(&key)?,
            certificate: CertificateParser::export_certificate(&certificate)?,
            ca_bundle: String::new(),
        })
    }
}

fn subject_name(request: &SelfSignedRequest) -> Result<X509Name> {
    let subject = &request.subject;
    let or_na = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    };

    let mut name = X509NameBuilder::new().map_err(generation_error)?;
    let entries = [
        (Nid::COMMONNAME, request.domain_name.clone()),
        (Nid::ORGANIZATIONNAME, or_na(&subject.firm)),
        (Nid::LOCALITYNAME, or_na(&subject.city)),
        (Nid::STATEORPROVINCENAME, or_na(&subject.state)),
        (Nid::COUNTRYNAME, COUNTRY.to_string()),
        (Nid::PKCS9_EMAILADDRESS, or_na(&subject.email)),
    ];
    for (nid, value) in entries {
        name.append_entry_by_nid(nid, &value)
            .map_err(|e| SslError::generation_with_source(format!("证书主题字段无效: {value}"), e))?;
    }

    Ok(name.build())
}

fn generation_error(err: openssl::error::ErrorStack) -> SslError {
    SslError::generation_with_source("OpenSSL 调用失败", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssl_certs::DomainType;
    use crate::testing::certs::write_trust_store;
    use crate::tls::ChainValidator;
    use pretty_assertions::assert_eq;

    fn request(domain_type: DomainType) -> SelfSignedRequest {
        SelfSignedRequest {
            domain_name: "example.test".to_string(),
            subject: SubjectInfo {
                firm: Some("Example Ltd".to_string()),
                city: None,
                state: Some("  ".to_string()),
                country: Some("DE".to_string()),
                email: Some("admin@example.test".to_string()),
            },
            base_server_vhost: "panel.hosting.test".to_string(),
            domain: DomainRef::new(42, domain_type),
            owner_id: 7,
        }
    }

    #[test]
    fn alt_names_follow_fixed_order() {
        assert_eq!(
            request(DomainType::Primary).alt_names(),
            vec![
                "example.test".to_string(),
                "www.example.test".to_string(),
                "dmn42.panel.hosting.test".to_string(),
            ]
        );
        assert_eq!(
            request(DomainType::AliasSubdomain).alt_names()[2],
            "alssub42.panel.hosting.test"
        );
    }

    #[tokio::test]
    async fn generated_material_is_consistent() {
        let material = SelfSignedGenerator
            .generate(request(DomainType::Subdomain))
            .await
            .unwrap();

        assert!(material.ca_bundle.is_empty());
        let key = CertificateParser::parse_private_key(&material.private_key, "").unwrap();
        let cert = CertificateParser::parse_certificate(&material.certificate).unwrap();
        assert!(CertificateParser::key_matches_certificate(&key, &cert));

        let info = CertificateParser::inspect(&cert).unwrap();
        assert_eq!(info.common_name.as_deref(), Some("example.test"));
        assert_eq!(
            info.subject_alt_names,
            vec![
                "example.test".to_string(),
                "www.example.test".to_string(),
                "sub42.panel.hosting.test".to_string(),
            ]
        );
        assert!(info.is_self_signed);
        let validity = info.not_after - info.not_before;
        assert_eq!(validity.num_days(), i64::from(VALIDITY_DAYS));

        let ski = cert.subject_key_id().unwrap();
        let aki = cert.authority_key_id().unwrap();
        assert_eq!(aki.as_slice(), ski.as_slice());
        assert!(cert.authority_issuer().is_some());
    }

    #[test]
    fn subject_defaults_missing_fields() {
        let material = SelfSignedGenerator::generate_blocking(&request(DomainType::Alias)).unwrap();
        let cert = CertificateParser::parse_certificate(&material.certificate).unwrap();

        let field = |nid: Nid| {
            cert.subject_name()
                .entries_by_nid(nid)
                .next()
                .map(|entry| entry.data().as_utf8().unwrap().to_string())
        };
        assert_eq!(field(Nid::ORGANIZATIONNAME).as_deref(), Some("Example Ltd"));
        assert_eq!(field(Nid::LOCALITYNAME).as_deref(), Some("N/A"));
        assert_eq!(field(Nid::STATEORPROVINCENAME).as_deref(), Some("N/A"));
        assert_eq!(field(Nid::COUNTRYNAME).as_deref(), Some("US"));

        let serial = cert.serial_number().to_bn().unwrap().to_dec_str().unwrap();
        assert!(serial.starts_with('7'));
    }

    #[test]
    fn generated_certificate_passes_chain_validation_without_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let validator = ChainValidator::new(write_trust_store(dir.path(), &[]));

        let material = SelfSignedGenerator::generate_blocking(&request(DomainType::Primary)).unwrap();
        let cert = CertificateParser::parse_certificate(&material.certificate).unwrap();

        validator.validate_server_chain(&cert, &[]).unwrap();
    }
}
