//! # 证书工具模块
//!
//! 私钥与证书的 PEM 解析、配对检查、规范化导出以及证书信息提取。
//! 所有函数都是纯计算，不写文件也不记录日志；底层 OpenSSL 诊断作为错误来源返回，
//! 由调用方决定如何记录。

use chrono::{DateTime, Utc};
use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, PKeyRef, Private};
use openssl::x509::{X509, X509Ref, X509VerifyResult};

use crate::error::{Result, SslError, ValidationKind};

/// 从证书中提取的展示信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    /// 主题 CN
    pub common_name: Option<String>,
    /// subjectAltName 中的 DNS 条目，保持证书内顺序
    pub subject_alt_names: Vec<String>,
    /// 证书有效期开始时间
    pub not_before: DateTime<Utc>,
    /// 证书有效期结束时间
    pub not_after: DateTime<Utc>,
    /// 是否为自签名证书
    pub is_self_signed: bool,
    /// SHA-256 指纹（冒号分隔的大写十六进制）
    pub fingerprint_sha256: String,
}

impl CertificateInfo {
    /// 检查证书是否即将过期（30天内）
    #[must_use]
    pub fn is_expiring_soon(&self) -> bool {
        self.remaining_validity() < chrono::Duration::days(30)
    }

    /// 检查证书是否已过期
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.not_after
    }

    /// 获取证书剩余有效时间
    #[must_use]
    pub fn remaining_validity(&self) -> chrono::Duration {
        self.not_after - Utc::now()
    }
}

/// 证书解析器
pub struct CertificateParser;

impl CertificateParser {
    /// 解析 PEM 私钥，口令为空时按未加密私钥处理
    ///
    /// 口令通过回调提供，不会触发 OpenSSL 的终端口令提示
    pub fn parse_private_key(pem: &str, passphrase: &str) -> Result<PKey<Private>> {
        let pass = passphrase.as_bytes();
        PKey::private_key_from_pem_callback(pem.as_bytes(), |buf| {
            let len = pass.len().min(buf.len());
            buf[..len].copy_from_slice(&pass[..len]);
            Ok(len)
        })
        .map_err(|e| {
            SslError::validation_with_source(ValidationKind::InvalidKey, "私钥解析失败", e)
        })
    }

    /// 解析 PEM 证书（只取第一张证书）
    pub fn parse_certificate(pem: &str) -> Result<X509> {
        X509::from_pem(pem.as_bytes()).map_err(|e| {
            SslError::validation_with_source(ValidationKind::InvalidCertificate, "证书解析失败", e)
        })
    }

    /// 解析中间证书包；空白内容视为未提供中间证书
    pub fn parse_ca_bundle(bundle: &str) -> Result<Vec<X509>> {
        if bundle.trim().is_empty() {
            return Ok(Vec::new());
        }

        let certificates = X509::stack_from_pem(bundle.as_bytes()).map_err(|e| {
            SslError::validation_with_source(ValidationKind::ChainInvalid, "中间证书包解析失败", e)
        })?;

        if certificates.is_empty() {
            return Err(SslError::validation(
                ValidationKind::ChainInvalid,
                "中间证书包中没有任何 PEM 证书",
            ));
        }

        Ok(certificates)
    }

    /// 检查私钥是否与证书公钥配对
    #[must_use]
    pub fn key_matches_certificate(key: &PKeyRef<Private>, cert: &X509Ref) -> bool {
        cert.public_key()
            .map(|public_key| public_key.public_eq(key))
            .unwrap_or(false)
    }

    /// 导出为未加密的 PKCS#8 PEM 私钥
    pub fn export_private_key(key: &PKeyRef<Private>) -> Result<String> {
        let pem = key
            .private_key_to_pem_pkcs8()
            .map_err(|e| SslError::internal_with_source("私钥导出失败", e))?;
        String::from_utf8(pem).map_err(|e| SslError::internal_with_source("私钥导出失败", e))
    }

    /// 导出为 PEM 证书
    pub fn export_certificate(cert: &X509Ref) -> Result<String> {
        let pem = cert
            .to_pem()
            .map_err(|e| SslError::internal_with_source("证书导出失败", e))?;
        String::from_utf8(pem).map_err(|e| SslError::internal_with_source("证书导出失败", e))
    }

    /// 统一中间证书包的换行符
    #[must_use]
    pub fn normalize_ca_bundle(bundle: &str) -> String {
        bundle.replace("\r\n", "\n")
    }

    /// 提取证书展示信息
    pub fn inspect(cert: &X509Ref) -> Result<CertificateInfo> {
        let common_name = cert
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .and_then(|entry| entry.data().as_utf8().ok())
            .map(|name| name.to_string());

        let subject_alt_names = cert
            .subject_alt_names()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| name.dnsname().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let is_self_signed = cert.issued(cert) == X509VerifyResult::OK
            && cert
                .public_key()
                .and_then(|public_key| cert.verify(&public_key))
                .unwrap_or(false);

        let digest = cert
            .digest(MessageDigest::sha256())
            .map_err(|e| SslError::internal_with_source("证书指纹计算失败", e))?;
        let fingerprint_sha256 = digest
            .iter()
            .map(|byte| format!("{byte:02X}"))
            .collect::<Vec<_>>()
            .join(":");

        Ok(CertificateInfo {
            common_name,
            subject_alt_names,
            not_before: asn1_to_utc(cert.not_before())?,
            not_after: asn1_to_utc(cert.not_after())?,
            is_self_signed,
            fingerprint_sha256,
        })
    }
}

fn asn1_to_utc(time: &Asn1TimeRef) -> Result<DateTime<Utc>> {
    let epoch = Asn1Time::from_unix(0)
        .map_err(|e| SslError::internal_with_source("证书时间转换失败", e))?;
    let diff = epoch
        .diff(time)
        .map_err(|e| SslError::internal_with_source("证书时间转换失败", e))?;
    let seconds = i64::from(diff.days) * 86_400 + i64::from(diff.secs);

    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| SslError::internal_with_source("证书时间超出范围", anyhow::anyhow!("{seconds}")))
}
