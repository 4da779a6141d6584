//! # 测试证书工具
//!
//! 生成一次性的根 CA、中间 CA 和叶子证书，供证书链与编解码测试使用

use std::path::{Path, PathBuf};

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, PKeyRef, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAlternativeName,
    SubjectKeyIdentifier,
};
use openssl::x509::{X509, X509Builder, X509NameBuilder, X509Ref};

#[derive(Clone, Copy)]
enum Profile {
    Authority,
    Leaf,
    SelfSignedLeaf,
}

/// 生成 RSA 2048 私钥
pub fn generate_key() -> PKey<Private> {
    let rsa = Rsa::generate(2048).expect("生成测试 RSA 私钥失败");
    PKey::from_rsa(rsa).expect("包装测试私钥失败")
}

/// 私钥的 PKCS#8 PEM 文本
pub fn key_pem(key: &PKeyRef<Private>) -> String {
    String::from_utf8(key.private_key_to_pem_pkcs8().expect("导出测试私钥失败"))
        .expect("私钥 PEM 不是 UTF-8")
}

/// 证书的 PEM 文本
pub fn cert_pem(cert: &X509Ref) -> String {
    String::from_utf8(cert.to_pem().expect("导出测试证书失败")).expect("证书 PEM 不是 UTF-8")
}

/// 生成可直接作为服务器证书提交的自签名证书，返回 (私钥 PEM, 证书 PEM)
pub fn self_signed_pair(common_name: &str) -> (String, String) {
    let key = generate_key();
    let cert = issue(common_name, &key, None, Profile::SelfSignedLeaf);
    (key_pem(&key), cert_pem(&cert))
}

/// 将 PEM 证书写入目录下的信任库文件
pub fn write_trust_store(dir: &Path, pems: &[&str]) -> PathBuf {
    let path = dir.join("trust-store.pem");
    std::fs::write(&path, pems.concat()).expect("写入测试信任库失败");
    path
}

/// 根 CA -> 中间 CA -> 叶子证书
pub struct TestChain {
    pub root: X509,
    pub root_key: PKey<Private>,
    pub intermediate: X509,
    pub intermediate_key: PKey<Private>,
    pub leaf: X509,
    pub leaf_key: PKey<Private>,
}

impl TestChain {
    /// 为指定域名生成完整证书链
    pub fn new(leaf_name: &str) -> Self {
        let root_key = generate_key();
        let root = issue("Hosting Test Root CA", &root_key, None, Profile::Authority);

        let intermediate_key = generate_key();
        let intermediate = issue(
            "Hosting Test Intermediate CA",
            &intermediate_key,
            Some((&root, &root_key)),
            Profile::Authority,
        );

        let leaf_key = generate_key();
        let leaf = issue(
            leaf_name,
            &leaf_key,
            Some((&intermediate, &intermediate_key)),
            Profile::Leaf,
        );

        Self {
            root,
            root_key,
            intermediate,
            intermediate_key,
            leaf,
            leaf_key,
        }
    }

    pub fn root_pem(&self) -> String {
        cert_pem(&self.root)
    }

    pub fn intermediate_pem(&self) -> String {
        cert_pem(&self.intermediate)
    }

    pub fn leaf_pem(&self) -> String {
        cert_pem(&self.leaf)
    }

    pub fn leaf_key_pem(&self) -> String {
        key_pem(&self.leaf_key)
    }

    /// 只包含根 CA 的信任库
    pub fn write_trust_store(&self, dir: &Path) -> PathBuf {
        write_trust_store(dir, &[&self.root_pem()])
    }
}

fn issue(
    common_name: &str,
    key: &PKeyRef<Private>,
    issuer: Option<(&X509Ref, &PKeyRef<Private>)>,
    profile: Profile,
) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, common_name)
        .unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    match issuer {
        Some((issuer_cert, _)) => builder.set_issuer_name(issuer_cert.subject_name()).unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(90).unwrap())
        .unwrap();

    match profile {
        Profile::Authority => {
            builder
                .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
                .unwrap();
            builder
                .append_extension(
                    KeyUsage::new()
                        .critical()
                        .key_cert_sign()
                        .crl_sign()
                        .build()
                        .unwrap(),
                )
                .unwrap();
        }
        Profile::Leaf | Profile::SelfSignedLeaf => {
            builder
                .append_extension(BasicConstraints::new().critical().build().unwrap())
                .unwrap();
            let mut usage = KeyUsage::new();
            usage.digital_signature().key_encipherment();
            if matches!(profile, Profile::SelfSignedLeaf) {
                usage.key_cert_sign();
            }
            builder.append_extension(usage.build().unwrap()).unwrap();
            builder
                .append_extension(ExtendedKeyUsage::new().server_auth().build().unwrap())
                .unwrap();
            let san = SubjectAlternativeName::new()
                .dns(common_name)
                .build(&builder.x509v3_context(issuer.map(|(cert, _)| cert), None))
                .unwrap();
            builder.append_extension(san).unwrap();
        }
    }

    let ski = SubjectKeyIdentifier::new()
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(ski).unwrap();

    if let Some((issuer_cert, _)) = issuer {
        let aki = AuthorityKeyIdentifier::new()
            .keyid(false)
            .issuer(false)
            .build(&builder.x509v3_context(Some(issuer_cert), None))
            .unwrap();
        builder.append_extension(aki).unwrap();
    }

    let signing_key = issuer.map_or(key, |(_, issuer_key)| issuer_key);
    builder.sign(signing_key, MessageDigest::sha256()).unwrap();
    builder.build()
}
