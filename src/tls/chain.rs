//! # 证书链校验
//!
//! 按 "SSL 服务器证书" 用途校验叶子证书。提供中间证书时，中间证书作为不受信任的链材料参与构建；
//! 未提供时叶子证书本身被加入信任集合，自签名证书因此可以直接通过校验。

use std::path::PathBuf;

use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509, X509PurposeId, X509Ref, X509StoreContext};

use crate::error::{Result, SslError, ValidationKind};

/// 证书链校验器
#[derive(Debug, Clone)]
pub struct ChainValidator {
    trust_store: PathBuf,
}

impl ChainValidator {
    /// 使用发行版 CA 证书包作为信任锚
    pub fn new(trust_store: impl Into<PathBuf>) -> Self {
        Self {
            trust_store: trust_store.into(),
        }
    }

    /// 校验叶子证书可以作为 SSL 服务器证书使用
    pub fn validate_server_chain(&self, leaf: &X509Ref, intermediates: &[X509]) -> Result<()> {
        let anchors = self.load_trust_anchors()?;

        let mut builder = X509StoreBuilder::new().map_err(chain_error)?;
        builder
            .set_purpose(X509PurposeId::SSL_SERVER)
            .map_err(chain_error)?;
        for anchor in anchors {
            builder.add_cert(anchor).map_err(chain_error)?;
        }
        if intermediates.is_empty() {
            builder.add_cert(leaf.to_owned()).map_err(chain_error)?;
        }
        let store = builder.build();

        let mut chain = Stack::new().map_err(chain_error)?;
        for intermediate in intermediates {
            chain.push(intermediate.clone()).map_err(chain_error)?;
        }

        let mut context = X509StoreContext::new().map_err(chain_error)?;
        let (verified, result) = context
            .init(&store, leaf, &chain, |ctx| {
                let verified = ctx.verify_cert()?;
                Ok((verified, ctx.error()))
            })
            .map_err(chain_error)?;

        if verified {
            Ok(())
        } else {
            Err(SslError::validation(
                ValidationKind::ChainInvalid,
                format!("证书链校验失败: {}", result.error_string()),
            ))
        }
    }

    fn load_trust_anchors(&self) -> Result<Vec<X509>> {
        let pem = std::fs::read(&self.trust_store).map_err(|e| {
            SslError::validation_with_source(
                ValidationKind::ChainInvalid,
                format!("无法读取信任库 {}", self.trust_store.display()),
                e,
            )
        })?;

        X509::stack_from_pem(&pem).map_err(|e| {
            SslError::validation_with_source(
                ValidationKind::ChainInvalid,
                format!("信任库 {} 解析失败", self.trust_store.display()),
                e,
            )
        })
    }
}

fn chain_error(err: openssl::error::ErrorStack) -> SslError {
    SslError::validation_with_source(ValidationKind::ChainInvalid, "证书链校验执行失败", err)
}
