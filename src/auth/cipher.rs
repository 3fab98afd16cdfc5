//! # 引用令牌加密
//!
//! 发给客户端的访问令牌是 `"<tokenID>:<subject>"` 的 AES-256-GCM 密文，
//! 只有持有密钥的服务端能够解密

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

use crate::error::{IdentityError, Result};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// 对称加密能力
pub trait ReferenceCipher: Send + Sync {
    /// 加密明文，返回可放入 HTTP 头的字符串
    fn encrypt(&self, plaintext: &str) -> Result<String>;

    /// 解密，任何失败都视为未认证
    fn decrypt(&self, value: &str) -> Result<String>;
}

/// AES-256-GCM 实现，密钥为配置密钥的 SHA-256
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    /// 从配置中的密钥字符串派生
    #[must_use]
    pub fn from_secret(secret: &str) -> Self {
        let key = Sha256::digest(secret.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }
}

impl ReferenceCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| {
                IdentityError::server_error_with_source(
                    "引用令牌加密失败",
                    anyhow::anyhow!("AES-GCM encryption failed: {e}"),
                )
            })?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    fn decrypt(&self, value: &str) -> Result<String> {
        let sealed = URL_SAFE_NO_PAD
            .decode(value.trim())
            .map_err(|e| IdentityError::unauthorized_with_source("令牌格式错误", e))?;

        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(IdentityError::unauthorized("令牌长度错误"));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| IdentityError::unauthorized("令牌解密失败"))?;

        String::from_utf8(plaintext)
            .map_err(|e| IdentityError::unauthorized_with_source("解密后的数据不是有效的UTF-8字符串", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_encrypt_then_decrypt() {
        let cipher = AesGcmCipher::from_secret("secret");
        let sealed = cipher.encrypt("token-1:42").unwrap();

        assert!(!sealed.contains("token-1"));
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "token-1:42");
    }

    #[test]
    fn test_nonce_makes_output_differ() {
        let cipher = AesGcmCipher::from_secret("secret");
        assert_ne!(cipher.encrypt("a:b").unwrap(), cipher.encrypt("a:b").unwrap());
    }

    #[test]
    fn test_other_key_cannot_decrypt() {
        let sealed = AesGcmCipher::from_secret("one").encrypt("a:b").unwrap();
        let err = AesGcmCipher::from_secret("two").decrypt(&sealed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_garbage_is_unauthorized() {
        let cipher = AesGcmCipher::from_secret("secret");
        for value in ["", "not base64 !!", "c2hvcnQ"] {
            assert_eq!(
                cipher.decrypt(value).unwrap_err().kind(),
                ErrorKind::Unauthorized,
                "{value}"
            );
        }
    }

    #[test]
    fn test_tampered_ciphertext_is_unauthorized() {
        let cipher = AesGcmCipher::from_secret("secret");
        let sealed = cipher.encrypt("a:b").unwrap();
        let mut bytes = URL_SAFE_NO_PAD.decode(&sealed).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        let err = cipher.decrypt(&URL_SAFE_NO_PAD.encode(bytes)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
